//! Discrete events emitted by the engine, one batch per tick.
//!
//! Consumers (audio, scoring, debug overlays) read these batches but never feed
//! anything back into the engine through them.

use crate::stats::PopulationStats;
use crate::types::{Faction, MissileId, Position};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Birth,
    Death,
    Eat,
    Launch,
    Detonate,
}

/// A single discrete occurrence during a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    pub position: Position,
    pub faction: Option<Faction>,
    /// Birth: newborn energy. Eat: energy gained. Launch: missile id. Detonate: casualties.
    pub magnitude: Option<i64>,
}

impl Event {
    pub fn birth(position: Position, faction: Faction, energy: i32) -> Self {
        Self {
            kind: EventKind::Birth,
            position,
            faction: Some(faction),
            magnitude: Some(energy as i64),
        }
    }

    pub fn death(position: Position, faction: Faction) -> Self {
        Self {
            kind: EventKind::Death,
            position,
            faction: Some(faction),
            magnitude: None,
        }
    }

    pub fn eat(position: Position, faction: Faction, gained: i32) -> Self {
        Self {
            kind: EventKind::Eat,
            position,
            faction: Some(faction),
            magnitude: Some(gained as i64),
        }
    }

    pub fn launch(position: Position, faction: Option<Faction>, missile: MissileId) -> Self {
        Self {
            kind: EventKind::Launch,
            position,
            faction,
            magnitude: Some(missile.0 as i64),
        }
    }

    pub fn detonate(position: Position, casualties: usize) -> Self {
        Self {
            kind: EventKind::Detonate,
            position,
            faction: None,
            magnitude: Some(casualties as i64),
        }
    }
}

/// Event buffer filled during a tick and drained when the tick commits
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }

    /// Take the buffered batch, leaving the log empty
    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

/// Everything a host learns from one committed tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickReport {
    pub tick: u64,
    pub events: Vec<Event>,
    pub stats: PopulationStats,
}

impl TickReport {
    pub fn count(&self, kind: EventKind) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }
}
