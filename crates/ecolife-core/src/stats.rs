//! Population statistics tracking.

use crate::events::{Event, EventKind};
use serde::{Deserialize, Serialize};

/// Point-in-time population figures, taken at a tick boundary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PopulationStats {
    pub tick: u64,
    pub population: usize,
    pub faction_a: usize,
    pub faction_b: usize,
    pub food: usize,
    pub missiles: usize,
    pub explosions: usize,
    pub total_energy: i64,
    pub max_energy: i32,
    pub max_age: u64,
}

impl PopulationStats {
    pub fn avg_energy(&self) -> f64 {
        if self.population == 0 {
            0.0
        } else {
            self.total_energy as f64 / self.population as f64
        }
    }

    /// Share of the population belonging to faction A
    pub fn faction_a_share(&self) -> f64 {
        if self.population == 0 {
            0.0
        } else {
            self.faction_a as f64 / self.population as f64
        }
    }
}

/// Running totals since the last reset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub births: u64,
    pub deaths: u64,
    pub meals: u64,
    pub launches: u64,
    pub detonations: u64,
    pub casualties: u64,
    pub reseeds: u64,
    pub culled: u64,
}

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into the totals
    pub fn record(&mut self, event: &Event) {
        match event.kind {
            EventKind::Birth => self.births += 1,
            EventKind::Death => self.deaths += 1,
            EventKind::Eat => self.meals += 1,
            EventKind::Launch => self.launches += 1,
            EventKind::Detonate => {
                self.detonations += 1;
                self.casualties += event.magnitude.unwrap_or(0).max(0) as u64;
            }
        }
    }

    /// Net growth over the counted period
    pub fn net_growth(&self) -> i64 {
        self.births as i64 - self.deaths as i64
    }
}
