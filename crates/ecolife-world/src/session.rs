//! Request/response wrapper for hosting a simulation behind a transport.
//!
//! Exposes the engine as `create`, `manipulate` and `evolve` messages returning the
//! same snapshot and event shape a local host sees. The transport itself is left to
//! the caller; messages are plain serde types.

use crate::simulation::Simulation;
use crate::snapshot::Snapshot;
use ecolife_core::{Error, Event, Faction, Position, Result, SessionId, SimConfig};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Upper bound on ticks advanced by a single `Evolve` request
pub const MAX_EVOLVE_TICKS: u32 = 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    /// Start (or restart) the session's simulation
    Create {
        #[serde(default)]
        config: Option<SimConfig>,
        #[serde(default)]
        empty: bool,
    },
    /// Apply editor commands between ticks
    Manipulate {
        #[serde(default)]
        add_cells: Vec<(Position, Faction)>,
        #[serde(default)]
        remove_cells: Vec<Position>,
        #[serde(default)]
        add_food: Vec<Position>,
    },
    /// Advance by `ticks` steps
    Evolve { ticks: u32 },
    /// Read the current state without changing it
    Snapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub session_id: SessionId,
    pub tick: u64,
    pub snapshot: Snapshot,
    /// Events of every tick advanced by the request, in order
    pub events: Vec<Event>,
}

/// One hosted simulation
pub struct Session {
    id: SessionId,
    sim: Option<Simulation>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: SessionId::new(),
            sim: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn simulation(&self) -> Option<&Simulation> {
        self.sim.as_ref()
    }

    #[instrument(skip(self, request), fields(session = %self.id))]
    pub fn handle(&mut self, request: Request) -> Result<Response> {
        let mut events = Vec::new();

        match request {
            Request::Create { config, empty } => {
                let config = config.unwrap_or_default();
                let sim = if empty {
                    Simulation::empty(config)?
                } else {
                    Simulation::new(config)?
                };
                info!(population = sim.stats().population, "Session created");
                self.sim = Some(sim);
            }
            Request::Manipulate {
                add_cells,
                remove_cells,
                add_food,
            } => {
                let sim = self.sim_mut()?;
                sim.remove_cells(&remove_cells);
                sim.add_cells(&add_cells);
                sim.add_food(&add_food);
            }
            Request::Evolve { ticks } => {
                if ticks > MAX_EVOLVE_TICKS {
                    return Err(Error::InvalidState(format!(
                        "evolve of {ticks} ticks exceeds limit of {MAX_EVOLVE_TICKS}"
                    )));
                }
                let sim = self.sim_mut()?;
                for _ in 0..ticks {
                    events.extend(sim.tick().events);
                }
            }
            Request::Snapshot => {}
        }

        let sim = self
            .sim
            .as_ref()
            .ok_or_else(|| Error::InvalidState("session has no simulation".into()))?;
        Ok(Response {
            session_id: self.id,
            tick: sim.current_tick(),
            snapshot: sim.snapshot(),
            events,
        })
    }

    /// Decode a JSON request, handle it and encode the response
    pub fn handle_json(&mut self, request: &str) -> Result<String> {
        let request: Request = serde_json::from_str(request)?;
        let response = self.handle(request)?;
        Ok(serde_json::to_string(&response)?)
    }

    fn sim_mut(&mut self) -> Result<&mut Simulation> {
        self.sim
            .as_mut()
            .ok_or_else(|| Error::InvalidState("session has no simulation; send create first".into()))
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
