//! World simulation engine.
//!
//! This module implements the toroidal grid where two cell factions are born, forage,
//! reproduce and shoot at each other, plus the regulator that keeps the board alive.

pub mod grid;
pub mod cell;
pub mod world;
pub mod automaton;
pub mod foraging;
pub mod combat;
pub mod regulator;
pub mod simulation;
pub mod snapshot;
pub mod session;

pub use grid::Grid;
pub use cell::Cell;
pub use world::WorldState;
pub use combat::{Explosion, Missile, MissilePhase};
pub use simulation::Simulation;
pub use snapshot::{CellView, Snapshot};
pub use session::{Request, Response, Session};
