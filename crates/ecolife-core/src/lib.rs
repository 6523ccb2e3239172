//! Core types and utilities for the Ecolife two-faction cellular ecology.

pub mod types;
pub mod config;
pub mod error;
pub mod events;
pub mod stats;

pub use error::{Error, Result};
pub use types::*;
pub use config::*;
pub use events::*;
pub use stats::*;
