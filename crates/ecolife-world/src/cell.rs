//! Cell state.

use ecolife_core::{CellId, Faction};
use serde::{Deserialize, Serialize};

/// A live cell. Its coordinate is held by the grid, not by the cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub id: CellId,
    pub faction: Faction,
    pub energy: i32,
    pub age: u64,
}

impl Cell {
    /// Create a cell with energy clamped to `0..=max_energy`
    pub fn new(id: CellId, faction: Faction, energy: i32, max_energy: i32) -> Self {
        Self {
            id,
            faction,
            energy: energy.clamp(0, max_energy),
            age: 0,
        }
    }

    pub fn is_starved(&self) -> bool {
        self.energy <= 0
    }

    /// Add energy up to `max_energy`, returning what was actually gained
    pub fn add_energy(&mut self, amount: i32, max_energy: i32) -> i32 {
        let before = self.energy;
        self.energy = (self.energy + amount).min(max_energy);
        self.energy - before
    }

    /// Pay `amount`. Returns false (and drains to zero) when the cell cannot afford it.
    pub fn consume_energy(&mut self, amount: i32) -> bool {
        if self.energy >= amount {
            self.energy -= amount;
            true
        } else {
            self.energy = 0;
            false
        }
    }

    /// Lose one energy to hunger, never dropping below 1
    pub fn starve(&mut self) -> bool {
        if self.energy > 1 {
            self.energy -= 1;
            true
        } else {
            false
        }
    }

    pub fn tick(&mut self) {
        self.age += 1;
    }
}
