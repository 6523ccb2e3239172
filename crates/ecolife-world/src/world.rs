//! Owned simulation state shared by every subsystem.

use crate::cell::Cell;
use crate::combat::{Explosion, Missile};
use crate::grid::Grid;
use ecolife_core::{CellId, Event, EventLog, Faction, MissileId, Position};
use std::collections::BTreeSet;

/// Board, food, missiles and explosions, mutated only inside a tick or by host commands
#[derive(Debug, Clone)]
pub struct WorldState {
    pub grid: Grid,
    pub food: BTreeSet<Position>,
    pub missiles: Vec<Missile>,
    pub explosions: Vec<Explosion>,
    next_cell_id: u64,
    next_missile_id: u64,
}

impl WorldState {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            grid: Grid::new(width, height),
            food: BTreeSet::new(),
            missiles: Vec::new(),
            explosions: Vec::new(),
            next_cell_id: 1,
            next_missile_id: 1,
        }
    }

    pub fn width(&self) -> i32 {
        self.grid.width
    }

    pub fn height(&self) -> i32 {
        self.grid.height
    }

    pub fn population(&self) -> usize {
        self.grid.population()
    }

    /// Place a new cell on an empty coordinate. Returns `None` if the slot is taken.
    pub fn spawn_cell(
        &mut self,
        pos: Position,
        faction: Faction,
        energy: i32,
        max_energy: i32,
    ) -> Option<CellId> {
        if self.grid.is_occupied(pos) {
            return None;
        }
        let id = CellId(self.next_cell_id);
        self.next_cell_id += 1;
        self.grid.put(pos, Cell::new(id, faction, energy, max_energy));
        Some(id)
    }

    /// Remove the cell at `pos`, recording its death
    pub fn kill(&mut self, pos: Position, events: &mut EventLog) -> Option<Cell> {
        let wrapped = pos.wrap(self.width(), self.height());
        let cell = self.grid.remove(wrapped)?;
        events.push(Event::death(wrapped, cell.faction));
        Some(cell)
    }

    /// Place food unless the slot already holds some or the cap is reached
    pub fn place_food(&mut self, pos: Position, max_food: usize) -> bool {
        if self.food.len() >= max_food {
            return false;
        }
        self.food.insert(pos.wrap(self.width(), self.height()))
    }

    /// A coordinate with neither a cell nor food on it
    pub fn is_vacant(&self, pos: Position) -> bool {
        !self.grid.is_occupied(pos) && !self.food.contains(&pos.wrap(self.width(), self.height()))
    }

    pub fn allocate_missile_id(&mut self) -> MissileId {
        let id = MissileId(self.next_missile_id);
        self.next_missile_id += 1;
        id
    }
}
