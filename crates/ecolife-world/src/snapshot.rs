//! Read-only board snapshots for renderers and remote consumers.

use crate::combat::{Explosion, Missile};
use crate::world::WorldState;
use ecolife_core::{Faction, Position, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellView {
    pub x: i32,
    pub y: i32,
    pub faction: Faction,
    pub energy: i32,
}

/// The full observable state at a tick boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tick: u64,
    pub width: i32,
    pub height: i32,
    pub cells: Vec<CellView>,
    pub food: Vec<Position>,
    pub missiles: Vec<Missile>,
    pub explosions: Vec<Explosion>,
}

impl Snapshot {
    pub fn capture(state: &WorldState, tick: u64) -> Self {
        Self {
            tick,
            width: state.width(),
            height: state.height(),
            cells: state
                .grid
                .iter()
                .map(|(pos, cell)| CellView {
                    x: pos.x,
                    y: pos.y,
                    faction: cell.faction,
                    energy: cell.energy,
                })
                .collect(),
            food: state.food.iter().copied().collect(),
            missiles: state.missiles.clone(),
            explosions: state.explosions.clone(),
        }
    }

    pub fn count(&self, faction: Faction) -> usize {
        self.cells.iter().filter(|c| c.faction == faction).count()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Compact binary encoding
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_lists_everything() {
        let mut state = WorldState::new(6, 6);
        state.spawn_cell(Position::new(1, 1), Faction::A, 4, 10);
        state.spawn_cell(Position::new(2, 1), Faction::B, 6, 10);
        state.place_food(Position::new(5, 5), 10);

        let snapshot = Snapshot::capture(&state, 12);
        assert_eq!(snapshot.tick, 12);
        assert_eq!(snapshot.cells.len(), 2);
        assert_eq!(snapshot.count(Faction::B), 1);
        assert_eq!(
            snapshot.cells[0],
            CellView {
                x: 1,
                y: 1,
                faction: Faction::A,
                energy: 4
            }
        );
        assert_eq!(snapshot.food, vec![Position::new(5, 5)]);
    }

    #[test]
    fn test_binary_encoding() {
        let mut state = WorldState::new(6, 6);
        state.spawn_cell(Position::new(3, 4), Faction::B, 7, 10);
        let snapshot = Snapshot::capture(&state, 1);

        let bytes = snapshot.to_bytes().unwrap();
        assert_eq!(Snapshot::from_bytes(&bytes).unwrap(), snapshot);
        assert!(Snapshot::from_bytes(&[0xff]).is_err());
    }
}
