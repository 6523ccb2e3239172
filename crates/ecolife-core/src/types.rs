//! Core type definitions for the simulation.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable handle for a live cell.
///
/// Handles are allocated from a monotonically increasing counter and never reused,
/// so a handle held across ticks either resolves to the same cell or to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellId(pub u64);

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cell#{}", self.0)
    }
}

/// Identifier for an in-flight missile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MissileId(pub u64);

impl fmt::Display for MissileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "missile#{}", self.0)
    }
}

/// Unique identifier for a hosted simulation session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 2D integer position on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn add(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Apply toroidal wrapping for given world dimensions
    pub fn wrap(&self, width: i32, height: i32) -> Self {
        Self {
            x: ((self.x % width) + width) % width,
            y: ((self.y % height) + height) % height,
        }
    }

    /// The 8 surrounding positions, wrapped to the grid
    pub fn neighbors(&self, width: i32, height: i32) -> [Position; 8] {
        let mut out = [*self; 8];
        for (slot, (dx, dy)) in out.iter_mut().zip(NEIGHBOR_OFFSETS) {
            *slot = self.add(dx, dy).wrap(width, height);
        }
        out
    }
}

/// Moore neighborhood offsets, row by row
pub const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// One of the two competing cell populations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    A,
    B,
}

impl Faction {
    pub fn opponent(self) -> Self {
        match self {
            Faction::A => Faction::B,
            Faction::B => Faction::A,
        }
    }
}

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Faction::A => write!(f, "A"),
            Faction::B => write!(f, "B"),
        }
    }
}

/// Live-neighbor tally around one coordinate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborCounts {
    pub total: u8,
    pub a: u8,
    pub b: u8,
}

impl NeighborCounts {
    pub fn of(&self, faction: Faction) -> u8 {
        match faction {
            Faction::A => self.a,
            Faction::B => self.b,
        }
    }

    pub fn record(&mut self, faction: Faction) {
        self.total += 1;
        match faction {
            Faction::A => self.a += 1,
            Faction::B => self.b += 1,
        }
    }
}

/// Shortest signed offset from `from` to `to` on a ring of length `span`
pub fn wrapped_delta(from: f32, to: f32, span: f32) -> f32 {
    let mut d = (to - from) % span;
    if d > span / 2.0 {
        d -= span;
    } else if d < -span / 2.0 {
        d += span;
    }
    d
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_wrap() {
        let pos = Position::new(5, 5);
        assert_eq!(pos.wrap(10, 10), Position::new(5, 5));

        let pos = Position::new(-1, -1);
        assert_eq!(pos.wrap(10, 10), Position::new(9, 9));

        let pos = Position::new(10, 10);
        assert_eq!(pos.wrap(10, 10), Position::new(0, 0));
    }

    #[test]
    fn test_corner_neighbors_wrap() {
        let neighbors = Position::new(0, 0).neighbors(10, 8);
        assert!(neighbors.contains(&Position::new(9, 7)));
        assert!(neighbors.contains(&Position::new(1, 1)));
        assert!(!neighbors.contains(&Position::new(0, 0)));
    }

    #[test]
    fn test_wrapped_delta() {
        assert!((wrapped_delta(1.0, 9.0, 10.0) - -2.0).abs() < 1e-6);
        assert!((wrapped_delta(9.0, 1.0, 10.0) - 2.0).abs() < 1e-6);
        assert!((wrapped_delta(2.0, 4.0, 10.0) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_neighbor_counts() {
        let mut counts = NeighborCounts::default();
        counts.record(Faction::A);
        counts.record(Faction::B);
        counts.record(Faction::B);
        assert_eq!(counts.total, 3);
        assert_eq!(counts.of(Faction::B), 2);
        assert_eq!(Faction::A.opponent(), Faction::B);
    }
}
