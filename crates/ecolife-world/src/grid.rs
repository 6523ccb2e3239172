//! Toroidal cell store.

use crate::cell::Cell;
use ecolife_core::{wrapped_delta, CellId, Faction, NeighborCounts, Position};
use std::collections::HashMap;

/// Slack added to radius comparisons so that cells lying exactly on a boundary
/// are included despite float rounding
const BOUNDARY_EPSILON: f32 = 1e-4;

/// A 2D toroidal grid holding at most one cell per coordinate
#[derive(Debug, Clone)]
pub struct Grid {
    pub width: i32,
    pub height: i32,
    cells: Vec<Option<Cell>>,
    index: HashMap<CellId, Position>,
}

impl Grid {
    pub fn new(width: i32, height: i32) -> Self {
        let size = (width * height) as usize;
        Self {
            width,
            height,
            cells: vec![None; size],
            index: HashMap::new(),
        }
    }

    /// Get the cell at position (with toroidal wrapping)
    pub fn get(&self, pos: Position) -> Option<&Cell> {
        let index = self.pos_to_index(pos.wrap(self.width, self.height));
        self.cells[index].as_ref()
    }

    pub fn get_mut(&mut self, pos: Position) -> Option<&mut Cell> {
        let index = self.pos_to_index(pos.wrap(self.width, self.height));
        self.cells[index].as_mut()
    }

    pub fn is_occupied(&self, pos: Position) -> bool {
        self.get(pos).is_some()
    }

    /// Place a cell, returning whatever occupied the slot before
    pub fn put(&mut self, pos: Position, cell: Cell) -> Option<Cell> {
        let wrapped = pos.wrap(self.width, self.height);
        let index = self.pos_to_index(wrapped);
        self.index.insert(cell.id, wrapped);
        let previous = self.cells[index].replace(cell);
        if let Some(old) = &previous {
            self.index.remove(&old.id);
        }
        previous
    }

    pub fn remove(&mut self, pos: Position) -> Option<Cell> {
        let index = self.pos_to_index(pos.wrap(self.width, self.height));
        let removed = self.cells[index].take();
        if let Some(cell) = &removed {
            self.index.remove(&cell.id);
        }
        removed
    }

    /// Resolve a cell handle to its current coordinate
    pub fn locate(&self, id: CellId) -> Option<Position> {
        self.index.get(&id).copied()
    }

    /// Resolve a cell handle to the live cell it names
    pub fn resolve(&self, id: CellId) -> Option<(Position, &Cell)> {
        let pos = self.locate(id)?;
        self.get(pos).map(|cell| (pos, cell))
    }

    pub fn population(&self) -> usize {
        self.index.len()
    }

    /// Tally live cells among the 8 toroidal neighbors of `pos`
    pub fn neighbor_counts(&self, pos: Position) -> NeighborCounts {
        let mut counts = NeighborCounts::default();
        for neighbor in pos.neighbors(self.width, self.height) {
            if let Some(cell) = self.get(neighbor) {
                counts.record(cell.faction);
            }
        }
        counts
    }

    /// Unoccupied neighbor slots of `pos`
    pub fn empty_neighbors(&self, pos: Position) -> Vec<Position> {
        pos.neighbors(self.width, self.height)
            .into_iter()
            .filter(|p| !self.is_occupied(*p))
            .collect()
    }

    /// Every occupied coordinate whose toroidal distance to the point `(x, y)`
    /// is at most `radius`, in grid index order
    pub fn within_radius(&self, x: f32, y: f32, radius: f32) -> Vec<Position> {
        let reach = radius.ceil() as i32;
        let cx = x.round() as i32;
        let cy = y.round() as i32;
        let limit = radius * radius + BOUNDARY_EPSILON;

        let mut hits = Vec::new();
        for dy in -reach..=reach {
            for dx in -reach..=reach {
                let pos = Position::new(cx + dx, cy + dy).wrap(self.width, self.height);
                if !self.is_occupied(pos) {
                    continue;
                }
                if self.distance_squared(x, y, pos) <= limit {
                    hits.push(pos);
                }
            }
        }

        // Large radii on small grids visit the same wrapped slot more than once
        hits.sort_by_key(|p| self.pos_to_index(*p));
        hits.dedup();
        hits
    }

    /// Squared toroidal distance from a continuous point to a cell coordinate
    pub fn distance_squared(&self, x: f32, y: f32, pos: Position) -> f32 {
        let dx = wrapped_delta(x, pos.x as f32, self.width as f32);
        let dy = wrapped_delta(y, pos.y as f32, self.height as f32);
        dx * dx + dy * dy
    }

    fn pos_to_index(&self, pos: Position) -> usize {
        (pos.y * self.width + pos.x) as usize
    }

    /// Get position from index
    pub fn index_to_pos(&self, index: usize) -> Position {
        let x = (index as i32) % self.width;
        let y = (index as i32) / self.width;
        Position::new(x, y)
    }

    /// Iterator over all positions
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.cells.len()).map(move |i| self.index_to_pos(i))
    }

    /// Iterator over live cells with positions, in grid index order
    pub fn iter(&self) -> impl Iterator<Item = (Position, &Cell)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter_map(move |(i, slot)| slot.as_ref().map(|cell| (self.index_to_pos(i), cell)))
    }

    pub fn cells_mut(&mut self) -> impl Iterator<Item = &mut Cell> + '_ {
        self.cells.iter_mut().filter_map(|slot| slot.as_mut())
    }

    /// Positions of live cells belonging to `faction`
    pub fn faction_positions(&self, faction: Faction) -> Vec<Position> {
        self.iter()
            .filter(|(_, cell)| cell.faction == faction)
            .map(|(pos, _)| pos)
            .collect()
    }

    pub fn capacity(&self) -> usize {
        self.cells.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(id: u64, faction: Faction) -> Cell {
        Cell::new(CellId(id), faction, 5, 10)
    }

    #[test]
    fn test_grid_creation() {
        let grid = Grid::new(10, 8);
        assert_eq!(grid.width, 10);
        assert_eq!(grid.height, 8);
        assert_eq!(grid.capacity(), 80);
        assert_eq!(grid.population(), 0);
    }

    #[test]
    fn test_toroidal_wrapping() {
        let mut grid = Grid::new(10, 10);
        grid.put(Position::new(-1, -1), cell(1, Faction::A));

        // Should wrap to (9, 9)
        assert!(grid.is_occupied(Position::new(9, 9)));
        assert_eq!(grid.locate(CellId(1)), Some(Position::new(9, 9)));
        assert!(grid.get(Position::new(19, 19)).is_some());
    }

    #[test]
    fn test_corner_cells_are_neighbors() {
        let mut grid = Grid::new(10, 10);
        grid.put(Position::new(0, 0), cell(1, Faction::A));
        grid.put(Position::new(9, 9), cell(2, Faction::B));

        let counts = grid.neighbor_counts(Position::new(0, 0));
        assert_eq!(counts.total, 1);
        assert_eq!(counts.b, 1);

        let counts = grid.neighbor_counts(Position::new(9, 9));
        assert_eq!(counts.total, 1);
        assert_eq!(counts.a, 1);
    }

    #[test]
    fn test_put_replaces_and_reindexes() {
        let mut grid = Grid::new(5, 5);
        let pos = Position::new(2, 2);
        assert!(grid.put(pos, cell(1, Faction::A)).is_none());

        let previous = grid.put(pos, cell(2, Faction::B));
        assert_eq!(previous.map(|c| c.id), Some(CellId(1)));
        assert_eq!(grid.locate(CellId(1)), None);
        assert_eq!(grid.locate(CellId(2)), Some(pos));
        assert_eq!(grid.population(), 1);
    }

    #[test]
    fn test_remove_drops_handle() {
        let mut grid = Grid::new(5, 5);
        let pos = Position::new(1, 3);
        grid.put(pos, cell(7, Faction::B));

        let removed = grid.remove(pos);
        assert_eq!(removed.map(|c| c.id), Some(CellId(7)));
        assert!(grid.resolve(CellId(7)).is_none());
        assert!(grid.remove(pos).is_none());
    }

    #[test]
    fn test_empty_neighbors() {
        let mut grid = Grid::new(6, 6);
        let center = Position::new(3, 3);
        grid.put(Position::new(2, 2), cell(1, Faction::A));
        grid.put(Position::new(4, 4), cell(2, Faction::A));

        let empties = grid.empty_neighbors(center);
        assert_eq!(empties.len(), 6);
        assert!(!empties.contains(&Position::new(2, 2)));
    }

    #[test]
    fn test_within_radius_inclusive_and_wrapped() {
        let mut grid = Grid::new(10, 10);
        grid.put(Position::new(2, 0), cell(1, Faction::A));
        grid.put(Position::new(8, 0), cell(2, Faction::B));
        grid.put(Position::new(3, 0), cell(3, Faction::B));

        // Radius 2 around the origin reaches x = 2 and wraps to x = 8, but not x = 3
        let hits = grid.within_radius(0.0, 0.0, 2.0);
        assert_eq!(hits, vec![Position::new(2, 0), Position::new(8, 0)]);
    }

    #[test]
    fn test_within_radius_large_radius_dedups() {
        let mut grid = Grid::new(3, 3);
        grid.put(Position::new(1, 1), cell(1, Faction::A));
        let hits = grid.within_radius(1.0, 1.0, 5.0);
        assert_eq!(hits, vec![Position::new(1, 1)]);
    }
}
