//! Dense grids and boolean occupancy sets.
//!
//! [`TileSet`] is the workhorse of the simulation: obstacle layouts,
//! visibility results, occupancy masks for movement validation and
//! flood-fill regions are all boolean grids combined with exact set
//! algebra.

use crate::math::{Fixed, TilePos};
use crate::rng::GameRng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Canonical neighbor offsets: the four cardinals before the four
/// diagonals.
///
/// The enumeration order is part of the determinism contract. Every
/// neighbor expansion (pathfinding, flood fill) walks this table in
/// order, which also makes straight paths win ties against diagonal
/// ones.
pub const DIRECTIONS_8: [TilePos; 8] = [
    TilePos::from_raw(-1, 0),
    TilePos::from_raw(1, 0),
    TilePos::from_raw(0, -1),
    TilePos::from_raw(0, 1),
    TilePos::from_raw(-1, -1),
    TilePos::from_raw(1, -1),
    TilePos::from_raw(-1, 1),
    TilePos::from_raw(1, 1),
];

/// A dense row-major 2D grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid<T> {
    num_cols: Fixed,
    num_rows: Fixed,
    cells: Vec<T>,
}

impl<T: Clone + Default> Grid<T> {
    /// Create a grid of the given dimensions filled with `T::default()`.
    ///
    /// Panics if either dimension is not positive: a zero-sized board
    /// is a data error.
    #[must_use]
    pub fn new(num_cols: Fixed, num_rows: Fixed) -> Self {
        assert!(
            num_cols.is_positive() && num_rows.is_positive(),
            "grid dimensions must be positive: {num_cols}x{num_rows}"
        );
        let len = num_cols.as_index() * num_rows.as_index();
        Self {
            num_cols,
            num_rows,
            cells: vec![T::default(); len],
        }
    }
}

impl<T> Grid<T> {
    /// Number of columns.
    #[must_use]
    pub fn num_cols(&self) -> Fixed {
        self.num_cols
    }

    /// Number of rows.
    #[must_use]
    pub fn num_rows(&self) -> Fixed {
        self.num_rows
    }

    /// True when the position lies inside the grid.
    #[must_use]
    pub fn in_bounds(&self, pos: TilePos) -> bool {
        !pos.x.is_negative() && !pos.y.is_negative() && pos.x < self.num_cols && pos.y < self.num_rows
    }

    fn index(&self, pos: TilePos) -> usize {
        assert!(self.in_bounds(pos), "tile access out of bounds: {pos}");
        pos.y.as_index() * self.num_cols.as_index() + pos.x.as_index()
    }

    fn pos_at(&self, index: usize) -> TilePos {
        let cols = self.num_cols.as_index();
        TilePos::from_raw((index % cols) as i64, (index / cols) as i64)
    }

    /// Reference to the cell at `pos`. Out-of-bounds access is fatal.
    #[must_use]
    pub fn get(&self, pos: TilePos) -> &T {
        &self.cells[self.index(pos)]
    }

    /// Mutable reference to the cell at `pos`. Out-of-bounds access is fatal.
    pub fn get_mut(&mut self, pos: TilePos) -> &mut T {
        let idx = self.index(pos);
        &mut self.cells[idx]
    }

    /// Overwrite the cell at `pos`.
    pub fn set(&mut self, pos: TilePos, value: T) {
        let idx = self.index(pos);
        self.cells[idx] = value;
    }
}

/// A boolean occupancy grid with exact set algebra.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileSet {
    grid: Grid<bool>,
}

impl TileSet {
    /// Create an empty set covering a board of the given dimensions.
    #[must_use]
    pub fn new(num_cols: Fixed, num_rows: Fixed) -> Self {
        Self {
            grid: Grid::new(num_cols, num_rows),
        }
    }

    /// Number of columns.
    #[must_use]
    pub fn num_cols(&self) -> Fixed {
        self.grid.num_cols()
    }

    /// Number of rows.
    #[must_use]
    pub fn num_rows(&self) -> Fixed {
        self.grid.num_rows()
    }

    /// Total number of tiles on the board.
    #[must_use]
    pub fn area(&self) -> usize {
        self.grid.cells.len()
    }

    /// True when the position lies inside the board.
    #[must_use]
    pub fn in_bounds(&self, pos: TilePos) -> bool {
        self.grid.in_bounds(pos)
    }

    /// Membership query. Out-of-bounds access is fatal.
    #[must_use]
    pub fn at(&self, pos: TilePos) -> bool {
        *self.grid.get(pos)
    }

    /// Insert a tile.
    pub fn set(&mut self, pos: TilePos) {
        self.grid.set(pos, true);
    }

    /// Remove a tile.
    pub fn clear(&mut self, pos: TilePos) {
        self.grid.set(pos, false);
    }

    /// Number of member tiles.
    #[must_use]
    pub fn count(&self) -> usize {
        self.grid.cells.iter().filter(|&&c| c).count()
    }

    /// True when no tile is a member.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    fn assert_same_size(&self, other: &Self) {
        assert!(
            self.num_cols() == other.num_cols() && self.num_rows() == other.num_rows(),
            "tile set size mismatch: {}x{} vs {}x{}",
            self.num_cols(),
            self.num_rows(),
            other.num_cols(),
            other.num_rows()
        );
    }

    /// In-place union. Mismatched board sizes are fatal.
    pub fn union_with(&mut self, other: &Self) {
        self.assert_same_size(other);
        for (cell, &o) in self.grid.cells.iter_mut().zip(&other.grid.cells) {
            *cell = *cell || o;
        }
    }

    /// In-place subtraction. Mismatched board sizes are fatal.
    pub fn subtract(&mut self, other: &Self) {
        self.assert_same_size(other);
        for (cell, &o) in self.grid.cells.iter_mut().zip(&other.grid.cells) {
            *cell = *cell && !o;
        }
    }

    /// In-place intersection. Mismatched board sizes are fatal.
    pub fn intersect_with(&mut self, other: &Self) {
        self.assert_same_size(other);
        for (cell, &o) in self.grid.cells.iter_mut().zip(&other.grid.cells) {
            *cell = *cell && o;
        }
    }

    /// In-place complement.
    pub fn negate(&mut self) {
        for cell in &mut self.grid.cells {
            *cell = !*cell;
        }
    }

    /// Member tiles in row-major order.
    #[must_use]
    pub fn to_list(&self) -> Vec<TilePos> {
        self.grid
            .cells
            .iter()
            .enumerate()
            .filter(|(_, &c)| c)
            .map(|(i, _)| self.grid.pos_at(i))
            .collect()
    }

    /// Uniformly random non-member tile, by rejection sampling.
    ///
    /// Returns `None` when every tile is a member; "board is full" is
    /// an expected outcome, not an error.
    #[must_use]
    pub fn random_unoccupied_pos(&self, rng: &mut GameRng) -> Option<TilePos> {
        if self.count() == self.area() {
            return None;
        }
        loop {
            let pos = TilePos::new(
                rng.range(Fixed::ZERO, self.num_cols() - Fixed::ONE),
                rng.range(Fixed::ZERO, self.num_rows() - Fixed::ONE),
            );
            if !self.at(pos) {
                return Some(pos);
            }
        }
    }

    /// Pick a random non-member tile and insert it.
    #[must_use]
    pub fn occupy_random_pos(&mut self, rng: &mut GameRng) -> Option<TilePos> {
        let pos = self.random_unoccupied_pos(rng)?;
        self.set(pos);
        Some(pos)
    }

    /// Tiles 8-connected to `start` that share `start`'s membership value.
    ///
    /// Breadth-first flood fill expanding neighbors in [`DIRECTIONS_8`]
    /// order. The result always contains `start` itself.
    #[must_use]
    pub fn connected_region(&self, start: TilePos) -> Self {
        let target = self.at(start);
        let mut region = Self::new(self.num_cols(), self.num_rows());
        let mut queue = VecDeque::new();
        region.set(start);
        queue.push_back(start);
        while let Some(pos) = queue.pop_front() {
            for dir in DIRECTIONS_8 {
                let next = pos + dir;
                if self.in_bounds(next) && !region.at(next) && self.at(next) == target {
                    region.set(next);
                    queue.push_back(next);
                }
            }
        }
        region
    }
}
