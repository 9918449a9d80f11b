//! Breadth-first shortest paths on the 8-connected tile grid.
//!
//! All moves cost the same, so plain BFS finds shortest paths and the
//! fixed neighbor order makes the result deterministic: cardinals are
//! expanded before diagonals, so straight lines win ties.

use crate::grid::{Grid, TileSet, DIRECTIONS_8};
use crate::math::TilePos;
use std::collections::VecDeque;

/// Shortest path from `start` to `end`, avoiding `obstacles`.
///
/// The returned path includes both endpoints; `[start]` when the two
/// coincide. Returns an empty vector when no path exists, including
/// when the destination itself is obstructed. "Unreachable" is an
/// ordinary outcome, not an error.
#[must_use]
pub fn shortest_path(start: TilePos, end: TilePos, obstacles: &TileSet) -> Vec<TilePos> {
    if start == end {
        return vec![start];
    }

    let mut parents: Grid<Option<TilePos>> =
        Grid::new(obstacles.num_cols(), obstacles.num_rows());
    let mut visited = TileSet::new(obstacles.num_cols(), obstacles.num_rows());
    visited.set(start);
    let mut queue = VecDeque::new();
    queue.push_back(start);

    while let Some(pos) = queue.pop_front() {
        for dir in DIRECTIONS_8 {
            let next = pos + dir;
            if !obstacles.in_bounds(next) || visited.at(next) || obstacles.at(next) {
                continue;
            }
            visited.set(next);
            parents.set(next, Some(pos));
            if next == end {
                return reconstruct(&parents, start, end);
            }
            queue.push_back(next);
        }
    }
    Vec::new()
}

fn reconstruct(parents: &Grid<Option<TilePos>>, start: TilePos, end: TilePos) -> Vec<TilePos> {
    let mut path = vec![end];
    let mut pos = end;
    while pos != start {
        pos = (*parents.get(pos)).unwrap_or_else(|| panic!("broken parent chain at {pos}"));
        path.push(pos);
    }
    path.reverse();
    path
}
