//! Line-of-sight visibility engine.
//!
//! A target tile is visible from a viewer tile when the segment
//! between their tile centers crosses no obstacle square. Obstacle
//! squares cover 98% of their tile, which leaves a corner gap so that
//! sight (like movement) passes between diagonally adjacent obstacles.
//!
//! Which tiles a sight line crosses depends only on the offset between
//! viewer and target, so the engine memoizes the "relevant points" per
//! first-quadrant offset and mirrors them into the other quadrants by
//! sign flips. A second, single-entry cache short-circuits repeated
//! queries for the same viewer and obstacle layout, the common case
//! when nothing moved between frames.

use crate::grid::{Grid, TileSet};
use crate::math::{line_intersects_square, Fixed, Line, Square, TilePos, TILE_WORLD_SIZE};

/// Fraction of a tile covered by an obstacle square, in percent.
const SQUARE_COVERAGE_PCT: Fixed = Fixed::new(98);

/// Visibility engine with owned memoization caches.
///
/// Owned by the world rather than global, so simulations running side
/// by side never share state.
#[derive(Debug, Clone)]
pub struct Vision {
    relevant: Grid<Option<Vec<TilePos>>>,
    last_query: Option<LastQuery>,
}

#[derive(Debug, Clone)]
struct LastQuery {
    viewer: TilePos,
    obstacles: TileSet,
    result: TileSet,
}

impl Vision {
    /// Create an engine for a board of the given dimensions.
    #[must_use]
    pub fn new(num_cols: Fixed, num_rows: Fixed) -> Self {
        Self {
            relevant: Grid::new(num_cols, num_rows),
            last_query: None,
        }
    }

    /// The set of tiles visible from `viewer` given `obstacles`.
    ///
    /// Raw per-tile sight tests, then intersected with the flood-fill
    /// region of visible tiles connected to the viewer, so a tile never
    /// counts as visible across a gap the viewer could not trace
    /// through neighboring visible tiles.
    pub fn compute(&mut self, viewer: TilePos, obstacles: &TileSet) -> TileSet {
        if let Some(last) = &self.last_query {
            if last.viewer == viewer && last.obstacles == *obstacles {
                return last.result.clone();
            }
        }

        let mut visible = TileSet::new(obstacles.num_cols(), obstacles.num_rows());
        let mut y = Fixed::ZERO;
        while y < obstacles.num_rows() {
            let mut x = Fixed::ZERO;
            while x < obstacles.num_cols() {
                let target = TilePos::new(x, y);
                if self.sight_line_clear(viewer, target, obstacles) {
                    visible.set(target);
                }
                x += Fixed::ONE;
            }
            y += Fixed::ONE;
        }
        let region = visible.connected_region(viewer);
        visible.intersect_with(&region);

        self.last_query = Some(LastQuery {
            viewer,
            obstacles: obstacles.clone(),
            result: visible.clone(),
        });
        visible
    }

    fn sight_line_clear(&mut self, viewer: TilePos, target: TilePos, obstacles: &TileSet) -> bool {
        let dif = target - viewer;
        let flip_x = dif.x.is_negative();
        let flip_y = dif.y.is_negative();
        let abs_dif = TilePos::new(dif.x.abs(), dif.y.abs());
        for &p in self.relevant_points(abs_dif) {
            let rel = TilePos::new(
                if flip_x { -p.x } else { p.x },
                if flip_y { -p.y } else { p.y },
            );
            if obstacles.at(viewer + rel) {
                return false;
            }
        }
        true
    }

    /// Tiles (relative to the viewer) whose obstacle squares could cut
    /// the sight line for a first-quadrant offset. Memoized per offset.
    fn relevant_points(&mut self, offset: TilePos) -> &[TilePos] {
        if self.relevant.get(offset).is_none() {
            let points = relevant_points_for(offset);
            self.relevant.set(offset, Some(points));
        }
        self.relevant.get(offset).as_deref().expect("just memoized")
    }
}

fn relevant_points_for(offset: TilePos) -> Vec<TilePos> {
    let line = Line::new(TilePos::ZERO.to_world_center(), offset.to_world_center());
    let size = TILE_WORLD_SIZE * SQUARE_COVERAGE_PCT / Fixed::new(100);
    let mut points = Vec::new();
    let mut y = Fixed::ZERO;
    while y <= offset.y {
        let mut x = Fixed::ZERO;
        while x <= offset.x {
            let p = TilePos::new(x, y);
            // The endpoints' own tiles never block their sight line.
            if p != TilePos::ZERO
                && p != offset
                && line_intersects_square(line, Square::new(p.to_world_center(), size))
            {
                points.push(p);
            }
            x += Fixed::ONE;
        }
        y += Fixed::ONE;
    }
    points
}
