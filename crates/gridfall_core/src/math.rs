//! Integer fixed-point math for deterministic simulation.
//!
//! All game simulation uses exact integer arithmetic to ensure
//! deterministic behavior across platforms. Floating-point operations
//! can produce different results on different CPUs, and a single
//! divergent bit invalidates every recorded playthrough.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Rem, Sub, SubAssign};

/// Fixed-point number type for all simulation math.
///
/// A newtype over `i64`. World-space coordinates carry three implicit
/// decimal digits (one tile spans [`TILE_WORLD_SIZE`] world units), so
/// plain integer arithmetic stays exact for every quantity the
/// simulation tracks. Division truncates toward zero; division by zero
/// is a fatal error and panics.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Fixed(i64);

/// World units per tile. Tile centers sit at `tile * TILE_WORLD_SIZE + TILE_WORLD_SIZE / 2`.
pub const TILE_WORLD_SIZE: Fixed = Fixed::new(1000);

impl Fixed {
    /// Zero.
    pub const ZERO: Self = Self(0);
    /// One.
    pub const ONE: Self = Self(1);
    /// Two.
    pub const TWO: Self = Self(2);
    /// Largest representable value. Reserved as a fatal overflow sentinel.
    pub const MAX: Self = Self(i64::MAX);

    /// Create a fixed-point value from a raw integer.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Raw integer value.
    #[must_use]
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// Raw value as `usize`, for indexing. Panics if negative.
    #[must_use]
    pub fn as_index(self) -> usize {
        usize::try_from(self.0).unwrap_or_else(|_| panic!("negative index: {}", self.0))
    }

    /// True when strictly greater than zero.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// True when exactly zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// True when strictly less than zero.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Absolute value.
    #[must_use]
    pub const fn abs(self) -> Self {
        Self(self.0.abs())
    }

    /// Truncating integer square root.
    ///
    /// Bit-by-bit digit extraction over the raw integer: exact, branch
    /// order independent of platform, no floating point anywhere.
    /// Panics on negative input.
    #[must_use]
    pub fn sqrt(self) -> Self {
        assert!(self.0 >= 0, "sqrt of negative value: {}", self.0);
        let mut x = self.0 as u64;
        let mut result: u64 = 0;
        // Highest power of four that fits in the operand.
        let mut bit: u64 = 1 << 62;
        while bit > x {
            bit >>= 2;
        }
        while bit != 0 {
            if x >= result + bit {
                x -= result + bit;
                result = (result >> 1) + bit;
            } else {
                result >>= 1;
            }
            bit >>= 2;
        }
        Self(result as i64)
    }

    /// Smaller of two values.
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        if self <= other {
            self
        } else {
            other
        }
    }

    /// Larger of two values.
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        if self >= other {
            self
        } else {
            other
        }
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<i64> for Fixed {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Add for Fixed {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Fixed {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Fixed {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Fixed {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Mul for Fixed {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self(self.0 * rhs.0)
    }
}

impl Div for Fixed {
    type Output = Self;
    // Truncates toward zero. Division by zero panics, as required.
    fn div(self, rhs: Self) -> Self {
        Self(self.0 / rhs.0)
    }
}

impl Rem for Fixed {
    type Output = Self;
    fn rem(self, rhs: Self) -> Self {
        Self(self.0 % rhs.0)
    }
}

impl Neg for Fixed {
    type Output = Self;
    fn neg(self) -> Self {
        Self(-self.0)
    }
}

/// A tile or world position: a pair of fixed-point coordinates.
///
/// The same type serves tile coordinates (grid indices) and world
/// coordinates (tile index scaled by [`TILE_WORLD_SIZE`]); the
/// visibility engine converts between the two explicitly. Ordering is
/// row-major (`y` first), which gives deterministic sorts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
pub struct TilePos {
    /// Column coordinate.
    pub x: Fixed,
    /// Row coordinate.
    pub y: Fixed,
}

impl TilePos {
    /// Origin.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// Create a position from fixed-point coordinates.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Create a position from raw integers.
    #[must_use]
    pub const fn from_raw(x: i64, y: i64) -> Self {
        Self {
            x: Fixed::new(x),
            y: Fixed::new(y),
        }
    }

    /// Scale both coordinates by a factor.
    #[must_use]
    pub fn scaled(self, factor: Fixed) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }

    /// Euclidean distance to another position, truncated.
    #[must_use]
    pub fn distance(self, other: Self) -> Fixed {
        self.distance_squared(other).sqrt()
    }

    /// Squared Euclidean distance (avoids sqrt for comparisons).
    #[must_use]
    pub fn distance_squared(self, other: Self) -> Fixed {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Center of this tile in world coordinates.
    #[must_use]
    pub fn to_world_center(self) -> Self {
        let half = TILE_WORLD_SIZE / Fixed::TWO;
        Self {
            x: self.x * TILE_WORLD_SIZE + half,
            y: self.y * TILE_WORLD_SIZE + half,
        }
    }
}

impl Ord for TilePos {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.y, self.x).cmp(&(other.y, other.x))
    }
}

impl PartialOrd for TilePos {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Add for TilePos {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl Sub for TilePos {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl fmt::Display for TilePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A line segment between two world-space points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    /// Segment start, world coordinates.
    pub start: TilePos,
    /// Segment end, world coordinates.
    pub end: TilePos,
}

impl Line {
    /// Create a segment between two world-space points.
    #[must_use]
    pub const fn new(start: TilePos, end: TilePos) -> Self {
        Self { start, end }
    }
}

/// An axis-aligned square in world space, given by center and side length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Square {
    /// Center point, world coordinates.
    pub center: TilePos,
    /// Side length.
    pub size: Fixed,
}

impl Square {
    /// Create a square from its center and side length.
    #[must_use]
    pub const fn new(center: TilePos, size: Fixed) -> Self {
        Self { center, size }
    }

    fn corners(self) -> [TilePos; 4] {
        let half = self.size / Fixed::TWO;
        let c = self.center;
        [
            TilePos::new(c.x - half, c.y - half),
            TilePos::new(c.x + half, c.y - half),
            TilePos::new(c.x - half, c.y + half),
            TilePos::new(c.x + half, c.y + half),
        ]
    }
}

/// Exact test of whether a line segment intersects an axis-aligned square.
///
/// Separating-axis formulation in pure integer arithmetic: the segment
/// misses the square iff its bounding box is disjoint from the square,
/// or all four corners lie strictly on one side of the segment's
/// supporting line. Coordinates stay small enough that the cross
/// products cannot overflow `i64`.
#[must_use]
pub fn line_intersects_square(line: Line, square: Square) -> bool {
    let half = square.size / Fixed::TWO;
    let (min_x, max_x) = (
        line.start.x.min(line.end.x),
        line.start.x.max(line.end.x),
    );
    let (min_y, max_y) = (
        line.start.y.min(line.end.y),
        line.start.y.max(line.end.y),
    );
    if max_x < square.center.x - half
        || min_x > square.center.x + half
        || max_y < square.center.y - half
        || min_y > square.center.y + half
    {
        return false;
    }

    let d = line.end - line.start;
    let mut any_positive = false;
    let mut any_negative = false;
    for corner in square.corners() {
        let r = corner - line.start;
        let cross = d.x * r.y - d.y * r.x;
        if cross.is_positive() {
            any_positive = true;
        } else if cross.is_negative() {
            any_negative = true;
        } else {
            // Corner exactly on the supporting line and inside the
            // bounding box: touching counts as intersecting.
            return true;
        }
    }
    any_positive && any_negative
}
