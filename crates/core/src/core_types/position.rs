//! Integer grid coordinates.

use super::Vec2;
use serde::{Deserialize, Serialize};

/// Identifier shared by scouts and firefighters.
pub type AgentId = u32;

/// Simulated time in milliseconds, advanced by [`crate::clock::SimClock`].
pub type SimMillis = u64;

/// A cell coordinate on the fire grid.
///
/// Coordinates are signed so that neighbor offsets off the edge of the grid
/// stay representable; every grid accessor treats them as no-ops.
///
/// Ordering is x-major (`x`, then `y`), which is the scan order used for
/// sightings and assignment tie-breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Position shifted by `(dx, dy)`
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Euclidean distance in cells
    #[must_use]
    pub fn distance(self, other: GridPos) -> f32 {
        Vec2::new((self.x - other.x) as f32, (self.y - other.y) as f32).norm()
    }

    /// Chessboard distance, i.e. the number of 8-directional steps between cells
    #[must_use]
    pub fn chebyshev(self, other: GridPos) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }
}

impl std::fmt::Display for GridPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_distance() {
        let a = GridPos::new(0, 0);
        assert_relative_eq!(a.distance(GridPos::new(3, 4)), 5.0);
        assert_relative_eq!(a.distance(a), 0.0);
    }

    #[test]
    fn test_chebyshev() {
        let a = GridPos::new(2, 2);
        assert_eq!(a.chebyshev(GridPos::new(3, 3)), 1);
        assert_eq!(a.chebyshev(GridPos::new(2, 7)), 5);
    }

    #[test]
    fn test_scan_order_is_x_major() {
        let mut cells = vec![GridPos::new(1, 0), GridPos::new(0, 5), GridPos::new(0, 1)];
        cells.sort();
        assert_eq!(
            cells,
            vec![GridPos::new(0, 1), GridPos::new(0, 5), GridPos::new(1, 0)]
        );
    }
}
