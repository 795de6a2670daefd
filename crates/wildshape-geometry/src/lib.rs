//! Geometry for wildshape tokens.
//!
//! Everything here is pure arithmetic on image pixels, grid DPI and world
//! coordinates. The scene model in `wildshape-core` feeds values in and
//! writes the results back onto tokens.

pub mod bounds;
pub mod footprint;
pub mod placement;

pub use bounds::Bounds;
pub use footprint::{cell_count, centered_offset, forced_size_dpi, keep_footprint_dpi};
pub use placement::{adjacent_candidates, first_free, DEFAULT_CELL_SIZE};

use serde::{Deserialize, Serialize};

/// A point or offset in world (or image pixel) space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };
    pub const ONE: Vec2 = Vec2 { x: 1.0, y: 1.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl std::fmt::Display for Vec2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
