//! Adjacent placement for summoned tokens.
//!
//! Candidates are tried in a fixed order: one cell to the right, left,
//! down, up, and finally the anchor's own position.

use crate::{Bounds, Vec2};

/// Cell size used when the summoner carries no usable grid DPI
pub const DEFAULT_CELL_SIZE: f64 = 100.0;

/// The five candidate centres around `origin`, in priority order
pub fn adjacent_candidates(origin: Vec2, cell: f64) -> [Vec2; 5] {
    let cell = if cell.is_finite() && cell > 0.0 {
        cell
    } else {
        DEFAULT_CELL_SIZE
    };
    [
        origin.offset(cell, 0.0),
        origin.offset(-cell, 0.0),
        origin.offset(0.0, cell),
        origin.offset(0.0, -cell),
        origin,
    ]
}

/// First candidate where a `width` x `height` box overlaps none of `obstacles`
pub fn first_free(candidates: &[Vec2], width: f64, height: f64, obstacles: &[Bounds]) -> Option<Vec2> {
    candidates.iter().copied().find(|&candidate| {
        let probe = Bounds::centered(candidate, width, height);
        !obstacles.iter().any(|other| probe.overlaps(other))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(x: f64, y: f64) -> Bounds {
        Bounds::centered(Vec2::new(x, y), 100.0, 100.0)
    }

    #[test]
    fn priority_is_right_left_down_up_self() {
        let c = adjacent_candidates(Vec2::new(500.0, 500.0), 100.0);
        assert_eq!(c[0], Vec2::new(600.0, 500.0));
        assert_eq!(c[1], Vec2::new(400.0, 500.0));
        assert_eq!(c[2], Vec2::new(500.0, 600.0));
        assert_eq!(c[3], Vec2::new(500.0, 400.0));
        assert_eq!(c[4], Vec2::new(500.0, 500.0));
    }

    #[test]
    fn zero_cell_falls_back_to_default() {
        let c = adjacent_candidates(Vec2::ZERO, 0.0);
        assert_eq!(c[0], Vec2::new(DEFAULT_CELL_SIZE, 0.0));
    }

    #[test]
    fn skips_blocked_candidates() {
        let c = adjacent_candidates(Vec2::ZERO, 100.0);
        assert_eq!(first_free(&c, 100.0, 100.0, &[]), Some(Vec2::new(100.0, 0.0)));
        assert_eq!(
            first_free(&c, 100.0, 100.0, &[block(100.0, 0.0)]),
            Some(Vec2::new(-100.0, 0.0))
        );
        let ring = [block(100.0, 0.0), block(-100.0, 0.0), block(0.0, 100.0), block(0.0, -100.0)];
        assert_eq!(first_free(&c, 100.0, 100.0, &ring), Some(Vec2::ZERO));
        let mut full = ring.to_vec();
        full.push(block(0.0, 0.0));
        assert_eq!(first_free(&c, 100.0, 100.0, &full), None);
    }
}
