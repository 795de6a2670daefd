use crate::Vec2;

/// Axis-aligned box described by its centre and half extents
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub center: Vec2,
    pub half_w: f64,
    pub half_h: f64,
}

impl Bounds {
    /// Box of `width` x `height` centred on `center`
    pub fn centered(center: Vec2, width: f64, height: f64) -> Self {
        Self {
            center,
            half_w: width.abs() / 2.0,
            half_h: height.abs() / 2.0,
        }
    }

    /// Same box moved so its centre is `center`
    pub fn at(self, center: Vec2) -> Self {
        Self { center, ..self }
    }

    /// Strict overlap: boxes that only touch along an edge do not overlap
    pub fn overlaps(&self, other: &Bounds) -> bool {
        let dx = (self.center.x - other.center.x).abs();
        let dy = (self.center.y - other.center.y).abs();
        dx < self.half_w + other.half_w && dy < self.half_h + other.half_h
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_edges_are_free() {
        let a = Bounds::centered(Vec2::new(0.0, 0.0), 100.0, 100.0);
        let b = Bounds::centered(Vec2::new(100.0, 0.0), 100.0, 100.0);
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn needs_overlap_on_both_axes() {
        let a = Bounds::centered(Vec2::new(0.0, 0.0), 100.0, 100.0);
        let b = Bounds::centered(Vec2::new(50.0, 200.0), 100.0, 100.0);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&b.at(Vec2::new(50.0, 20.0))));
    }
}
