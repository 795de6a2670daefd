//! Footprint math: how many grid cells an image occupies.
//!
//! A token's occupied width in cells is `image_width / grid_dpi * scale_x`.
//! Changing the image means picking a new DPI so the cell count comes out
//! where we want it.

use crate::Vec2;

/// Cells occupied horizontally by an image at `dpi` pixels per cell, scaled by `scale_x`
pub fn cell_count(image_width: f64, dpi: f64, scale_x: f64) -> f64 {
    image_width / dpi * scale_x
}

/// DPI that keeps an image of `new_width` at `cells` cells while `scale_x` stays as is
///
/// Returns `None` when `cells` or `scale_x` is not a usable positive number.
pub fn keep_footprint_dpi(new_width: f64, scale_x: f64, cells: f64) -> Option<f64> {
    if !(cells.is_finite() && cells > 0.0) || !(scale_x.is_finite() && scale_x > 0.0) {
        return None;
    }
    Some(new_width * scale_x / cells)
}

/// DPI that makes an unscaled image of `new_width` span exactly `cells` cells
pub fn forced_size_dpi(new_width: f64, cells: f64) -> f64 {
    let cells = if cells.is_finite() && cells > 0.0 { cells } else { 1.0 };
    new_width / cells
}

/// Grid offset that anchors an image on its centre
pub fn centered_offset(width: f64, height: f64) -> Vec2 {
    Vec2::new(width / 2.0, height / 2.0)
}
