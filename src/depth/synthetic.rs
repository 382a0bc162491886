//! Synthetic depth grids for the simulator binary and pipeline tests.
//!
//! Stands in for the external sensor session: the real source publishes
//! hardware captures into a `FrameBuffer`, these helpers fabricate grids with
//! known geometry instead.

/// A grid where every pixel reads the same distance.
pub fn uniform_grid(width: usize, height: usize, depth_m: f32) -> Vec<f32> {
    vec![depth_m; width * height]
}

/// A uniform background with a centered square patch at `patch_m`. The patch
/// side is `patch_frac` of the smaller grid dimension, at least one pixel, so
/// it always lands inside a centered region of interest of the same or larger
/// ratio.
pub fn grid_with_center_patch(
    width: usize,
    height: usize,
    background_m: f32,
    patch_m: f32,
    patch_frac: f32,
) -> Vec<f32> {
    let mut depths = uniform_grid(width, height, background_m);
    let side = ((width.min(height) as f32 * patch_frac) as usize).max(1);
    let x0 = (width - side) / 2;
    let y0 = (height - side) / 2;
    for y in y0..y0 + side {
        for x in x0..x0 + side {
            depths[y * width + x] = patch_m;
        }
    }
    depths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_lands_in_the_center() {
        let width = 16;
        let height = 12;
        let depths = grid_with_center_patch(width, height, 5.0, 0.4, 0.25);
        assert_eq!(depths[(height / 2) * width + width / 2], 0.4);
        assert_eq!(depths[0], 5.0);
        assert_eq!(depths[width * height - 1], 5.0);
    }

    #[test]
    fn tiny_patch_is_at_least_one_pixel() {
        let depths = grid_with_center_patch(8, 8, 5.0, 0.4, 0.01);
        assert_eq!(depths.iter().filter(|d| **d == 0.4).count(), 1);
    }
}
