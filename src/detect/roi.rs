/// Sub-rectangle of a depth grid, in raw sensor pixels.
///
/// The sensor delivers landscape-native grids while the device is held in
/// portrait, so the vertical strip the user perceives corresponds to a
/// rectangle centered in both raw axes. This type keeps that mapping in one
/// place; it is recomputed fresh for every frame and never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionOfInterest {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl RegionOfInterest {
    /// Centered rectangle covering `width_ratio` x `height_ratio` of the
    /// grid. Dimensions are rounded to the nearest pixel, then centered with
    /// integer division. Ratios are assumed validated by the caller.
    pub fn centered(
        grid_width: usize,
        grid_height: usize,
        width_ratio: f32,
        height_ratio: f32,
    ) -> Self {
        let width = (grid_width as f32 * width_ratio).round() as usize;
        let height = (grid_height as f32 * height_ratio).round() as usize;
        Self {
            x: (grid_width - width) / 2,
            y: (grid_height - height) / 2,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_rect_matches_reference_geometry() {
        // 256x192 sensor grid with a 0.3 ratio on both axes.
        let roi = RegionOfInterest::centered(256, 192, 0.3, 0.3);
        assert_eq!(roi.width, 77); // round(256 * 0.3)
        assert_eq!(roi.height, 58); // round(192 * 0.3)
        assert_eq!(roi.x, (256 - 77) / 2);
        assert_eq!(roi.y, (192 - 58) / 2);
    }

    #[test]
    fn full_ratio_covers_the_whole_grid() {
        let roi = RegionOfInterest::centered(100, 80, 1.0, 1.0);
        assert_eq!(roi, RegionOfInterest { x: 0, y: 0, width: 100, height: 80 });
    }

    #[test]
    fn asymmetric_ratios_apply_per_axis() {
        let roi = RegionOfInterest::centered(100, 80, 0.5, 0.25);
        assert_eq!(roi.width, 50);
        assert_eq!(roi.height, 20);
        assert_eq!(roi.x, 25);
        assert_eq!(roi.y, 30);
    }

    #[test]
    fn vanishing_ratio_yields_an_empty_region() {
        let roi = RegionOfInterest::centered(4, 4, 0.01, 0.01);
        assert!(roi.is_empty());
    }
}
