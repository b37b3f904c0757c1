//! Affine geotransformation for rasters

use serde::{Deserialize, Serialize};

/// Affine transformation coefficients for georeferencing rasters.
///
/// Pixel coordinates (col, row) map to coordinates (x, y) as:
/// ```text
/// x = origin_x + col * pixel_width
/// y = origin_y + row * pixel_height
/// ```
///
/// Imagery delivered by the provider is north-up and co-registered, so
/// rotation terms are not modelled. `pixel_height` is usually negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// X coordinate of the upper-left corner
    pub origin_x: f64,
    /// Y coordinate of the upper-left corner
    pub origin_y: f64,
    /// Pixel width in meters
    pub pixel_width: f64,
    /// Pixel height in meters (negative for north-up)
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Create a new north-up GeoTransform
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
        }
    }

    /// Square pixels of `size` meters anchored at the origin
    pub fn with_pixel_size(size: f64) -> Self {
        Self::new(0.0, 0.0, size, -size)
    }

    /// Ground area covered by one pixel, in square meters
    pub fn pixel_area(&self) -> f64 {
        (self.pixel_width * self.pixel_height).abs()
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, -1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_pixel_area() {
        let gt = GeoTransform::with_pixel_size(30.0);
        assert_relative_eq!(gt.pixel_area(), 900.0, epsilon = 1e-10);
    }

    #[test]
    fn test_rectangular_pixel_area() {
        let gt = GeoTransform::new(500_000.0, 4_200_000.0, 10.0, -20.0);
        assert_relative_eq!(gt.pixel_area(), 200.0, epsilon = 1e-10);
    }
}
