use foundation::bounds::Extent;
use foundation::math::Vec2;

/// Resolution used when fitting a degenerate (zero-area) extent.
pub const MIN_FIT_RESOLUTION: f64 = 1.0;

/// Centre and resolution of a view, saved to be resumed later.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MapState {
    pub center: Vec2,
    pub resolution: f64,
}

/// Current map view: centre and resolution (map units per pixel) in the
/// working SRS, plus the pixel size of the rendered area.
///
/// Pixel `(0, 0)` is the top-left corner; pixel y grows downwards while map y
/// grows upwards.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub center: Vec2,
    pub resolution: f64,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(center: Vec2, resolution: f64, width: f64, height: f64) -> Self {
        Self {
            center,
            resolution,
            width,
            height,
        }
    }

    /// A view is usable for pixel conversion once it has a size and a positive
    /// resolution.
    pub fn is_ready(&self) -> bool {
        self.width > 0.0
            && self.height > 0.0
            && self.resolution.is_finite()
            && self.resolution > 0.0
    }

    pub fn coordinate_from_pixel(&self, pixel: Vec2) -> Vec2 {
        Vec2::new(
            self.center.x + (pixel.x - self.width / 2.0) * self.resolution,
            self.center.y - (pixel.y - self.height / 2.0) * self.resolution,
        )
    }

    pub fn pixel_from_coordinate(&self, coord: Vec2) -> Vec2 {
        Vec2::new(
            (coord.x - self.center.x) / self.resolution + self.width / 2.0,
            (self.center.y - coord.y) / self.resolution + self.height / 2.0,
        )
    }

    pub fn extent(&self) -> Extent {
        let half_w = self.width / 2.0 * self.resolution;
        let half_h = self.height / 2.0 * self.resolution;
        Extent::new(
            self.center.x - half_w,
            self.center.y - half_h,
            self.center.x + half_w,
            self.center.y + half_h,
        )
    }

    /// Centre on `extent` with the smallest resolution that shows all of it.
    pub fn fit(&mut self, extent: &Extent) {
        self.center = extent.center();
        if self.width <= 0.0 || self.height <= 0.0 {
            return;
        }
        let res = (extent.width() / self.width).max(extent.height() / self.height);
        self.resolution = if res.is_finite() && res > 0.0 {
            res
        } else {
            MIN_FIT_RESOLUTION
        };
    }

    /// Zoom by whole levels; positive zooms in (halves the resolution).
    pub fn zoom_by(&mut self, levels: i32) {
        self.resolution /= 2f64.powi(levels);
    }

    pub fn state(&self) -> MapState {
        MapState {
            center: self.center,
            resolution: self.resolution,
        }
    }

    /// Move back to a saved state. The pixel size is kept.
    pub fn restore(&mut self, state: MapState) {
        self.center = state.center;
        self.resolution = state.resolution;
    }
}
