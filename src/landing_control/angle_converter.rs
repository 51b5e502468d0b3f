use crate::imaging::Observation;
use tokio::time::Instant;

/// Body relative guidance angles of a target, radians.
///
/// Positive `angle_x` is right of the optical axis, positive `angle_y` below
/// it (image coordinates grow right and down).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuidanceAngles {
    angle_x: f64,
    angle_y: f64,
    captured_at: Instant,
}

impl GuidanceAngles {
    pub fn angle_x(&self) -> f64 { self.angle_x }
    pub fn angle_y(&self) -> f64 { self.angle_y }
    pub fn angle_x_deg(&self) -> f64 { self.angle_x.to_degrees() }
    pub fn angle_y_deg(&self) -> f64 { self.angle_y.to_degrees() }
    /// Capture time of the frame the angles were measured in.
    pub fn captured_at(&self) -> Instant { self.captured_at }
}

/// Maps pixel positions to angles with a linear small angle model.
///
/// The normalized offset from the image center is scaled by half the field of
/// view. This is not an inverse pinhole projection: off-axis angles drift
/// from the true ray angle toward the image border and agree at the center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleConverter {
    horizontal_fov_deg: f64,
}

impl AngleConverter {
    pub fn new(horizontal_fov_deg: f64) -> Self { Self { horizontal_fov_deg } }

    /// Vertical field of view for square pixels: `tan(v/2) = tan(h/2) * height / width`.
    pub fn vertical_fov_deg(&self, width: u32, height: u32) -> f64 {
        if width == 0 || height == 0 {
            return 0.0;
        }
        let aspect = f64::from(height) / f64::from(width);
        let half_h = (self.horizontal_fov_deg / 2.0).to_radians();
        2.0 * (half_h.tan() * aspect).atan().to_degrees()
    }

    /// Angles of pixel `(x, y)` in a `width` x `height` image. Positions
    /// outside the image are clamped to its border.
    pub fn offsets(&self, width: u32, height: u32, x: f64, y: f64) -> (f64, f64) {
        if width == 0 || height == 0 {
            return (0.0, 0.0);
        }
        let nx = (2.0 * x / f64::from(width) - 1.0).clamp(-1.0, 1.0);
        let ny = (2.0 * y / f64::from(height) - 1.0).clamp(-1.0, 1.0);
        let half_h = (self.horizontal_fov_deg / 2.0).to_radians();
        let half_v = (self.vertical_fov_deg(width, height) / 2.0).to_radians();
        (nx * half_h, ny * half_v)
    }

    pub fn convert(
        &self,
        width: u32,
        height: u32,
        target: &Observation,
        captured_at: Instant,
    ) -> GuidanceAngles {
        let (angle_x, angle_y) = self.offsets(width, height, target.center_x(), target.center_y());
        GuidanceAngles { angle_x, angle_y, captured_at }
    }

    /// Angular extent of the target, radians. Zero if the detector gave no corners.
    pub fn angular_size(&self, width: u32, height: u32, target: &Observation) -> (f64, f64) {
        if width == 0 || height == 0 {
            return (0.0, 0.0);
        }
        let (px_w, px_h) = target.pixel_extent();
        let size_x = px_w / f64::from(width) * self.horizontal_fov_deg;
        let size_y = px_h / f64::from(height) * self.vertical_fov_deg(width, height);
        (size_x.to_radians(), size_y.to_radians())
    }
}
