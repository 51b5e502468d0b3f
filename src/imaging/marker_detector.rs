use super::frame::Frame;
use crate::landing_control::{MarkerFamily, TargetFilter};
use async_trait::async_trait;
use std::fmt;

/// One marker found in one frame. Pixel coordinates, origin top left.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    marker_id: u32,
    center: (f64, f64),
    relative_size: f64,
    corners: Option<[(f64, f64); 4]>,
}

impl Observation {
    pub fn new(marker_id: u32, center: (f64, f64), relative_size: f64) -> Self {
        Self { marker_id, center, relative_size, corners: None }
    }

    /// Builds an observation from the four corner points of a marker. The
    /// relative size is the square root of the covered share of the frame.
    pub fn from_corners(
        marker_id: u32,
        center: (f64, f64),
        corners: [(f64, f64); 4],
        frame_width: u32,
        frame_height: u32,
    ) -> Self {
        let frame_area = f64::from(frame_width) * f64::from(frame_height);
        let relative_size =
            if frame_area > 0.0 { (polygon_area(&corners) / frame_area).sqrt() } else { 0.0 };
        Self { marker_id, center, relative_size, corners: Some(corners) }
    }

    pub fn marker_id(&self) -> u32 { self.marker_id }
    pub fn center_x(&self) -> f64 { self.center.0 }
    pub fn center_y(&self) -> f64 { self.center.1 }
    pub fn relative_size(&self) -> f64 { self.relative_size }
    pub fn corners(&self) -> Option<&[(f64, f64); 4]> { self.corners.as_ref() }

    /// Horizontal and vertical pixel extent of the marker, zero without corners.
    pub fn pixel_extent(&self) -> (f64, f64) {
        let Some(corners) = &self.corners else {
            return (0.0, 0.0);
        };
        let (min_x, max_x, min_y, max_y) = corners.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY),
            |(min_x, max_x, min_y, max_y), &(x, y)| {
                (min_x.min(x), max_x.max(x), min_y.min(y), max_y.max(y))
            },
        );
        (max_x - min_x, max_y - min_y)
    }
}

/// Shoelace formula.
fn polygon_area(corners: &[(f64, f64); 4]) -> f64 {
    let twice: f64 = (0..4)
        .map(|i| {
            let (x0, y0) = corners[i];
            let (x1, y1) = corners[(i + 1) % 4];
            x0 * y1 - x1 * y0
        })
        .sum();
    twice.abs() / 2.0
}

/// Parameters handed to the detector with every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionParams {
    pub family: MarkerFamily,
    pub target: TargetFilter,
    pub quad_decimate: f32,
    /// The detector corrects lens distortion before decoding.
    pub undistort: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionError {
    /// The detection backend cannot be reached or started.
    Unavailable(String),
    /// The backend ran but reported a failure.
    Failed(String),
    /// The backend answered with something unreadable.
    Malformed(String),
}

impl fmt::Display for DetectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectionError::Unavailable(reason) => write!(f, "detector unavailable: {reason}"),
            DetectionError::Failed(reason) => write!(f, "detector failed: {reason}"),
            DetectionError::Malformed(reason) => write!(f, "malformed detector output: {reason}"),
        }
    }
}

impl std::error::Error for DetectionError {}

/// Finds fiducial markers in a frame.
#[async_trait]
pub trait MarkerDetector: Send + Sync {
    async fn detect(
        &self,
        frame: &Frame,
        params: &DetectionParams,
    ) -> Result<Vec<Observation>, DetectionError>;
}
