mod frame;
mod frame_source;
mod marker_detector;
mod process_detector;
mod stream_source;

pub use frame::Frame;
pub use frame_source::{FrameError, FrameSource, FrameStream};
pub use marker_detector::{DetectionError, DetectionParams, MarkerDetector, Observation};
pub use process_detector::ProcessMarkerDetector;
pub use stream_source::StreamFrameSource;

#[cfg(test)]
mod tests;
