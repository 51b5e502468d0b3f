use super::process_detector::ProcessMarkerDetector;
use super::stream_source::{FfmpegStream, StreamFrameSource};
use super::{DetectionError, DetectionParams, Frame, FrameError, FrameSource, MarkerDetector, Observation};
use crate::landing_control::{DetectionQuality, MarkerFamily, TargetFilter};
use base64::{Engine, engine::general_purpose::STANDARD};
use image::{Rgb, RgbImage};
use std::time::Duration;
use tokio::time::Instant;

fn checkerboard(width: u32, height: u32) -> Frame {
    let pixels = RgbImage::from_fn(width, height, |x, y| {
        if (x / 8 + y / 8) % 2 == 0 { Rgb([255, 255, 255]) } else { Rgb([0, 0, 0]) }
    });
    Frame::new(pixels, Instant::now())
}

fn params() -> DetectionParams {
    DetectionParams {
        family: MarkerFamily::Tag36h11,
        target: TargetFilter::Id(4),
        quad_decimate: DetectionQuality::Medium.quad_decimate(),
        undistort: true,
    }
}

#[test]
fn test_relative_size_from_corners() {
    // 160x120 quad in a 640x480 frame covers 1/16 of it
    let corners = [(100.0, 100.0), (260.0, 100.0), (260.0, 220.0), (100.0, 220.0)];
    let obs = Observation::from_corners(1, (180.0, 160.0), corners, 640, 480);
    assert!((obs.relative_size() - 0.25).abs() < 1e-12);
    assert_eq!(obs.pixel_extent(), (160.0, 120.0));

    let degenerate = Observation::from_corners(1, (0.0, 0.0), corners, 0, 0);
    assert!(degenerate.relative_size().abs() < f64::EPSILON);
    assert_eq!(Observation::new(2, (1.0, 1.0), 0.5).pixel_extent(), (0.0, 0.0));
}

#[test]
fn test_frame_png_decode() {
    let frame = checkerboard(64, 48);
    let encoded = frame.encode_png().unwrap();
    let stamp = Instant::now();
    let decoded = Frame::decode(&encoded, stamp).unwrap();
    assert_eq!(decoded.resolution(), "64x48");
    assert_eq!(decoded.captured_at(), stamp);
    assert_eq!(decoded.pixels(), frame.pixels());

    assert!(matches!(Frame::decode(b"not an image", stamp), Err(FrameError::Decode(_))));
}

#[test]
fn test_frame_jpeg_preview() {
    let preview = checkerboard(64, 48).encode_jpeg_base64().unwrap();
    let jpeg = STANDARD.decode(preview).unwrap();
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
}

#[test]
fn test_detector_output_parsing() {
    let frame = checkerboard(640, 480);
    let stdout = br#"[
        {"tag_id": 4, "center": [320.0, 240.0],
         "corners": [[280.0, 200.0], [360.0, 200.0], [360.0, 280.0], [280.0, 280.0]]},
        {"tag_id": 9, "center": [50.5, 60.5]}
    ]"#;
    let observations = ProcessMarkerDetector::parse(stdout, &frame).unwrap();
    assert_eq!(observations.len(), 2);
    assert_eq!(observations[0].marker_id(), 4);
    assert!((observations[0].relative_size() - (6400.0_f64 / 307_200.0).sqrt()).abs() < 1e-12);
    assert_eq!(observations[1].corners(), None);
    assert!((observations[1].center_x() - 50.5).abs() < f64::EPSILON);

    assert!(ProcessMarkerDetector::parse(b"[]", &frame).unwrap().is_empty());
    assert!(matches!(
        ProcessMarkerDetector::parse(b"{\"tag_id\": 1}", &frame),
        Err(DetectionError::Malformed(_))
    ));
}

#[test]
fn test_detector_arguments() {
    let detector = ProcessMarkerDetector::new("apriltag-detect", Duration::from_secs(1));
    let cmd = detector.command(&params());
    let args: Vec<String> =
        cmd.as_std().get_args().map(|a| a.to_string_lossy().into_owned()).collect();
    assert_eq!(
        args,
        ["--family", "tag36h11", "--target-id", "4", "--decimate", "2", "--undistort"]
    );
}

#[test]
fn test_ffmpeg_arguments() {
    let rtsp = FfmpegStream::new("ffmpeg", "rtsp://192.168.144.25:8554/main.264").command();
    let args: Vec<String> =
        rtsp.as_std().get_args().map(|a| a.to_string_lossy().into_owned()).collect();
    assert!(args.windows(2).any(|w| w == ["-rtsp_transport", "tcp"]));
    assert!(args.windows(2).any(|w| w == ["-frames:v", "1"]));
    assert_eq!(args.last().map(String::as_str), Some("-"));

    let device = FfmpegStream::new("ffmpeg", "/dev/video0").command();
    assert!(!device.as_std().get_args().any(|a| a == "-rtsp_transport"));
    assert!(StreamFrameSource::is_snapshot_locator("http://192.168.2.2:6020/snapshot"));
    assert!(!StreamFrameSource::is_snapshot_locator("rtsp://192.168.2.2:8554/video"));
}

#[tokio::test]
async fn test_unusable_sources_fail_to_open() {
    let source = StreamFrameSource::new("/nonexistent/ffmpeg", Duration::from_millis(200));
    assert!(matches!(source.open("  ").await, Err(FrameError::OpenFailed(_))));
    assert!(matches!(
        source.open("rtsp://127.0.0.1:1/none").await,
        Err(FrameError::OpenFailed(_))
    ));
}

#[tokio::test]
async fn test_missing_detector_is_unavailable() {
    let detector = ProcessMarkerDetector::new("/nonexistent/apriltag-detect", Duration::from_secs(1));
    let result = detector.detect(&checkerboard(32, 32), &params()).await;
    assert!(matches!(result, Err(DetectionError::Unavailable(_))));
}
