use super::frame_source::FrameError;
use base64::{Engine, engine::general_purpose::STANDARD};
use image::{ImageReader, RgbImage, codecs::jpeg::JpegEncoder};
use std::io::Cursor;
use tokio::time::Instant;

/// One decoded video sample. Immutable once produced.
#[derive(Debug, Clone)]
pub struct Frame {
    pixels: RgbImage,
    captured_at: Instant,
}

impl Frame {
    const PREVIEW_JPEG_QUALITY: u8 = 80;

    pub fn new(pixels: RgbImage, captured_at: Instant) -> Self { Self { pixels, captured_at } }

    /// Decodes an encoded still (png, jpeg) into a frame stamped with `captured_at`.
    pub fn decode(encoded: &[u8], captured_at: Instant) -> Result<Self, FrameError> {
        let decoded = ImageReader::new(Cursor::new(encoded))
            .with_guessed_format()
            .map_err(|e| FrameError::Decode(e.to_string()))?
            .decode()
            .map_err(|e| FrameError::Decode(e.to_string()))?
            .to_rgb8();
        if decoded.width() == 0 || decoded.height() == 0 {
            return Err(FrameError::Decode(String::from("empty image")));
        }
        Ok(Self::new(decoded, captured_at))
    }

    pub fn width(&self) -> u32 { self.pixels.width() }
    pub fn height(&self) -> u32 { self.pixels.height() }
    pub fn captured_at(&self) -> Instant { self.captured_at }
    pub fn pixels(&self) -> &RgbImage { &self.pixels }

    /// Resolution formatted as `WxH`.
    pub fn resolution(&self) -> String { format!("{}x{}", self.width(), self.height()) }

    pub fn encode_png(&self) -> Result<Vec<u8>, image::ImageError> {
        let mut buffer = Cursor::new(Vec::new());
        self.pixels.write_to(&mut buffer, image::ImageFormat::Png)?;
        Ok(buffer.into_inner())
    }

    pub fn encode_jpeg_base64(&self) -> Result<String, image::ImageError> {
        let mut buffer = Vec::new();
        JpegEncoder::new_with_quality(&mut buffer, Self::PREVIEW_JPEG_QUALITY)
            .encode_image(&self.pixels)?;
        Ok(STANDARD.encode(buffer))
    }
}
