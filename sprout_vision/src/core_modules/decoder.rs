// THEORY:
// Decoding is a capability, not part of the classification rule. The estimator only
// ever sees a `PixelBuffer`; how the bytes became pixels is hidden behind the narrow
// `ImageDecoder` trait. This keeps the classifier testable against synthetic buffers
// and lets callers plug in another codec without touching the estimator.
//
// Every decoder reports failure with `ImageDecodeError`, whatever the cause.

use crate::core_modules::pixel_buffer::pixel_buffer::PixelBuffer;
use crate::error::ImageDecodeError;

pub trait ImageDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<PixelBuffer, ImageDecodeError>;
}

/// Decodes any format the `image` crate recognises from its magic bytes.
/// Alpha is dropped; palette and greyscale images are expanded to RGB.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCrateDecoder;

impl ImageDecoder for ImageCrateDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<PixelBuffer, ImageDecodeError> {
        if bytes.is_empty() {
            return Err(ImageDecodeError::Empty);
        }
        let decoded = image::load_from_memory(bytes)?;
        let rgb = decoded.to_rgb8();
        let (width, height) = rgb.dimensions();
        PixelBuffer::new(width, height, rgb.into_raw())
    }
}

/// Interprets the bytes as a headerless RGB8 frame of known dimensions.
#[derive(Debug, Clone, Copy)]
pub struct RawRgbDecoder {
    pub width: u32,
    pub height: u32,
}

impl RawRgbDecoder {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl ImageDecoder for RawRgbDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<PixelBuffer, ImageDecodeError> {
        if bytes.is_empty() {
            return Err(ImageDecodeError::Empty);
        }
        PixelBuffer::new(self.width, self.height, bytes.to_vec())
    }
}
