// THEORY:
// The `DensityEstimator` turns one photograph into one number: the fraction of its
// pixels that fall inside the green HSV box. It is the only place in the crate where
// pixels are classified.
//
// Key architectural principles:
// 1.  **Bound configuration**: The threshold box and the decoder are fixed when the
//     estimator is built. There is no global state, so any number of estimators can
//     run concurrently on different threads.
// 2.  **Pure core**: `estimate_buffer` is a pure function of a decoded buffer. The byte
//     and file entry points only add decoding in front of it and report every failure
//     as `ImageDecodeError`.
// 3.  **Scoped buffers**: A decoded buffer lives only for the duration of one estimate
//     call and is dropped before the density is returned.

use std::path::Path;

use log::{debug, warn};

use crate::core_modules::decoder::{ImageCrateDecoder, ImageDecoder};
use crate::core_modules::pixel_buffer::pixel_buffer::PixelBuffer;
use crate::core_modules::threshold::GreenThreshold;
use crate::error::ImageDecodeError;

/// Fraction of green pixels in an image, always within [0, 1].
pub type Density = f64;

/// Per-pixel classification result. Only built by `DensityEstimator::classify`,
/// so it always covers a non-empty buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GreenMask {
    width: u32,
    height: u32,
    /// Row-major, `true` where the pixel is green.
    mask: Vec<bool>,
    green_pixels: usize,
}

impl GreenMask {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major, `true` where the pixel is green.
    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    pub fn green_pixels(&self) -> usize {
        self.green_pixels
    }

    pub fn total_pixels(&self) -> usize {
        self.mask.len()
    }

    pub fn density(&self) -> Density {
        match self.total_pixels() {
            0 => 0.0,
            total => self.green_pixels as Density / total as Density,
        }
    }
}

pub struct DensityEstimator {
    threshold: GreenThreshold,
    decoder: Box<dyn ImageDecoder>,
}

impl Default for DensityEstimator {
    fn default() -> Self {
        Self::new(GreenThreshold::default())
    }
}

impl DensityEstimator {
    /// An estimator using the `image` crate for decoding.
    pub fn new(threshold: GreenThreshold) -> Self {
        Self::with_decoder(threshold, Box::new(ImageCrateDecoder))
    }

    pub fn with_decoder(threshold: GreenThreshold, decoder: Box<dyn ImageDecoder>) -> Self {
        Self { threshold, decoder }
    }

    pub fn threshold(&self) -> &GreenThreshold {
        &self.threshold
    }

    pub fn count_green(&self, buffer: &PixelBuffer) -> usize {
        buffer
            .pixels()
            .filter(|pixel| self.threshold.contains(pixel.to_hsv()))
            .count()
    }

    pub fn classify(&self, buffer: &PixelBuffer) -> GreenMask {
        let mask: Vec<bool> = buffer
            .pixels()
            .map(|pixel| self.threshold.contains(pixel.to_hsv()))
            .collect();
        let green_pixels = mask.iter().filter(|green| **green).count();
        GreenMask {
            width: buffer.width(),
            height: buffer.height(),
            mask,
            green_pixels,
        }
    }

    pub fn estimate_buffer(&self, buffer: &PixelBuffer) -> Density {
        let green_pixels = self.count_green(buffer);
        let total_pixels = buffer.pixel_count();
        let density = green_pixels as Density / total_pixels as Density;
        debug!(
            "green density {:.6} ({} of {} pixels, {}x{})",
            density,
            green_pixels,
            total_pixels,
            buffer.width(),
            buffer.height()
        );
        density
    }

    pub fn estimate_bytes(&self, bytes: &[u8]) -> Result<Density, ImageDecodeError> {
        let buffer = self.decoder.decode(bytes).inspect_err(|e| {
            warn!("failed to decode {} byte image: {}", bytes.len(), e);
        })?;
        Ok(self.estimate_buffer(&buffer))
    }

    pub fn estimate_file(&self, path: &Path) -> Result<Density, ImageDecodeError> {
        let bytes = std::fs::read(path).map_err(|source| ImageDecodeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.estimate_bytes(&bytes)
    }
}

/// Green density of an encoded image under the default threshold box.
pub fn estimate_green_density(bytes: &[u8]) -> Result<Density, ImageDecodeError> {
    DensityEstimator::default().estimate_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::decoder::RawRgbDecoder;
    use crate::core_modules::pixel::pixel::Pixel;
    use crate::utils::image_helper::{SYNTHETIC_LEAF, SYNTHETIC_SOIL, encode_png};

    fn buffer_of(pixels: &[Pixel], width: u32) -> PixelBuffer {
        let height = pixels.len() as u32 / width;
        PixelBuffer::from_pixels(width, height, pixels).unwrap()
    }

    #[test]
    fn all_outside_box_is_exactly_zero() {
        let estimator = DensityEstimator::default();
        let pixels = [
            Pixel::new(255, 0, 0),
            Pixel::new(0, 0, 255),
            Pixel::new(128, 128, 128),
            Pixel::new(0, 30, 0), // green hue but too dark
            SYNTHETIC_SOIL,
            Pixel::new(0, 0, 0),
        ];
        assert_eq!(estimator.estimate_buffer(&buffer_of(&pixels, 3)), 0.0);
    }

    #[test]
    fn all_inside_box_is_exactly_one() {
        let estimator = DensityEstimator::default();
        let pixels = [
            SYNTHETIC_LEAF,
            Pixel::new(0, 255, 0),
            Pixel::new(60, 140, 50),
            Pixel::new(30, 90, 40),
        ];
        assert_eq!(estimator.estimate_buffer(&buffer_of(&pixels, 2)), 1.0);
    }

    #[test]
    fn density_is_green_fraction() {
        let estimator = DensityEstimator::default();
        let pixels = [SYNTHETIC_LEAF, SYNTHETIC_SOIL, SYNTHETIC_SOIL, SYNTHETIC_SOIL];
        assert_eq!(estimator.estimate_buffer(&buffer_of(&pixels, 4)), 0.25);
    }

    #[test]
    fn threshold_is_bound_at_construction() {
        // A box covering only red hues flips the classification.
        let reds = GreenThreshold {
            hue_min: 0,
            hue_max: 10,
            ..GreenThreshold::default()
        };
        let red_estimator = DensityEstimator::new(reds);
        let default_estimator = DensityEstimator::default();
        let buffer = buffer_of(&[Pixel::new(220, 10, 10), SYNTHETIC_LEAF], 2);

        assert_eq!(red_estimator.estimate_buffer(&buffer), 0.5);
        assert_eq!(default_estimator.estimate_buffer(&buffer), 0.5);
        assert_eq!(red_estimator.classify(&buffer).mask(), &[true, false]);
        assert_eq!(default_estimator.classify(&buffer).mask(), &[false, true]);
    }

    #[test]
    fn classify_agrees_with_estimate() {
        let estimator = DensityEstimator::default();
        let buffer = buffer_of(&[SYNTHETIC_LEAF, SYNTHETIC_SOIL, SYNTHETIC_LEAF], 3);
        let mask = estimator.classify(&buffer);
        assert_eq!(mask.green_pixels(), 2);
        assert_eq!(mask.total_pixels(), 3);
        assert_eq!((mask.width(), mask.height()), (3, 1));
        assert_eq!(mask.density(), estimator.estimate_buffer(&buffer));
    }

    #[test]
    fn empty_mask_density_is_zero_not_nan() {
        let mask = GreenMask {
            width: 0,
            height: 0,
            mask: Vec::new(),
            green_pixels: 0,
        };
        assert_eq!(mask.density(), 0.0);
    }

    #[test]
    fn borderline_hue_is_classified_green() {
        // Hue 85 under the fixed-point conversion, the top edge of the box.
        let buffer = buffer_of(&[Pixel::new(0, 87, 74)], 1);
        assert_eq!(DensityEstimator::default().estimate_buffer(&buffer), 1.0);
    }

    #[test]
    fn estimate_bytes_is_deterministic() {
        let rgb: Vec<u8> = (0..64u32 * 48 * 3).map(|i| (i * 37 % 251) as u8).collect();
        let png = encode_png(64, 48, &rgb).unwrap();
        let first = estimate_green_density(&png).unwrap();
        let second = estimate_green_density(&png).unwrap();
        assert_eq!(first.to_bits(), second.to_bits());
        assert!((0.0..=1.0).contains(&first));
    }

    #[test]
    fn estimate_bytes_uses_bound_decoder() {
        let estimator = DensityEstimator::with_decoder(
            GreenThreshold::default(),
            Box::new(RawRgbDecoder::new(2, 1)),
        );
        let raw = [0u8, 200, 0, 120, 80, 40];
        assert_eq!(estimator.estimate_bytes(&raw).unwrap(), 0.5);
    }

    #[test]
    fn undecodable_input_fails() {
        assert!(matches!(
            estimate_green_density(&[]),
            Err(ImageDecodeError::Empty)
        ));
        assert!(matches!(
            estimate_green_density(b"GIF89a but not really"),
            Err(ImageDecodeError::Codec(_))
        ));
    }

    #[test]
    fn missing_file_is_a_decode_error() {
        let estimator = DensityEstimator::default();
        let missing = std::env::temp_dir().join("sprout_vision_missing_photo.png");
        assert!(matches!(
            estimator.estimate_file(&missing),
            Err(ImageDecodeError::Io { .. })
        ));
    }
}
