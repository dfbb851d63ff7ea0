use std::path::Path;

use image::codecs::png::PngEncoder;
use image::error::{ParameterError, ParameterErrorKind};
use image::{ExtendedColorType, ImageEncoder, ImageError};

use crate::core_modules::pixel::pixel::{CHANNELS, Pixel};

/// Colour used for "plant" pixels in synthetic photographs (hue 60, fully saturated).
pub const SYNTHETIC_LEAF: Pixel = Pixel {
    red: 0,
    green: 200,
    blue: 0,
};
/// Colour used for background pixels in synthetic photographs (hue 15, brown).
pub const SYNTHETIC_SOIL: Pixel = Pixel {
    red: 120,
    green: 80,
    blue: 40,
};

fn check_length(width: u32, height: u32, rgb: &[u8]) -> Result<(), ImageError> {
    if rgb.len() != width as usize * height as usize * CHANNELS {
        return Err(ImageError::Parameter(ParameterError::from_kind(
            ParameterErrorKind::DimensionMismatch,
        )));
    }
    Ok(())
}

/// Encodes a packed RGB8 buffer as PNG bytes.
pub fn encode_png(width: u32, height: u32, rgb: &[u8]) -> Result<Vec<u8>, ImageError> {
    check_length(width, height, rgb)?;
    let mut bytes = Vec::new();
    let encoder = PngEncoder::new(&mut bytes);
    encoder.write_image(rgb, width, height, ExtendedColorType::Rgb8)?;
    Ok(bytes)
}

pub fn save_png(path: &Path, width: u32, height: u32, rgb: &[u8]) -> Result<(), ImageError> {
    check_length(width, height, rgb)?;
    let output = std::fs::File::create(path)?;
    let encoder = PngEncoder::new(output);
    encoder.write_image(rgb, width, height, ExtendedColorType::Rgb8)?;
    Ok(())
}

/// A synthetic photograph whose first `round(fraction * width * height)` pixels
/// (row-major) are leaf green and the rest soil brown.
pub fn synthetic_plant_rgb(width: u32, height: u32, fraction: f64) -> Vec<u8> {
    let total = width as usize * height as usize;
    let leaf_count = ((fraction.clamp(0.0, 1.0) * total as f64).round() as usize).min(total);
    let leaf: [u8; CHANNELS] = SYNTHETIC_LEAF.into();
    let soil: [u8; CHANNELS] = SYNTHETIC_SOIL.into();

    let mut rgb = Vec::with_capacity(total * CHANNELS);
    for index in 0..total {
        rgb.extend_from_slice(if index < leaf_count { &leaf } else { &soil });
    }
    rgb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_rejects_wrong_length() {
        assert!(encode_png(2, 2, &[0u8; 5]).is_err());
    }

    #[test]
    fn encode_produces_png_signature() {
        let png = encode_png(1, 1, &[1, 2, 3]).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn synthetic_counts_leaf_pixels() {
        let rgb = synthetic_plant_rgb(10, 10, 0.25);
        let leaf: [u8; 3] = SYNTHETIC_LEAF.into();
        let leaves = rgb.chunks_exact(3).filter(|p| *p == leaf).count();
        assert_eq!(leaves, 25);
    }

    #[test]
    fn save_writes_readable_file() {
        let path = std::env::temp_dir().join(format!(
            "sprout_vision_image_helper_{}.png",
            std::process::id()
        ));
        let rgb = synthetic_plant_rgb(4, 3, 0.5);
        save_png(&path, 4, 3, &rgb).expect("Error Saving File.");
        let decoded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(decoded.into_raw(), rgb);
        let _ = std::fs::remove_file(path);
    }
}
