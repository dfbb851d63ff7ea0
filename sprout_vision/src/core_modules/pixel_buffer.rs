// THEORY:
// `PixelBuffer` is the decoded form of one photograph: a tightly packed RGB8 grid.
// Like `Pixel`, it is a "dumb" data container. It knows its own dimensions and how
// to hand out its pixels, but nothing about colour classification.
//
// It is also the contract between the decoding seam and the estimator. Whatever
// decoder produced it, a `PixelBuffer` is guaranteed to be non-empty and to hold
// exactly width * height * 3 bytes, so the estimator never has to re-check.

pub mod pixel_buffer {
    use crate::core_modules::pixel::pixel::{CHANNELS, Pixel};
    use crate::error::ImageDecodeError;

    /// A decoded, non-empty RGB8 image.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct PixelBuffer {
        width: u32,
        height: u32,
        /// Row-major RGB bytes, no padding between rows.
        data: Vec<u8>,
    }

    /// Bytes needed for a `width` x `height` RGB8 grid, `None` on overflow.
    fn byte_len(width: u32, height: u32) -> Option<usize> {
        (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(CHANNELS)
    }

    impl PixelBuffer {
        pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, ImageDecodeError> {
            if width == 0 || height == 0 {
                return Err(ImageDecodeError::ZeroArea { width, height });
            }
            let expected =
                byte_len(width, height).ok_or(ImageDecodeError::TooLarge { width, height })?;
            if data.len() != expected {
                return Err(ImageDecodeError::BufferSize {
                    expected,
                    actual: data.len(),
                });
            }
            Ok(Self {
                width,
                height,
                data,
            })
        }

        /// Builds a buffer where every pixel has the same colour.
        pub fn filled(width: u32, height: u32, pixel: Pixel) -> Result<Self, ImageDecodeError> {
            let len = byte_len(width, height).ok_or(ImageDecodeError::TooLarge { width, height })?;
            let rgb: [u8; CHANNELS] = pixel.into();
            let data = rgb.iter().copied().cycle().take(len).collect();
            Self::new(width, height, data)
        }

        pub fn from_pixels(
            width: u32,
            height: u32,
            pixels: &[Pixel],
        ) -> Result<Self, ImageDecodeError> {
            let data = pixels
                .iter()
                .flat_map(|pixel| <[u8; CHANNELS]>::from(*pixel))
                .collect();
            Self::new(width, height, data)
        }

        pub fn width(&self) -> u32 {
            self.width
        }

        pub fn height(&self) -> u32 {
            self.height
        }

        /// Total pixel count, always > 0.
        pub fn pixel_count(&self) -> usize {
            self.width as usize * self.height as usize
        }

        pub fn as_bytes(&self) -> &[u8] {
            &self.data
        }

        pub fn pixels(&self) -> impl Iterator<Item = Pixel> + '_ {
            self.data
                .chunks_exact(CHANNELS)
                .map(|rgb| Pixel::new(rgb[0], rgb[1], rgb[2]))
        }
    }

}
