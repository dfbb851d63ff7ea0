// THEORY (single-pixel colour model):
// The `Pixel` module is the most fundamental unit of the density estimator. It is a
// "dumb" data container for one RGB sample plus the single heuristic the estimator
// needs from it: the pixel's position in HSV space. Anything that needs more than one
// pixel (counting, ratios, masks) lives in `density`.
//
// HSV scale used everywhere in this crate (8-bit convention):
// - hue:        0..180 half-scale (degrees / 2), so the full wheel fits in a byte
// - saturation: 0..255, 255 * chroma / value
// - value:      0..255, max(R, G, B)
//
// The conversion is the 8-bit fixed-point form used by common vision libraries:
// saturation and hue are scaled by reciprocal tables with 12 fractional bits and
// rounded by adding half a unit before the shift. Matching that arithmetic exactly
// keeps borderline pixels (hue 35 or 85) classified the same way as a photograph
// run through an OpenCV `BGR2HSV` conversion. No floating point is involved in
// classification.

pub mod pixel {
    use std::sync::OnceLock;

    pub type Byte = u8;
    pub type Channel = Byte;
    pub type Hue = u8;
    pub type Saturation = u8;
    pub type Value = u8;

    pub const CHANNELS: usize = 3;
    /// Exclusive upper bound of the half-scale hue wheel.
    pub const HUE_SCALE: u8 = 180;

    /// Fractional bits of the fixed-point division tables.
    const HSV_SHIFT: u32 = 12;
    const HSV_HALF: i32 = 1 << (HSV_SHIFT - 1);

    struct DivisionTables {
        /// `round((255 << 12) / v)`, 0 for v = 0.
        saturation: [i32; 256],
        /// `round((180 << 12) / (6 * chroma))`, 0 for chroma = 0.
        hue: [i32; 256],
    }

    fn division_tables() -> &'static DivisionTables {
        static TABLES: OnceLock<DivisionTables> = OnceLock::new();
        TABLES.get_or_init(|| {
            let mut tables = DivisionTables {
                saturation: [0; 256],
                hue: [0; 256],
            };
            let saturation_numerator = 255 << HSV_SHIFT;
            let hue_numerator = (HUE_SCALE as i32) << HSV_SHIFT;
            for i in 1..256i32 {
                // Integer round-to-nearest; no quotient here lands on an exact half.
                tables.saturation[i as usize] = (2 * saturation_numerator + i) / (2 * i);
                tables.hue[i as usize] = (2 * hue_numerator + 6 * i) / (12 * i);
            }
            tables
        })
    }

    /// A "dumb" data container representing a single RGB pixel.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Pixel {
        /// The red channel value (0-255).
        pub red: Channel,
        /// The green channel value (0-255).
        pub green: Channel,
        /// The blue channel value (0-255).
        pub blue: Channel,
    }

    /// A pixel expressed in HSV with hue on the 0..180 half-scale.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct HsvPixel {
        pub hue: Hue,
        pub saturation: Saturation,
        pub value: Value,
    }

    impl Pixel {
        pub fn new(red: Channel, green: Channel, blue: Channel) -> Self {
            Pixel { red, green, blue }
        }

        /// Converts to HSV (hue 0..180, saturation and value 0..255).
        ///
        /// - V = max(R, G, B)
        /// - S = (chroma * sdiv[V] + 2^11) >> 12, 0 for black
        /// - H = (h' * hdiv[chroma] + 2^11) >> 12, where h' is the difference inside the
        ///   sector of the dominant channel (red wins ties, then green). Negative hues
        ///   wrap by 180.
        /// - Achromatic pixels (chroma 0) have hue 0.
        pub fn to_hsv(&self) -> HsvPixel {
            let tables = division_tables();
            let red = self.red as i32;
            let green = self.green as i32;
            let blue = self.blue as i32;

            let maximum_channel = red.max(green).max(blue);
            let minimum_channel = red.min(green).min(blue);
            let chroma = maximum_channel - minimum_channel;

            let saturation = (chroma * tables.saturation[maximum_channel as usize] + HSV_HALF)
                >> HSV_SHIFT;

            let sector_difference = if maximum_channel == red {
                green - blue
            } else if maximum_channel == green {
                blue - red + 2 * chroma
            } else {
                red - green + 4 * chroma
            };
            // Arithmetic shift floors, so negative differences round the same way.
            let hue = (sector_difference * tables.hue[chroma as usize] + HSV_HALF) >> HSV_SHIFT;
            let hue = if hue < 0 { hue + HUE_SCALE as i32 } else { hue };

            HsvPixel {
                hue: hue as Hue,
                saturation: saturation as Saturation,
                value: maximum_channel as Value,
            }
        }
    }

    impl From<[Byte; CHANNELS]> for Pixel {
        fn from(bytes: [Byte; CHANNELS]) -> Self {
            Pixel::new(bytes[0], bytes[1], bytes[2])
        }
    }

    impl From<Pixel> for [Byte; CHANNELS] {
        fn from(pixel: Pixel) -> Self {
            [pixel.red, pixel.green, pixel.blue]
        }
    }

}
