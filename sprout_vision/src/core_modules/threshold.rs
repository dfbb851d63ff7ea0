// THEORY:
// The threshold box decides what "green" means. It is a plain value, bound to an
// estimator when the estimator is built, so two estimators with different boxes can
// run side by side and tests can swap in their own box without touching shared state.
//
// All bounds are inclusive and use the crate-wide HSV scale (hue 0..180, saturation
// and value 0..255).

use serde::{Deserialize, Serialize};

use crate::core_modules::pixel::pixel::{HUE_SCALE, HsvPixel};
use crate::error::ConfigError;

pub const DEFAULT_HUE_MIN: u8 = 35;
pub const DEFAULT_HUE_MAX: u8 = 85;
pub const DEFAULT_SATURATION_MIN: u8 = 40;
pub const DEFAULT_SATURATION_MAX: u8 = 255;
pub const DEFAULT_VALUE_MIN: u8 = 40;
pub const DEFAULT_VALUE_MAX: u8 = 255;

/// An inclusive HSV box; a pixel inside it is classified as green.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GreenThreshold {
    pub hue_min: u8,
    pub hue_max: u8,
    pub saturation_min: u8,
    pub saturation_max: u8,
    pub value_min: u8,
    pub value_max: u8,
}

impl Default for GreenThreshold {
    fn default() -> Self {
        Self {
            hue_min: DEFAULT_HUE_MIN,
            hue_max: DEFAULT_HUE_MAX,
            saturation_min: DEFAULT_SATURATION_MIN,
            saturation_max: DEFAULT_SATURATION_MAX,
            value_min: DEFAULT_VALUE_MIN,
            value_max: DEFAULT_VALUE_MAX,
        }
    }
}

impl GreenThreshold {
    #[inline]
    pub fn contains(&self, hsv: HsvPixel) -> bool {
        (self.hue_min..=self.hue_max).contains(&hsv.hue)
            && (self.saturation_min..=self.saturation_max).contains(&hsv.saturation)
            && (self.value_min..=self.value_max).contains(&hsv.value)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hue_min > self.hue_max {
            return Err(ConfigError::InvalidThreshold(format!(
                "hue_min {} exceeds hue_max {}",
                self.hue_min, self.hue_max
            )));
        }
        if self.hue_max > HUE_SCALE {
            return Err(ConfigError::InvalidThreshold(format!(
                "hue_max {} is outside the 0..{} hue scale",
                self.hue_max, HUE_SCALE
            )));
        }
        if self.saturation_min > self.saturation_max {
            return Err(ConfigError::InvalidThreshold(format!(
                "saturation_min {} exceeds saturation_max {}",
                self.saturation_min, self.saturation_max
            )));
        }
        if self.value_min > self.value_max {
            return Err(ConfigError::InvalidThreshold(format!(
                "value_min {} exceeds value_max {}",
                self.value_min, self.value_max
            )));
        }
        Ok(())
    }
}
