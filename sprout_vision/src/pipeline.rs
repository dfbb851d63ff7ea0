// THEORY:
// The `pipeline` module is the top-level, single-threaded API of the crate. It wires a
// configured `DensityEstimator` to the growth calculator so that a caller can hand in
// a plant's photographs and get back the density series and its growth rate in one
// call. For many photographs at once, see `parallel_pipeline`.

use chrono::NaiveDateTime;
use log::debug;

use crate::config::PipelineConfig;
use crate::core_modules::density::DensityEstimator;
use crate::error::{ConfigError, ImageDecodeError, PipelineError};

// Re-export key data structures for the public API.
pub use crate::core_modules::density::Density;
pub use crate::core_modules::growth::{DensitySample, DensitySeries, GrowthRate, SeriesGrowth};

use crate::core_modules::growth::compute_series_growth;

/// One encoded photograph of a plant and the moment it was taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlantPhoto {
    pub timestamp: NaiveDateTime,
    pub bytes: Vec<u8>,
}

impl PlantPhoto {
    pub fn new(timestamp: NaiveDateTime, bytes: Vec<u8>) -> Self {
        Self { timestamp, bytes }
    }
}

pub struct GrowthPipeline {
    estimator: DensityEstimator,
    config: PipelineConfig,
}

impl GrowthPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            estimator: DensityEstimator::new(config.threshold),
            config,
        })
    }

    /// Uses a pre-built estimator (custom decoder or threshold) instead of the config's.
    pub fn with_estimator(config: PipelineConfig, estimator: DensityEstimator) -> Self {
        Self { estimator, config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn estimator(&self) -> &DensityEstimator {
        &self.estimator
    }

    pub fn observe(&self, photo: &PlantPhoto) -> Result<DensitySample, ImageDecodeError> {
        let density = self.estimator.estimate_bytes(&photo.bytes)?;
        debug!("observed density {:.6} at {}", density, photo.timestamp);
        Ok(DensitySample::new(photo.timestamp, density))
    }

    /// Estimates every photograph; the first undecodable one aborts the batch.
    pub fn build_series(&self, photos: &[PlantPhoto]) -> Result<DensitySeries, ImageDecodeError> {
        photos.iter().map(|photo| self.observe(photo)).collect()
    }

    pub fn generate_report(&self, photos: &[PlantPhoto]) -> Result<SeriesGrowth, PipelineError> {
        let series = self.build_series(photos)?;
        Ok(compute_series_growth(&series)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::decoder::RawRgbDecoder;
    use crate::core_modules::threshold::GreenThreshold;
    use crate::error::GrowthError;
    use crate::utils::image_helper::{encode_png, synthetic_plant_rgb};
    use chrono::NaiveDate;

    fn day(offset: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1 + offset)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn photo(offset: u32, fraction: f64) -> PlantPhoto {
        let rgb = synthetic_plant_rgb(10, 10, fraction);
        PlantPhoto::new(day(offset), encode_png(10, 10, &rgb).unwrap())
    }

    #[test]
    fn report_uses_first_and_last_photo() {
        let pipeline = GrowthPipeline::new(PipelineConfig::default()).unwrap();
        let photos = vec![photo(10, 0.40), photo(0, 0.10), photo(5, 0.25)];
        let report = pipeline.generate_report(&photos).unwrap();
        assert!((report.rate - 0.03).abs() < 1e-9);
        assert_eq!(report.first.timestamp, day(0));
        assert_eq!(report.last.timestamp, day(10));
        assert_eq!(report.data_points.len(), 3);
    }

    #[test]
    fn single_photo_is_insufficient() {
        let pipeline = GrowthPipeline::new(PipelineConfig::default()).unwrap();
        assert!(matches!(
            pipeline.generate_report(&[photo(0, 0.5)]),
            Err(PipelineError::Growth(GrowthError::InsufficientData { samples: 1 }))
        ));
    }

    #[test]
    fn corrupt_photo_aborts_the_batch() {
        let pipeline = GrowthPipeline::new(PipelineConfig::default()).unwrap();
        let photos = vec![photo(0, 0.5), PlantPhoto::new(day(1), vec![1, 2, 3])];
        assert!(matches!(
            pipeline.generate_report(&photos),
            Err(PipelineError::Decode(_))
        ));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = PipelineConfig {
            worker_count: Some(0),
            ..PipelineConfig::default()
        };
        assert!(GrowthPipeline::new(config).is_err());
    }

    #[test]
    fn custom_estimator_is_used() {
        let estimator = DensityEstimator::with_decoder(
            GreenThreshold::default(),
            Box::new(RawRgbDecoder::new(1, 1)),
        );
        let pipeline = GrowthPipeline::with_estimator(PipelineConfig::default(), estimator);
        let sample = pipeline
            .observe(&PlantPhoto::new(day(0), vec![0, 200, 0]))
            .unwrap();
        assert_eq!(sample.density, 1.0);
    }
}
