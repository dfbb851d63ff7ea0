// THEORY:
// The registry is the bookkeeping around the density core: which plants exist, which
// photographs belong to each, and what a plant's growth report looks like. It keeps
// everything in memory and owns no transport. A service layer translates requests into
// these calls and turns `RegistryError::status_code()` into its responses.
//
// Uploaded bytes are validated, estimated, and then dropped. Only the metadata and the
// density survive in the registry.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use log::{info, warn};
use serde::Serialize;

use crate::config::PipelineConfig;
use crate::core_modules::density::{Density, DensityEstimator};
use crate::core_modules::growth::{DensitySample, DensitySeries, compute_series_growth};
use crate::error::{ConfigError, RegistryError};

pub type PlantId = u64;
pub type ImageId = u64;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plant {
    pub id: PlantId,
    pub name: String,
    pub description: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlantImage {
    pub id: ImageId,
    pub plant_id: PlantId,
    pub image_url: String,
    pub timestamp: NaiveDateTime,
    pub green_density: Density,
    pub created_at: NaiveDateTime,
}

/// An uploaded photograph as received from a client.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    /// ISO 8601 date or date-time, as submitted.
    pub timestamp: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataPoint {
    pub timestamp: NaiveDateTime,
    pub green_density: Density,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculationDetails {
    pub density_t1: Density,
    pub density_t2: Density,
    pub time_difference_days: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthReport {
    pub plant_id: PlantId,
    pub growth_rate: f64,
    pub data_points: Vec<DataPoint>,
    pub calculation_details: CalculationDetails,
}

pub struct PlantRegistry {
    config: PipelineConfig,
    estimator: DensityEstimator,
    plants: BTreeMap<PlantId, Plant>,
    images: BTreeMap<PlantId, Vec<PlantImage>>,
    next_plant_id: PlantId,
    next_image_id: ImageId,
}

impl PlantRegistry {
    pub fn new(config: PipelineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let estimator = DensityEstimator::new(config.threshold);
        Ok(Self::with_estimator(config, estimator))
    }

    pub fn with_estimator(config: PipelineConfig, estimator: DensityEstimator) -> Self {
        Self {
            config,
            estimator,
            plants: BTreeMap::new(),
            images: BTreeMap::new(),
            next_plant_id: 1,
            next_image_id: 1,
        }
    }

    pub fn create_plant(&mut self, name: &str, description: Option<&str>) -> Result<Plant, RegistryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RegistryError::NameRequired);
        }

        let plant = Plant {
            id: self.next_plant_id,
            name: name.to_string(),
            description: description.unwrap_or_default().to_string(),
            created_at: Utc::now().naive_utc(),
        };
        self.next_plant_id += 1;
        self.plants.insert(plant.id, plant.clone());
        self.images.insert(plant.id, Vec::new());
        info!("created plant {} '{}'", plant.id, plant.name);
        Ok(plant)
    }

    pub fn list_plants(&self) -> Vec<&Plant> {
        self.plants.values().collect()
    }

    pub fn plant(&self, plant_id: PlantId) -> Result<&Plant, RegistryError> {
        self.plants
            .get(&plant_id)
            .ok_or(RegistryError::PlantNotFound(plant_id))
    }

    pub fn add_image(&mut self, plant_id: PlantId, upload: Upload) -> Result<PlantImage, RegistryError> {
        self.plant(plant_id)?;
        let result = self.validate_and_estimate(&upload);
        let (filename, timestamp, green_density) = result.inspect_err(|e| {
            warn!(
                "rejected upload '{}' for plant {}: {}",
                upload.filename, plant_id, e
            );
        })?;

        let image = PlantImage {
            id: self.next_image_id,
            plant_id,
            image_url: format!("/uploads/{}", filename),
            timestamp,
            green_density,
            created_at: Utc::now().naive_utc(),
        };
        self.next_image_id += 1;

        let images = self.images.entry(plant_id).or_default();
        let position = images.partition_point(|existing| existing.timestamp <= image.timestamp);
        images.insert(position, image.clone());
        info!(
            "stored image {} for plant {} (density {:.6} at {})",
            image.id, plant_id, green_density, timestamp
        );
        Ok(image)
    }

    fn validate_and_estimate(&self, upload: &Upload) -> Result<(String, NaiveDateTime, Density), RegistryError> {
        if upload.filename.trim().is_empty() {
            return Err(RegistryError::MissingFile);
        }
        let extension = file_extension(&upload.filename)
            .ok_or_else(|| RegistryError::FileTypeNotAllowed(upload.filename.clone()))?;
        if !self.config.is_extension_allowed(extension) {
            return Err(RegistryError::FileTypeNotAllowed(upload.filename.clone()));
        }
        if upload.bytes.len() > self.config.max_upload_bytes {
            return Err(RegistryError::FileTooLarge {
                size: upload.bytes.len(),
                limit: self.config.max_upload_bytes,
            });
        }
        let raw_timestamp = upload
            .timestamp
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(RegistryError::MissingTimestamp)?;
        let timestamp = parse_timestamp(raw_timestamp)
            .ok_or_else(|| RegistryError::InvalidTimestamp(raw_timestamp.to_string()))?;

        let green_density = self.estimator.estimate_bytes(&upload.bytes)?;
        Ok((sanitize_filename(&upload.filename), timestamp, green_density))
    }

    /// Images of a plant, ordered by timestamp.
    pub fn images(&self, plant_id: PlantId) -> Result<&[PlantImage], RegistryError> {
        self.plant(plant_id)?;
        Ok(self
            .images
            .get(&plant_id)
            .map(Vec::as_slice)
            .unwrap_or_default())
    }

    pub fn density_series(&self, plant_id: PlantId) -> Result<DensitySeries, RegistryError> {
        Ok(self
            .images(plant_id)?
            .iter()
            .map(|image| DensitySample::new(image.timestamp, image.green_density))
            .collect())
    }

    pub fn growth_report(&self, plant_id: PlantId) -> Result<GrowthReport, RegistryError> {
        let series = self.density_series(plant_id)?;
        let growth = compute_series_growth(&series)?;

        Ok(GrowthReport {
            plant_id,
            growth_rate: growth.rate,
            data_points: growth
                .data_points
                .iter()
                .map(|sample| DataPoint {
                    timestamp: sample.timestamp,
                    green_density: sample.density,
                })
                .collect(),
            calculation_details: CalculationDetails {
                density_t1: growth.first.density,
                density_t2: growth.last.density,
                time_difference_days: growth.elapsed_days,
            },
        })
    }
}

fn file_extension(filename: &str) -> Option<&str> {
    filename.rsplit_once('.').map(|(_, extension)| extension)
}

/// Parses `YYYY-MM-DDTHH:MM[:SS[.f]]`, the same with a space separator, or a bare date
/// (midnight). A trailing UTC offset (`+02:00`, `Z`) is accepted and the result is
/// normalised to UTC.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];
    const OFFSET_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f%:z",
        "%Y-%m-%dT%H:%M%:z",
        "%Y-%m-%d %H:%M:%S%.f%:z",
        "%Y-%m-%d %H:%M%:z",
    ];
    FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            OFFSET_FORMATS
                .iter()
                .find_map(|format| DateTime::parse_from_str(value, format).ok())
                .or_else(|| DateTime::parse_from_rfc3339(value).ok())
                .map(|datetime| datetime.naive_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Strips directories and keeps only ASCII alphanumerics, '.', '_' and '-'.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);
    let cleaned: String = base
        .chars()
        .filter_map(|c| match c {
            c if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') => Some(c),
            c if c.is_whitespace() => Some('_'),
            _ => None,
        })
        .collect();
    cleaned.trim_start_matches(['.', '_']).to_string()
}
