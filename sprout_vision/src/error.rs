use std::path::PathBuf;

use thiserror::Error;

/// The input could not be turned into a non-empty RGB pixel buffer.
#[derive(Debug, Error)]
pub enum ImageDecodeError {
    #[error("Image is empty (zero bytes)")]
    Empty,

    #[error("Unable to decode image: {0}")]
    Codec(#[from] image::ImageError),

    #[error("Image has no pixels ({width}x{height})")]
    ZeroArea { width: u32, height: u32 },

    #[error("Pixel buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },

    #[error("Image dimensions {width}x{height} exceed addressable memory")]
    TooLarge { width: u32, height: u32 },

    #[error("Failed to read image '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// A growth rate could not be derived from the given observations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrowthError {
    #[error("Time difference is zero ({elapsed_days} whole days between observations)")]
    InvalidDuration { elapsed_days: i64 },

    #[error("Not enough images to calculate growth rate ({samples} available, 2 required)")]
    InsufficientData { samples: usize },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid green threshold: {0}")]
    InvalidThreshold(String),

    #[error("Worker count must be at least 1")]
    InvalidWorkerCount,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Density worker pool is unavailable")]
    WorkerUnavailable,

    #[error(transparent)]
    Decode(#[from] ImageDecodeError),

    #[error(transparent)]
    Growth(#[from] GrowthError),
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Plant {0} not found")]
    PlantNotFound(u64),

    #[error("Name is required")]
    NameRequired,

    #[error("No selected file")]
    MissingFile,

    #[error("File type not allowed: '{0}'")]
    FileTypeNotAllowed(String),

    #[error("File is too large ({size} bytes, limit {limit})")]
    FileTooLarge { size: usize, limit: usize },

    #[error("Timestamp is required")]
    MissingTimestamp,

    #[error("Invalid timestamp format: '{0}'")]
    InvalidTimestamp(String),

    #[error(transparent)]
    Decode(#[from] ImageDecodeError),

    #[error(transparent)]
    Growth(#[from] GrowthError),
}

impl RegistryError {
    /// The 4xx status a service layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            RegistryError::PlantNotFound(_) => 404,
            RegistryError::FileTooLarge { .. } => 413,
            _ => 400,
        }
    }
}
