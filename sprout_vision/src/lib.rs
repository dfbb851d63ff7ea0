// THEORY:
// This file is the main entry point for the `sprout_vision` library crate. It exposes
// the two pure core operations (green-density estimation and growth-rate derivation),
// the pipelines that chain them over a plant's photographs, and the in-memory plant
// registry a service layer can sit on.
//
// The low-level building blocks (`Pixel`, `PixelBuffer`, the decoding seam, the
// threshold box) live in `core_modules`; the most common names are re-exported here.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod logging;
pub mod parallel_pipeline;
pub mod pipeline;
pub mod registry;
pub mod utils;

pub use config::PipelineConfig;
pub use core_modules::decoder::{ImageCrateDecoder, ImageDecoder, RawRgbDecoder};
pub use core_modules::density::{Density, DensityEstimator, GreenMask, estimate_green_density};
pub use core_modules::growth::{
    DensitySample, DensitySeries, GrowthRate, SeriesGrowth, compute_growth_rate,
    compute_series_growth, elapsed_whole_days,
};
pub use core_modules::pixel::pixel::{HsvPixel, Pixel};
pub use core_modules::pixel_buffer::pixel_buffer::PixelBuffer;
pub use core_modules::threshold::GreenThreshold;
pub use error::{ConfigError, GrowthError, ImageDecodeError, PipelineError, RegistryError};
pub use parallel_pipeline::ParallelDensityPipeline;
pub use pipeline::{GrowthPipeline, PlantPhoto};
pub use registry::{GrowthReport, Plant, PlantImage, PlantRegistry, Upload};
