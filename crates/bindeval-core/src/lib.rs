//! # Bindeval Core
//!
//! Bootstrap evaluation of continuous predictions against measured values.
//!
//! This crate scores model predictions (e.g. predicted binding affinities)
//! with five agreement and ranking metrics and estimates the sampling
//! uncertainty of each score by bootstrap resampling, optionally stratified
//! by group.
//!
//! ## Modules
//!
//! - [`engine`] - Bootstrap metric engine (point estimates + uncertainty)
//! - [`metrics`] - RMSE, Pearson, Kendall, Spearman and C-index
//! - [`resample`] - Unstratified and group-stratified resampling plans
//! - [`stats`] - Dispersion, percentile intervals and ranking helpers
//! - [`dataset`] - Prediction and group-lookup CSV tables
//! - [`ensemble`] - Averaging predictions across models
//! - [`config`] - Default configuration and engine parameters
//! - [`error`] - Error types for the engine and table loading

pub mod config;
pub mod dataset;
pub mod engine;
pub mod ensemble;
pub mod error;
pub mod metrics;
pub mod resample;
pub mod stats;

#[cfg(test)]
mod test_utils;

pub use config::EngineConfig;
pub use dataset::{GroupLookup, PredictionTable};
pub use engine::{BootstrapEngine, MetricReport, MetricResult};
pub use ensemble::average_predictions;
pub use error::{DatasetError, EngineError};
pub use metrics::Metric;
