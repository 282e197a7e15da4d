//! Default evaluation configuration.
//!
//! This module contains the constants that define how a standard evaluation
//! run is configured, plus [`EngineConfig`], the bundle of tuning parameters
//! the bootstrap engine consumes. Front ends map their flags onto
//! `EngineConfig` and leave everything else at these defaults.
//!
//! # Usage
//!
//! ```
//! use bindeval_core::config::{EngineConfig, DEFAULT_N_ITERATIONS};
//!
//! let config = EngineConfig::default().with_seed(7);
//! assert_eq!(config.n_iterations, DEFAULT_N_ITERATIONS);
//! assert!(config.validate().is_ok());
//! ```

use crate::error::EngineError;
use serde::{Deserialize, Serialize};

// =============================================================================
// Bootstrap Configuration
// =============================================================================

/// Number of bootstrap rounds per evaluation.
///
/// A few hundred rounds are enough for a stable standard-deviation estimate;
/// percentile intervals benefit from more.
pub const DEFAULT_N_ITERATIONS: usize = 500;

/// Minimum number of members a group needs to take part in stratified
/// resampling.
pub const DEFAULT_N_MIN: usize = 10;

/// Seed for the bootstrap random source.
pub const DEFAULT_SEED: u64 = 42;

/// Number of worker threads used for bootstrap rounds (1 = sequential).
pub const DEFAULT_WORKERS: usize = 1;

// =============================================================================
// Reporting
// =============================================================================

/// Decimal places used when printing metric values.
pub const OUTPUT_PRECISION: usize = 7;

/// Confidence level for optional percentile intervals.
pub const DEFAULT_CONFIDENCE: f64 = 0.95;

// =============================================================================
// Table Columns
// =============================================================================

/// Unique sample identifier column in prediction tables.
pub const KEY_COLUMN: &str = "key";

/// Predicted value column in prediction tables.
pub const PREDICTION_COLUMN: &str = "pred";

/// Measured (true) value column in prediction tables.
pub const TRUTH_COLUMN: &str = "pk";

/// Sample identifier column in group lookup tables.
pub const SYSTEM_ID_COLUMN: &str = "system_id";

/// Group identifier column in group lookup tables.
pub const GROUP_ID_COLUMN: &str = "group_id";

/// Tuning parameters for a bootstrap evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of bootstrap rounds (0 disables resampling)
    pub n_iterations: usize,
    /// Minimum group size for stratified inclusion
    pub n_min: usize,
    /// Seed for the bootstrap random source
    pub seed: u64,
    /// Worker threads for bootstrap rounds
    pub workers: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            n_iterations: DEFAULT_N_ITERATIONS,
            n_min: DEFAULT_N_MIN,
            seed: DEFAULT_SEED,
            workers: DEFAULT_WORKERS,
        }
    }
}

impl EngineConfig {
    pub fn with_iterations(mut self, n_iterations: usize) -> Self {
        self.n_iterations = n_iterations;
        self
    }

    pub fn with_n_min(mut self, n_min: usize) -> Self {
        self.n_min = n_min;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Checks that every parameter is within its valid range.
    ///
    /// `n_iterations` is unsigned, so the only constraints left to check are
    /// that `n_min` and `workers` are at least 1.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.n_min == 0 {
            return Err(EngineError::InvalidParameter {
                name: "n_min",
                value: self.n_min.to_string(),
                reason: "must be at least 1",
            });
        }
        if self.workers == 0 {
            return Err(EngineError::InvalidParameter {
                name: "workers",
                value: self.workers.to_string(),
                reason: "must be at least 1",
            });
        }
        Ok(())
    }
}
