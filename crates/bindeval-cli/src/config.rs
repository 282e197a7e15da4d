//! Output path resolution for the CLI.
//!
//! Ensemble runs write two files. Unless overridden on the command line,
//! both land next to the first input table:
//! - `ensemble.csv`: averaged predictions
//! - `metrics_weighted.log` / `metrics_unweighted.log`: the metrics report,
//!   named by whether resampling was stratified by a group lookup

use std::path::{Path, PathBuf};

/// Ensemble predictions file name
const ENSEMBLE_FILENAME: &str = "ensemble.csv";

/// Log file name when a group lookup is used
const WEIGHTED_LOG_FILENAME: &str = "metrics_weighted.log";

/// Log file name without a group lookup
const UNWEIGHTED_LOG_FILENAME: &str = "metrics_unweighted.log";

/// Directory that holds the first input table.
///
/// A bare file name has an empty parent, which resolves to the current
/// directory.
pub fn output_dir(inputs: &[PathBuf]) -> PathBuf {
    inputs
        .first()
        .and_then(|p| p.parent())
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Default path of the ensemble predictions CSV.
pub fn default_ensemble_path(inputs: &[PathBuf]) -> PathBuf {
    output_dir(inputs).join(ENSEMBLE_FILENAME)
}

/// Default path of the metrics log.
pub fn default_log_path(inputs: &[PathBuf], weighted: bool) -> PathBuf {
    let name = if weighted {
        WEIGHTED_LOG_FILENAME
    } else {
        UNWEIGHTED_LOG_FILENAME
    };
    output_dir(inputs).join(name)
}
