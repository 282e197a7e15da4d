//! Error types for bindeval-core.
//!
//! This module defines the fatal errors raised by the bootstrap engine and
//! by the table-loading helpers that feed it. Metric degeneracies (zero
//! variance, no comparable pairs) are not errors: they surface as NaN on
//! the affected metric and never abort an evaluation.

use thiserror::Error;

/// Errors that abort an engine run before any metric is computed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Prediction, truth and group sequences disagree in length
    #[error(
        "Input shape mismatch: {predictions} predictions, {truths} truths{}",
        group_suffix(.groups)
    )]
    InputShape {
        predictions: usize,
        truths: usize,
        groups: Option<usize>,
    },
    /// No samples were supplied
    #[error("Empty input: at least one prediction/truth pair is required")]
    EmptyInput,
    /// A tuning parameter is outside its valid range
    #[error("Invalid parameter {name}={value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: &'static str,
    },
    /// A prediction or truth is NaN or infinite
    #[error("Non-finite {field} at index {index}: {value}")]
    NonFiniteValue {
        field: &'static str,
        index: usize,
        value: f64,
    },
    /// A bootstrap worker thread panicked
    #[error("Bootstrap worker thread panicked")]
    WorkerPanicked,
}

/// Errors that can occur while loading or combining prediction tables.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DatasetError {
    /// Failed to open, read or write a file
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },
    /// A row could not be parsed (missing column, non-numeric value, ...)
    #[error("Failed to parse {path}: {message}")]
    Parse { path: String, message: String },
    /// A key appears more than once in a group lookup table
    #[error("Duplicate system_id {key:?} in group lookup {path}")]
    DuplicateKey { path: String, key: String },
    /// Tables that should describe the same samples do not line up
    #[error("Misaligned tables: {0}")]
    Misaligned(String),
    /// No tables were supplied where at least one is required
    #[error("No prediction tables supplied")]
    NoTables,
}

fn group_suffix(groups: &Option<usize>) -> String {
    match groups {
        Some(g) => format!(", {} group labels", g),
        None => String::new(),
    }
}

impl DatasetError {
    pub(crate) fn io(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        DatasetError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }

    pub(crate) fn parse(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        DatasetError::Parse {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}
