//! Statistical helpers shared by the metrics and the bootstrap engine.
//!
//! This module provides:
//! - Mean and sample standard deviation of a distribution
//! - Percentile intervals over a bootstrap distribution
//! - Fractional (average) ranks for rank correlation
//!
//! # References
//!
//! - Efron & Tibshirani (1993). "An Introduction to the Bootstrap"

use std::cmp::Ordering;

/// Percentile interval over a bootstrap distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercentileInterval {
    /// Confidence level the interval was computed for (e.g. 0.95)
    pub confidence: f64,
    /// Lower bound of the interval
    pub lower: f64,
    /// Upper bound of the interval
    pub upper: f64,
}

impl PercentileInterval {
    /// Formats the interval as "[lower, upper]".
    pub fn format(&self, precision: usize) -> String {
        format!(
            "[{:.prec$}, {:.prec$}]",
            self.lower,
            self.upper,
            prec = precision
        )
    }
}

/// Arithmetic mean. Returns NaN for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (divides by `n - 1`).
///
/// Returns 0.0 when fewer than two values are available, since no
/// dispersion can be observed. This is the uncertainty sentinel used for
/// runs without resampling.
pub fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (n - 1) as f64;
    var.sqrt()
}

/// Computes a two-sided percentile interval over a bootstrap distribution.
///
/// With `confidence = 0.95` this returns the 2.5th and 97.5th percentiles,
/// using the same nearest-rank indexing as a sorted-array lookup.
///
/// # Returns
///
/// `None` if the distribution is empty or `confidence` is not in (0, 1).
pub fn percentile_interval(distribution: &[f64], confidence: f64) -> Option<PercentileInterval> {
    if distribution.is_empty() || !(confidence > 0.0 && confidence < 1.0) {
        return None;
    }

    let mut sorted = distribution.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let n = sorted.len();
    let alpha = (1.0 - confidence) / 2.0;
    let lower_idx = ((n as f64) * alpha) as usize;
    let upper_idx = ((n as f64) * (1.0 - alpha)) as usize;

    Some(PercentileInterval {
        confidence,
        lower: sorted[lower_idx.min(n - 1)],
        upper: sorted[upper_idx.min(n - 1)],
    })
}

/// Assigns 1-based fractional ranks, giving tied values the mean of the
/// ranks they span.
///
/// ```
/// use bindeval_core::stats::average_ranks;
///
/// assert_eq!(average_ranks(&[10.0, 30.0, 20.0, 20.0]), vec![1.0, 4.0, 2.5, 2.5]);
/// ```
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        values[a]
            .partial_cmp(&values[b])
            .unwrap_or(Ordering::Equal)
    });

    let mut ranks = vec![0.0; n];
    let mut start = 0;
    while start < n {
        let mut end = start + 1;
        while end < n && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // Positions start..end share the average of ranks start+1..=end
        let rank = (start + end + 1) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = rank;
        }
        start = end;
    }

    ranks
}
