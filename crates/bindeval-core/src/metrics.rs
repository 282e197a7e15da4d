//! Agreement and ranking metrics between predicted and measured values.
//!
//! This module implements the five metrics reported for every evaluation:
//! - RMSE (root mean squared error)
//! - Pearson's r
//! - Kendall's tau-b
//! - Spearman's rho
//! - Generalized concordance index (C-index)
//!
//! # Degenerate Inputs
//!
//! Correlation metrics are undefined when either vector is constant, and the
//! C-index is undefined when no pair of truths differs. In those cases the
//! functions return `f64::NAN` rather than an error, so a single undefined
//! metric never blocks the others.
//!
//! # References
//!
//! - Kendall (1945). "The treatment of ties in ranking problems"
//! - Harrell et al. (1982). "Evaluating the yield of medical tests"

use crate::stats::average_ranks;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The metrics computed by the engine, in reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Rmse,
    Pearson,
    Kendall,
    Spearman,
    CIndex,
}

impl Metric {
    /// All metrics in reporting order.
    pub const ALL: [Metric; 5] = [
        Metric::Rmse,
        Metric::Pearson,
        Metric::Kendall,
        Metric::Spearman,
        Metric::CIndex,
    ];

    /// Machine name used as the result-mapping key.
    pub fn name(self) -> &'static str {
        match self {
            Metric::Rmse => "rmse",
            Metric::Pearson => "pearson",
            Metric::Kendall => "kendall",
            Metric::Spearman => "spearman",
            Metric::CIndex => "c_index",
        }
    }

    /// Position of this metric in [`Metric::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Computes this metric on a set of (prediction, truth) pairs.
    pub fn compute(self, predictions: &[f64], truths: &[f64]) -> f64 {
        match self {
            Metric::Rmse => rmse(predictions, truths),
            Metric::Pearson => pearson(predictions, truths),
            Metric::Kendall => kendall_tau(predictions, truths),
            Metric::Spearman => spearman(predictions, truths),
            Metric::CIndex => concordance_index(predictions, truths),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Values of all five metrics for one set of pairs, indexed by
/// [`Metric::index`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricValues(pub [f64; 5]);

impl MetricValues {
    /// Computes every metric on the given pairs.
    ///
    /// Pair counting is shared between Kendall's tau and the C-index, so the
    /// quadratic pass over all pairs runs once.
    pub fn compute(predictions: &[f64], truths: &[f64]) -> Self {
        let pairs = PairCounts::count(predictions, truths);
        let mut values = [f64::NAN; 5];
        values[Metric::Rmse.index()] = rmse(predictions, truths);
        values[Metric::Pearson.index()] = pearson(predictions, truths);
        values[Metric::Kendall.index()] = pairs.kendall_tau_b();
        values[Metric::Spearman.index()] = spearman(predictions, truths);
        values[Metric::CIndex.index()] = pairs.concordance_index();
        Self(values)
    }

    pub fn get(&self, metric: Metric) -> f64 {
        self.0[metric.index()]
    }
}

// ============================================================================
// RMSE
// ============================================================================

/// Root mean squared error: `sqrt(mean((p - t)^2))`.
///
/// Always >= 0 for non-empty input; lower is better. Returns NaN for empty
/// input. Errors are scaled by the largest absolute error before squaring,
/// so large finite inputs do not overflow.
pub fn rmse(predictions: &[f64], truths: &[f64]) -> f64 {
    debug_assert_eq!(predictions.len(), truths.len());
    if predictions.is_empty() {
        return f64::NAN;
    }
    let scale = predictions
        .iter()
        .zip(truths)
        .map(|(p, t)| (p - t).abs())
        .fold(0.0, f64::max);
    if scale == 0.0 || !scale.is_finite() {
        return scale;
    }
    let sse: f64 = predictions
        .iter()
        .zip(truths)
        .map(|(p, t)| {
            let d = (p - t) / scale;
            d * d
        })
        .sum();
    scale * (sse / predictions.len() as f64).sqrt()
}

// ============================================================================
// Correlation
// ============================================================================

/// Pearson's linear correlation coefficient.
///
/// # Returns
///
/// Value in [-1, 1], or NaN if fewer than two pairs are given or either
/// vector has zero variance.
pub fn pearson(predictions: &[f64], truths: &[f64]) -> f64 {
    debug_assert_eq!(predictions.len(), truths.len());
    let n = predictions.len();
    if n < 2 || is_constant(predictions) || is_constant(truths) {
        return f64::NAN;
    }

    // Scaling by the largest magnitude keeps the sums of squares finite
    let predictions = scaled(predictions);
    let truths = scaled(truths);

    let mean_p = predictions.iter().sum::<f64>() / n as f64;
    let mean_t = truths.iter().sum::<f64>() / n as f64;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (p, t) in predictions.iter().zip(&truths) {
        let dp = p - mean_p;
        let dt = t - mean_t;
        sxy += dp * dt;
        sxx += dp * dp;
        syy += dt * dt;
    }

    if sxx == 0.0 || syy == 0.0 {
        return f64::NAN;
    }

    // sqrt of the product keeps identical vectors at exactly 1.0
    (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
}

/// True if every value equals the first, compared exactly.
fn is_constant(values: &[f64]) -> bool {
    values.iter().all(|&v| v == values[0])
}

/// Values divided by their largest magnitude.
fn scaled(values: &[f64]) -> Vec<f64> {
    let scale = values.iter().fold(0.0, |m: f64, v| m.max(v.abs()));
    values.iter().map(|v| v / scale).collect()
}

/// Spearman's rank correlation: Pearson's r of the average ranks.
///
/// Tied values receive the mean of the ranks they span.
pub fn spearman(predictions: &[f64], truths: &[f64]) -> f64 {
    debug_assert_eq!(predictions.len(), truths.len());
    if predictions.len() < 2 {
        return f64::NAN;
    }
    pearson(&average_ranks(predictions), &average_ranks(truths))
}

/// Kendall's tau-b rank correlation.
///
/// Pairs tied in either vector contribute zero net concordance; the
/// denominator `sqrt((n0 - n1)(n0 - n2))` corrects for ties in each vector.
pub fn kendall_tau(predictions: &[f64], truths: &[f64]) -> f64 {
    PairCounts::count(predictions, truths).kendall_tau_b()
}

/// Generalized concordance index.
///
/// Over all pairs whose truths differ, a pair is concordant when the
/// predictions are ordered the same way as the truths, discordant when
/// they are ordered the other way, and earns half credit when the
/// predictions are tied.
///
/// # Returns
///
/// Value in [0, 1], or NaN when every truth is equal (no comparable pairs).
pub fn concordance_index(predictions: &[f64], truths: &[f64]) -> f64 {
    PairCounts::count(predictions, truths).concordance_index()
}

/// Pairwise ordering tallies over all `i < j`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PairCounts {
    /// Ordered the same way in both vectors
    pub concordant: u64,
    /// Ordered opposite ways
    pub discordant: u64,
    /// Tied in predictions only
    pub tied_prediction: u64,
    /// Tied in truths only
    pub tied_truth: u64,
    /// Tied in both
    pub tied_both: u64,
}

impl PairCounts {
    /// Tallies every pair. Quadratic in the number of samples.
    pub fn count(predictions: &[f64], truths: &[f64]) -> Self {
        debug_assert_eq!(predictions.len(), truths.len());
        let n = predictions.len();
        let mut counts = Self::default();

        for i in 0..n {
            for j in (i + 1)..n {
                let dp = predictions[i] - predictions[j];
                let dt = truths[i] - truths[j];
                match (dp == 0.0, dt == 0.0) {
                    (true, true) => counts.tied_both += 1,
                    (true, false) => counts.tied_prediction += 1,
                    (false, true) => counts.tied_truth += 1,
                    (false, false) => {
                        if (dp > 0.0) == (dt > 0.0) {
                            counts.concordant += 1;
                        } else {
                            counts.discordant += 1;
                        }
                    }
                }
            }
        }

        counts
    }

    pub fn total(&self) -> u64 {
        self.concordant + self.discordant + self.tied_prediction + self.tied_truth + self.tied_both
    }

    /// Pairs whose truths differ.
    pub fn comparable(&self) -> u64 {
        self.concordant + self.discordant + self.tied_prediction
    }

    /// Kendall's tau-b from the tallies; NaN if either vector is constant.
    pub fn kendall_tau_b(&self) -> f64 {
        let n0 = self.total();
        let untied_pred = n0 - (self.tied_prediction + self.tied_both);
        let untied_truth = n0 - (self.tied_truth + self.tied_both);
        if untied_pred == 0 || untied_truth == 0 {
            return f64::NAN;
        }
        let numerator = self.concordant as f64 - self.discordant as f64;
        let denominator = (untied_pred as f64 * untied_truth as f64).sqrt();
        (numerator / denominator).clamp(-1.0, 1.0)
    }

    /// C-index from the tallies; NaN if no pair is comparable.
    pub fn concordance_index(&self) -> f64 {
        let comparable = self.comparable();
        if comparable == 0 {
            return f64::NAN;
        }
        (self.concordant as f64 + 0.5 * self.tied_prediction as f64) / comparable as f64
    }
}
