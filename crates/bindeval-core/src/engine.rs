//! Bootstrap metric engine.
//!
//! [`BootstrapEngine`] scores a set of predictions against measured values
//! and estimates how much each score would move under resampling of the
//! evaluated samples.
//!
//! # Algorithm
//!
//! 1. Compute every metric once on the full, unresampled set of pairs
//!    (the point estimates).
//! 2. Build a [`ResamplingPlan`]: all samples, or, when group labels are
//!    supplied, one stratum per group of at least `n_min` members.
//! 3. For each of `n_iterations` rounds, draw a resample from the plan and
//!    recompute every metric. Values that are undefined for a round (NaN)
//!    are dropped from that metric's distribution.
//! 4. Report each metric's sample standard deviation across rounds as its
//!    uncertainty.
//!
//! # Group Policy
//!
//! Members of sparse groups (fewer than `n_min` samples) and unlabelled
//! samples are part of the point estimate but never drawn during
//! stratified resampling.
//!
//! # Example
//!
//! ```
//! use bindeval_core::{BootstrapEngine, EngineConfig, Metric};
//!
//! let truths = vec![5.1, 6.3, 4.8, 7.2, 6.0, 5.5];
//! let predictions = vec![5.4, 6.0, 5.0, 6.8, 6.1, 5.2];
//!
//! let engine = BootstrapEngine::new(&predictions, &truths, EngineConfig::default())?;
//! let report = engine.all_metrics()?;
//!
//! let rmse = report.get(Metric::Rmse);
//! println!("RMSE {:.3} ± {:.3}", rmse.value, rmse.uncertainty);
//! # Ok::<(), bindeval_core::EngineError>(())
//! ```

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::metrics::{Metric, MetricValues};
use crate::resample::{round_rng, ResamplingPlan, StrataSummary};
use crate::stats::{percentile_interval, sample_std, PercentileInterval};
use serde::Serialize;
use std::collections::BTreeMap;
use std::hash::Hash;
use std::thread;
use tracing::{debug, info};

/// Point estimate and bootstrap uncertainty for one metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricResult {
    pub metric: Metric,
    /// Value on the full, unresampled dataset (NaN if undefined)
    pub value: f64,
    /// Sample standard deviation of the bootstrap distribution
    pub uncertainty: f64,
    /// Rounds whose resample left this metric undefined
    pub degenerate_rounds: usize,
    /// Finite per-round values, in round order
    #[serde(skip)]
    pub distribution: Vec<f64>,
}

impl MetricResult {
    /// Returns `(point_estimate, uncertainty, distribution)`.
    pub fn as_tuple(&self) -> (f64, f64, &[f64]) {
        (self.value, self.uncertainty, &self.distribution)
    }

    /// Number of rounds that contributed to the uncertainty.
    pub fn n_bootstrap(&self) -> usize {
        self.distribution.len()
    }

    /// Percentile interval over the bootstrap distribution, if any rounds
    /// produced a value.
    pub fn percentile_interval(&self, confidence: f64) -> Option<PercentileInterval> {
        percentile_interval(&self.distribution, confidence)
    }
}

/// Results for all metrics of one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricReport {
    /// Samples in the point estimate
    pub n_samples: usize,
    /// Bootstrap rounds requested
    pub n_iterations: usize,
    /// Whether rounds were stratified by group
    pub stratified: bool,
    pub results: BTreeMap<Metric, MetricResult>,
}

impl MetricReport {
    /// Result for a metric. Every metric is always present.
    pub fn get(&self, metric: Metric) -> &MetricResult {
        &self.results[&metric]
    }

    /// Results in reporting order.
    pub fn iter(&self) -> impl Iterator<Item = &MetricResult> {
        self.results.values()
    }

    /// Mapping from metric name to `(point_estimate, uncertainty)`.
    pub fn summary(&self) -> BTreeMap<&'static str, (f64, f64)> {
        self.iter()
            .map(|r| (r.metric.name(), (r.value, r.uncertainty)))
            .collect()
    }
}

/// Evaluates predictions against truths with bootstrap uncertainty.
///
/// The engine borrows its inputs and holds no state beyond one evaluation;
/// construct a new engine per dataset.
#[derive(Debug, Clone)]
pub struct BootstrapEngine<'a> {
    predictions: &'a [f64],
    truths: &'a [f64],
    plan: ResamplingPlan,
    strata: Option<StrataSummary>,
    config: EngineConfig,
}

impl<'a> BootstrapEngine<'a> {
    /// Creates an engine over aligned predictions and truths.
    ///
    /// # Errors
    ///
    /// - [`EngineError::InvalidParameter`] if `config` fails validation
    /// - [`EngineError::InputShape`] if the sequences differ in length
    /// - [`EngineError::EmptyInput`] if there are no samples
    /// - [`EngineError::NonFiniteValue`] if any value is NaN or infinite
    pub fn new(
        predictions: &'a [f64],
        truths: &'a [f64],
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        config.validate()?;

        if predictions.len() != truths.len() {
            return Err(EngineError::InputShape {
                predictions: predictions.len(),
                truths: truths.len(),
                groups: None,
            });
        }
        if predictions.is_empty() {
            return Err(EngineError::EmptyInput);
        }
        check_finite("prediction", predictions)?;
        check_finite("truth", truths)?;

        Ok(Self {
            predictions,
            truths,
            plan: ResamplingPlan::unstratified(predictions.len()),
            strata: None,
            config,
        })
    }

    /// Stratifies bootstrap rounds by group label.
    ///
    /// `None` labels mark ungrouped samples (e.g. a missing lookup entry).
    ///
    /// # Errors
    ///
    /// [`EngineError::InputShape`] if `groups` is not aligned with the
    /// predictions.
    pub fn with_groups<G: Hash + Eq>(mut self, groups: &[Option<G>]) -> Result<Self, EngineError> {
        if groups.len() != self.predictions.len() {
            return Err(EngineError::InputShape {
                predictions: self.predictions.len(),
                truths: self.truths.len(),
                groups: Some(groups.len()),
            });
        }
        let (plan, summary) = ResamplingPlan::stratified(groups, self.config.n_min);
        self.plan = plan;
        self.strata = Some(summary);
        Ok(self)
    }

    pub fn plan(&self) -> &ResamplingPlan {
        &self.plan
    }

    /// How group labels were split into strata, if labels were supplied.
    pub fn strata(&self) -> Option<&StrataSummary> {
        self.strata.as_ref()
    }

    /// Computes point estimates and bootstrap uncertainties for every
    /// metric.
    ///
    /// Results are bit-identical for a fixed seed regardless of the number
    /// of workers.
    pub fn all_metrics(&self) -> Result<MetricReport, EngineError> {
        let n_iterations = self.config.n_iterations;
        info!(
            samples = self.predictions.len(),
            n_iterations,
            stratified = self.plan.is_stratified(),
            workers = self.config.workers,
            "Computing metrics with bootstrap"
        );

        let point = self.point_estimates();
        let rounds = self.run_rounds()?;

        let mut results = BTreeMap::new();
        for metric in Metric::ALL {
            let distribution: Vec<f64> = rounds
                .iter()
                .map(|values| values.get(metric))
                .filter(|v| v.is_finite())
                .collect();
            let degenerate_rounds = rounds.len() - distribution.len();
            if degenerate_rounds > 0 {
                debug!(
                    metric = metric.name(),
                    degenerate_rounds, "Dropped undefined bootstrap values"
                );
            }

            results.insert(
                metric,
                MetricResult {
                    metric,
                    value: point.get(metric),
                    uncertainty: sample_std(&distribution),
                    degenerate_rounds,
                    distribution,
                },
            );
        }

        Ok(MetricReport {
            n_samples: self.predictions.len(),
            n_iterations,
            stratified: self.plan.is_stratified(),
            results,
        })
    }

    /// Metrics on the full dataset, including sparse and unlabelled samples.
    pub fn point_estimates(&self) -> MetricValues {
        MetricValues::compute(self.predictions, self.truths)
    }

    /// Runs all bootstrap rounds, in round order.
    fn run_rounds(&self) -> Result<Vec<MetricValues>, EngineError> {
        let n_iterations = self.config.n_iterations;
        let workers = self.config.workers.min(n_iterations.max(1));

        if workers <= 1 {
            return Ok(self.run_range(0, n_iterations));
        }

        let chunk = n_iterations.div_ceil(workers);
        thread::scope(|scope| {
            let handles: Vec<_> = (0..n_iterations)
                .step_by(chunk)
                .map(|start| {
                    let end = (start + chunk).min(n_iterations);
                    scope.spawn(move || self.run_range(start, end))
                })
                .collect();

            // Join every worker before reporting a panic
            let parts: Vec<_> = handles.into_iter().map(|h| h.join()).collect();

            let mut rounds = Vec::with_capacity(n_iterations);
            for part in parts {
                rounds.extend(part.map_err(|_| EngineError::WorkerPanicked)?);
            }
            Ok(rounds)
        })
    }

    /// Runs rounds `start..end` on the current thread.
    fn run_range(&self, start: usize, end: usize) -> Vec<MetricValues> {
        let mut indices = Vec::with_capacity(self.plan.draws_per_round());
        let mut predictions = Vec::with_capacity(indices.capacity());
        let mut truths = Vec::with_capacity(indices.capacity());

        (start..end)
            .map(|round| {
                let mut rng = round_rng(self.config.seed, round);
                self.plan.draw_into(&mut rng, &mut indices);

                predictions.clear();
                truths.clear();
                predictions.extend(indices.iter().map(|&i| self.predictions[i]));
                truths.extend(indices.iter().map(|&i| self.truths[i]));

                MetricValues::compute(&predictions, &truths)
            })
            .collect()
    }
}

fn check_finite(field: &'static str, values: &[f64]) -> Result<(), EngineError> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(EngineError::NonFiniteValue {
            field,
            index,
            value: values[index],
        }),
        None => Ok(()),
    }
}
