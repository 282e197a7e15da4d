//! Output formatting for metric reports.
//!
//! Supports human-readable terminal output, JSON for scripting, and the
//! plain-text log written by ensemble runs.

use crate::evaluate::EnsembleOutcome;
use anyhow::Result;
use bindeval_core::config::OUTPUT_PRECISION;
use bindeval_core::{Metric, MetricReport, MetricResult};
use serde::Serialize;
use std::path::Path;

/// Width of the `=` rule under the log title
const RULE_WIDTH: usize = 60;

/// Width of the metric label column
const LABEL_WIDTH: usize = 9;

/// JSON output structure for a metric report
#[derive(Serialize)]
pub struct JsonReport {
    pub n_samples: usize,
    pub n_iterations: usize,
    pub stratified: bool,
    pub metrics: Vec<JsonMetric>,
}

/// One metric in JSON format. Undefined values serialize as `null`.
#[derive(Serialize)]
pub struct JsonMetric {
    pub metric: Metric,
    pub value: Option<f64>,
    pub uncertainty: f64,
    pub n_bootstrap: usize,
    pub degenerate_rounds: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<JsonInterval>,
}

#[derive(Serialize)]
pub struct JsonInterval {
    pub confidence: f64,
    pub lower: f64,
    pub upper: f64,
}

impl JsonMetric {
    fn new(result: &MetricResult, confidence: Option<f64>) -> Self {
        Self {
            metric: result.metric,
            value: result.value.is_finite().then_some(result.value),
            uncertainty: result.uncertainty,
            n_bootstrap: result.n_bootstrap(),
            degenerate_rounds: result.degenerate_rounds,
            interval: confidence
                .and_then(|c| result.percentile_interval(c))
                .map(|ci| JsonInterval {
                    confidence: ci.confidence,
                    lower: ci.lower,
                    upper: ci.upper,
                }),
        }
    }
}

/// Formats a report as JSON.
pub fn format_json(report: &MetricReport, confidence: Option<f64>) -> Result<String> {
    let output = JsonReport {
        n_samples: report.n_samples,
        n_iterations: report.n_iterations,
        stratified: report.stratified,
        metrics: report
            .iter()
            .map(|r| JsonMetric::new(r, confidence))
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Formats a report as one `- NAME value ± uncertainty` line per metric,
/// with the metric name upper-cased (`- C_INDEX   ...`).
pub fn format_human(report: &MetricReport, confidence: Option<f64>) -> String {
    report
        .iter()
        .map(|result| format_line(result, confidence))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_line(result: &MetricResult, confidence: Option<f64>) -> String {
    let mut line = format!(
        "- {:<width$} {:.prec$} ± {:.prec$}",
        result.metric.name().to_uppercase(),
        result.value,
        result.uncertainty,
        width = LABEL_WIDTH,
        prec = OUTPUT_PRECISION
    );
    if let Some(ci) = confidence.and_then(|c| result.percentile_interval(c)) {
        line.push_str(&format!(
            "  {:.0}% CI {}",
            ci.confidence * 100.0,
            ci.format(OUTPUT_PRECISION)
        ));
    }
    line
}

/// Run details written at the top of an ensemble log.
pub struct LogHeader {
    pub command: String,
    pub weighted: bool,
    pub group_lookup: Option<String>,
    /// Directory the model tables were read from
    pub source_dir: String,
}

/// Formats the log written by an ensemble run.
pub fn format_log(header: &LogHeader, outcome: &EnsembleOutcome, ensemble_path: &Path) -> String {
    let kind = if header.weighted {
        "WEIGHTED"
    } else {
        "UNWEIGHTED"
    };

    let mut output = String::new();
    output.push_str(&format!("Command: {}\n", header.command));
    output.push_str(&format!("Metrics type: {}\n", kind));
    if let Some(lookup) = &header.group_lookup {
        output.push_str(&format!("Group lookup file: {}\n", lookup));
    }
    output.push('\n');

    output.push_str(&format!("Metrics for models in {}\n", header.source_dir));
    output.push_str(&"=".repeat(RULE_WIDTH));
    output.push_str("\n\n");

    for model in &outcome.models {
        output.push_str(&format!("{}:\n", model.name));
        output.push_str(&format_human(&model.report, None));
        output.push_str("\n\n");
    }

    output.push_str(&format!("Ensemble ({} models):\n", outcome.models.len()));
    output.push_str(&format_human(&outcome.ensemble, None));
    output.push_str("\n\n");

    output.push_str(&format!(
        "Ensemble predictions saved to: {}\n",
        ensemble_path.display()
    ));
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluate::ModelEvaluation;
    use bindeval_core::{BootstrapEngine, EngineConfig, PredictionTable};

    fn report(iterations: usize) -> MetricReport {
        let t: Vec<f64> = (0..15).map(|i| 5.0 + i as f64 * 0.3).collect();
        let p: Vec<f64> = t
            .iter()
            .enumerate()
            .map(|(i, x)| x + (i as f64).cos() * 0.2)
            .collect();
        BootstrapEngine::new(&p, &t, EngineConfig::default().with_iterations(iterations))
            .unwrap()
            .all_metrics()
            .unwrap()
    }

    #[test]
    fn test_human_lines_in_metric_order() {
        let text = format_human(&report(20), None);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("- RMSE      "));
        assert!(lines[1].starts_with("- PEARSON   "));
        assert!(lines[4].starts_with("- C_INDEX   "));
        assert!(lines.iter().all(|l| l.contains(" ± ")));

        // Seven decimals on both sides
        let value = lines[1].split_whitespace().nth(2).unwrap();
        assert_eq!(value.split('.').nth(1).unwrap().len(), 7);
    }

    #[test]
    fn test_human_interval() {
        let text = format_human(&report(50), Some(0.95));
        assert!(text.lines().all(|l| l.contains("95% CI [")));

        // No bootstrap values, no interval
        let text = format_human(&report(0), Some(0.95));
        assert!(!text.contains("CI"));
    }

    #[test]
    fn test_json_nan_is_null() {
        let t = vec![7.0; 10];
        let p: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let report = BootstrapEngine::new(&p, &t, EngineConfig::default().with_iterations(5))
            .unwrap()
            .all_metrics()
            .unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&format_json(&report, None).unwrap()).unwrap();
        let metrics = json["metrics"].as_array().unwrap();
        assert_eq!(metrics.len(), 5);
        assert_eq!(metrics[0]["metric"], "rmse");
        assert!(metrics[0]["value"].is_number());
        assert!(metrics[1]["value"].is_null());
        assert_eq!(metrics[1]["degenerate_rounds"], 5);
        assert!(metrics[0].get("interval").is_none());
    }

    #[test]
    fn test_log_layout() {
        let outcome = EnsembleOutcome {
            models: vec![
                ModelEvaluation {
                    name: "model1".to_string(),
                    report: report(10),
                },
                ModelEvaluation {
                    name: "model2".to_string(),
                    report: report(10),
                },
            ],
            ensemble: report(10),
            ensemble_table: PredictionTable::default(),
        };
        let header = LogHeader {
            command: "bindeval ensemble a.csv b.csv -g groups.csv".to_string(),
            weighted: true,
            group_lookup: Some("groups.csv".to_string()),
            source_dir: "runs".to_string(),
        };
        let log = format_log(&header, &outcome, Path::new("out/ensemble.csv"));
        let lines: Vec<&str> = log.lines().collect();

        assert_eq!(lines[0], "Command: bindeval ensemble a.csv b.csv -g groups.csv");
        assert_eq!(lines[1], "Metrics type: WEIGHTED");
        assert_eq!(lines[2], "Group lookup file: groups.csv");
        assert_eq!(lines[3], "");
        assert_eq!(lines[4], "Metrics for models in runs");
        assert_eq!(lines[5], "=".repeat(60));
        assert!(log.contains("- PEARSON   "));
        assert!(log.contains("model1:\n- RMSE"));
        assert!(log.contains("Ensemble (2 models):\n"));
        assert_eq!(
            lines.last().copied(),
            Some("Ensemble predictions saved to: out/ensemble.csv")
        );
    }

    #[test]
    fn test_unweighted_log_has_no_lookup_line() {
        let outcome = EnsembleOutcome {
            models: Vec::new(),
            ensemble: report(0),
            ensemble_table: PredictionTable::default(),
        };
        let header = LogHeader {
            command: "bindeval ensemble a.csv".to_string(),
            weighted: false,
            group_lookup: None,
            source_dir: ".".to_string(),
        };
        let log = format_log(&header, &outcome, Path::new("ensemble.csv"));
        assert!(log.contains("Metrics type: UNWEIGHTED\n\n"));
        assert!(!log.contains("Group lookup file"));
    }
}
