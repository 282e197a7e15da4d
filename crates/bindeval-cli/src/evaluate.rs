//! Evaluation runs: load tables, join group labels, run the engine.

use anyhow::{Context, Result};
use bindeval_core::{
    average_predictions, BootstrapEngine, EngineConfig, GroupLookup, MetricReport,
    PredictionTable,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::info;

/// Metrics for one model's prediction table.
pub struct ModelEvaluation {
    pub name: String,
    pub report: MetricReport,
}

/// Everything produced by an ensemble run.
pub struct EnsembleOutcome {
    pub models: Vec<ModelEvaluation>,
    pub ensemble: MetricReport,
    pub ensemble_table: PredictionTable,
}

/// Loads the group lookup if one was requested.
pub fn load_lookup(path: Option<&Path>) -> Result<Option<GroupLookup>> {
    path.map(|p| {
        GroupLookup::from_csv(p)
            .with_context(|| format!("Failed to load group lookup: {}", p.display()))
    })
    .transpose()
}

/// Runs the bootstrap engine on a loaded table.
pub fn evaluate_table(
    table: &PredictionTable,
    lookup: Option<&GroupLookup>,
    config: EngineConfig,
) -> Result<MetricReport> {
    let mut engine = BootstrapEngine::new(&table.predictions, &table.truths, config)?;
    if let Some(lookup) = lookup {
        engine = engine.with_groups(&table.groups(lookup))?;
    }
    Ok(engine.all_metrics()?)
}

/// Loads a prediction table from disk and evaluates it.
pub fn evaluate_file(
    path: &Path,
    lookup: Option<&GroupLookup>,
    config: EngineConfig,
) -> Result<MetricReport> {
    let table = PredictionTable::from_csv(path)
        .with_context(|| format!("Failed to load predictions: {}", path.display()))?;
    evaluate_table(&table, lookup, config)
        .with_context(|| format!("Failed to evaluate {}", path.display()))
}

/// Evaluates every model table, then the ensemble of their averaged
/// predictions.
pub fn evaluate_ensemble(
    paths: &[PathBuf],
    lookup: Option<&GroupLookup>,
    config: EngineConfig,
) -> Result<EnsembleOutcome> {
    let pb = ProgressBar::new(paths.len() as u64);
    pb.set_style(ProgressStyle::default_bar().template("{msg} [{bar:40}] {pos}/{len}")?);
    pb.set_message("Models");

    let names = model_names(paths);
    let mut tables = Vec::with_capacity(paths.len());
    let mut models = Vec::with_capacity(paths.len());

    for (path, name) in paths.iter().zip(names) {
        let table = PredictionTable::from_csv(path)
            .with_context(|| format!("Failed to load predictions: {}", path.display()))?;
        let report = evaluate_table(&table, lookup, config)
            .with_context(|| format!("Failed to evaluate {}", path.display()))?;
        info!(model = %name, rows = table.len(), "Evaluated model");

        models.push(ModelEvaluation { name, report });
        tables.push(table);
        pb.inc(1);
    }
    pb.finish_and_clear();

    let ensemble_table = average_predictions(&tables).context("Failed to build ensemble")?;
    let ensemble = evaluate_table(&ensemble_table, lookup, config)
        .context("Failed to evaluate ensemble")?;

    Ok(EnsembleOutcome {
        models,
        ensemble,
        ensemble_table,
    })
}

/// Display names for model tables.
///
/// File stems, or full paths when two stems collide.
fn model_names(paths: &[PathBuf]) -> Vec<String> {
    let stems: Vec<String> = paths
        .iter()
        .map(|p| {
            p.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| p.display().to_string())
        })
        .collect();

    let unique: HashSet<&String> = stems.iter().collect();
    if unique.len() == stems.len() {
        stems
    } else {
        paths.iter().map(|p| p.display().to_string()).collect()
    }
}
