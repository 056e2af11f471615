//! Attribution analysis: Hallucination Rate, Prompt Sensitivity, Model
//! Variability.
//!
//! Reads every evaluated file in the results directory, concatenates the
//! records into one table, and aggregates by key. Ordering across input
//! files is irrelevant since everything is re-grouped; files are read in
//! lexicographic name order purely to keep ingestion deterministic.

use crate::error::HarnessError;
use crate::records::GenerationRecord;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Hallucination rate for one (model, prompt_type) group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateRow {
    pub model: String,
    pub prompt_type: String,
    pub hallucination_rate: f64,
}

/// Prompt Sensitivity: std deviation of a model's rate across prompt types.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PsRow {
    pub model: String,
    /// `None` when the model has a single prompt type (undefined, not zero).
    pub ps_score: Option<f64>,
}

/// Model Variability: std deviation of a prompt type's rate across models.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MvRow {
    pub prompt_type: String,
    pub mv_score: Option<f64>,
}

/// The full attribution result set.
#[derive(Debug, Clone, Serialize)]
pub struct AttributionReport {
    pub rates: Vec<RateRow>,
    pub prompt_sensitivity: Vec<PsRow>,
    pub model_variability: Vec<MvRow>,
}

/// Read every `*.json` file in the results directory, in lexicographic
/// filename order, and concatenate their records.
pub async fn load_results(results_dir: &Path) -> Result<Vec<GenerationRecord>, HarnessError> {
    let mut paths = Vec::new();
    let mut entries = tokio::fs::read_dir(results_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut records = Vec::new();
    for path in &paths {
        let mut batch: Vec<GenerationRecord> = crate::records::read_json_array(path).await?;
        records.append(&mut batch);
    }
    tracing::info!(
        files = paths.len(),
        records = records.len(),
        dir = %results_dir.display(),
        "loaded evaluated results"
    );
    Ok(records)
}

/// Sample (n-1) standard deviation. A single observation has no spread to
/// estimate, so groups of size 1 yield `None`.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(variance.sqrt())
}

/// Compute HR, PS, and MV over a concatenated record table.
///
/// Fails when no record carries a hallucination score, meaning the evaluator
/// never ran. Records left unscored alongside scored ones count as not
/// hallucinated.
pub fn analyze(records: &[GenerationRecord]) -> Result<AttributionReport, HarnessError> {
    if !records.iter().any(|r| r.is_scored()) {
        return Err(HarnessError::data(
            "missing 'hallucination_score' in input files; evaluate before attribution analysis",
        ));
    }

    // HR per (model, prompt_type): mean of the is-hallucinated boolean.
    let mut groups: BTreeMap<(String, String), (usize, usize)> = BTreeMap::new();
    for record in records {
        let entry = groups
            .entry((record.model.clone(), record.prompt_type.clone()))
            .or_insert((0, 0));
        entry.0 += usize::from(record.is_hallucinated());
        entry.1 += 1;
    }
    let rates: Vec<RateRow> = groups
        .into_iter()
        .map(|((model, prompt_type), (hallucinated, total))| RateRow {
            model,
            prompt_type,
            hallucination_rate: hallucinated as f64 / total as f64,
        })
        .collect();

    // PS: spread of each model's rate across prompt types.
    let mut by_model: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for row in &rates {
        by_model
            .entry(row.model.clone())
            .or_default()
            .push(row.hallucination_rate);
    }
    let prompt_sensitivity = by_model
        .into_iter()
        .map(|(model, rates)| PsRow {
            model,
            ps_score: sample_std_dev(&rates),
        })
        .collect();

    // MV: spread of each prompt type's rate across models.
    let mut by_prompt: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for row in &rates {
        by_prompt
            .entry(row.prompt_type.clone())
            .or_default()
            .push(row.hallucination_rate);
    }
    let model_variability = by_prompt
        .into_iter()
        .map(|(prompt_type, rates)| MvRow {
            prompt_type,
            mv_score: sample_std_dev(&rates),
        })
        .collect();

    Ok(AttributionReport {
        rates,
        prompt_sensitivity,
        model_variability,
    })
}

/// Render the metrics table: HR rows joined with PS on `model`.
///
/// MV is deliberately absent from the CSV; it only appears in the charts.
/// Undefined PS values serialize as an empty field.
pub fn metrics_csv(report: &AttributionReport) -> String {
    let mut out = String::from("model,prompt_type,hallucination_rate,PS_score\n");
    for row in &report.rates {
        let ps = report
            .prompt_sensitivity
            .iter()
            .find(|p| p.model == row.model)
            .and_then(|p| p.ps_score);
        let ps_field = ps.map(|v| v.to_string()).unwrap_or_default();
        out.push_str(&format!(
            "{},{},{},{ps_field}\n",
            row.model, row.prompt_type, row.hallucination_rate
        ));
    }
    out
}

/// Write the metrics CSV to disk.
pub async fn write_metrics_csv(
    report: &AttributionReport,
    path: &Path,
) -> Result<(), HarnessError> {
    tokio::fs::write(path, metrics_csv(report)).await?;
    tracing::info!(path = %path.display(), "saved attribution metrics");
    Ok(())
}
