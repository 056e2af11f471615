//! Custom dataset files (CSV or JSON supplied by the user).

use crate::error::HarnessError;
use crate::records::Sample;
use serde_json::Value;
use std::path::Path;

/// Supported custom file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomFormat {
    Csv,
    Json,
}

/// Columns a custom file must provide.
pub const REQUIRED_COLUMNS: [&str; 2] = ["question", "reference_answer"];

/// Dataset label stamped on custom samples.
const CUSTOM_LABEL: &str = "custom";

/// Load a custom dataset file and normalize it to samples.
///
/// The required columns are validated up front, before any row is converted:
/// for CSV against the header line, for JSON against the union of record
/// keys. Missing columns are a configuration error, not a data error, since
/// the user pointed the harness at an unusable file.
pub async fn load_custom(
    path: &Path,
    format: CustomFormat,
    n_samples: usize,
) -> Result<Vec<Sample>, HarnessError> {
    let content = tokio::fs::read_to_string(path).await?;
    let samples = match format {
        CustomFormat::Csv => parse_csv(&content)?,
        CustomFormat::Json => parse_json(&content)?,
    };
    tracing::info!(
        path = %path.display(),
        rows = samples.len().min(n_samples),
        "loaded custom dataset"
    );
    Ok(samples.into_iter().take(n_samples).collect())
}

fn parse_csv(content: &str) -> Result<Vec<Sample>, HarnessError> {
    let mut lines = content.lines();

    let header: Vec<String> = lines
        .next()
        .ok_or_else(|| HarnessError::config("custom CSV file is empty"))?
        .split(',')
        .map(|s| s.trim().trim_matches('"').to_string())
        .collect();

    for column in REQUIRED_COLUMNS {
        if !header.iter().any(|h| h == column) {
            return Err(HarnessError::config(format!(
                "custom file must contain 'question' and 'reference_answer' columns; missing '{column}'"
            )));
        }
    }

    let question_idx = header.iter().position(|h| h == "question").unwrap_or(0);
    let answer_idx = header
        .iter()
        .position(|h| h == "reference_answer")
        .unwrap_or(0);

    let mut samples = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<String> = line
            .split(',')
            .map(|s| s.trim().trim_matches('"').to_string())
            .collect();
        samples.push(Sample {
            dataset: CUSTOM_LABEL.to_string(),
            question: fields.get(question_idx).cloned().unwrap_or_default(),
            reference_answer: fields.get(answer_idx).cloned().unwrap_or_default(),
        });
    }
    Ok(samples)
}

fn parse_json(content: &str) -> Result<Vec<Sample>, HarnessError> {
    let value: Value = serde_json::from_str(content)
        .map_err(|e| HarnessError::data(format!("failed to parse custom JSON file: {e}")))?;
    let items = value
        .as_array()
        .ok_or_else(|| HarnessError::data("custom JSON file must be an array of objects"))?;

    for column in REQUIRED_COLUMNS {
        if !items.iter().any(|item| item.get(column).is_some()) {
            return Err(HarnessError::config(format!(
                "custom file must contain 'question' and 'reference_answer' columns; missing '{column}'"
            )));
        }
    }

    Ok(items
        .iter()
        .map(|item| Sample {
            dataset: CUSTOM_LABEL.to_string(),
            question: field_as_string(item, "question"),
            reference_answer: field_as_string(item, "reference_answer"),
        })
        .collect())
}

fn field_as_string(item: &Value, key: &str) -> String {
    match item.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
