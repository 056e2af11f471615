//! Catalog dataset adapters over the Hugging Face datasets-server rows API.
//!
//! Each adapter declares, per output field, an ordered list of accepted
//! source fields resolved deterministically: the first alias present in a row
//! wins, and a row carrying none of them falls back to the adapter's default.
//! Aliases may be dotted paths into nested objects (`qa_pair.question`).

use crate::error::HarnessError;
use crate::records::Sample;
use serde_json::Value;

const DATASETS_SERVER_URL: &str = "https://datasets-server.huggingface.co";

/// Normalization rules for one benchmark dataset.
#[derive(Debug)]
pub struct CatalogAdapter {
    /// Label stamped into each sample's `dataset` field.
    pub label: &'static str,
    /// Dataset id on the Hub.
    pub hub_id: &'static str,
    /// Hub config name.
    pub hub_config: &'static str,
    /// Accepted source fields for the question, in priority order.
    pub question_aliases: &'static [&'static str],
    pub question_default: &'static str,
    /// Cap the question at this many characters (for pseudo-questions built
    /// from long source text).
    pub question_truncate: Option<usize>,
    /// Accepted source fields for the reference answer, in priority order.
    pub answer_aliases: &'static [&'static str],
    pub answer_default: &'static str,
}

pub static TRUTHFULQA: CatalogAdapter = CatalogAdapter {
    label: "TruthfulQA",
    hub_id: "truthful_qa",
    hub_config: "generation",
    question_aliases: &["question"],
    question_default: "",
    question_truncate: None,
    answer_aliases: &["best_answer"],
    answer_default: "",
};

pub static QAFACTEVAL: CatalogAdapter = CatalogAdapter {
    label: "QAFactEval",
    hub_id: "QAFactEval",
    hub_config: "default",
    question_aliases: &["qa_pair.question"],
    question_default: "",
    question_truncate: None,
    answer_aliases: &["qa_pair.answer"],
    answer_default: "",
};

pub static HALLUCINATION_EVAL: CatalogAdapter = CatalogAdapter {
    label: "HallucinationEval",
    hub_id: "hallucination_eval",
    hub_config: "default",
    question_aliases: &["question"],
    question_default: "N/A",
    question_truncate: None,
    answer_aliases: &["reference_answer", "gold_answer"],
    answer_default: "",
};

pub static COHS: CatalogAdapter = CatalogAdapter {
    label: "CohS",
    hub_id: "cais/multi-fact-summ-cohs",
    hub_config: "default",
    // The source text stands in as a pseudo-question.
    question_aliases: &["source"],
    question_default: "",
    question_truncate: Some(300),
    answer_aliases: &["summary"],
    answer_default: "",
};

impl CatalogAdapter {
    /// Fetch up to `n_samples` rows and normalize them.
    ///
    /// The sample count clamps to what the dataset actually has; an
    /// over-request never fails.
    pub async fn load(&self, split: &str, n_samples: usize) -> Result<Vec<Sample>, HarnessError> {
        let rows = fetch_rows(self.hub_id, self.hub_config, split, n_samples).await?;
        tracing::info!(
            dataset = self.label,
            split,
            rows = rows.len(),
            "fetched catalog dataset"
        );
        Ok(rows
            .iter()
            .take(n_samples)
            .map(|row| self.normalize(row))
            .collect())
    }

    /// Normalize one source row into a `Sample`.
    pub fn normalize(&self, row: &Value) -> Sample {
        let mut question =
            resolve_field(row, self.question_aliases).unwrap_or_else(|| self.question_default.to_string());
        if let Some(max) = self.question_truncate {
            question = question.chars().take(max).collect();
        }
        let reference_answer =
            resolve_field(row, self.answer_aliases).unwrap_or_else(|| self.answer_default.to_string());
        Sample {
            dataset: self.label.to_string(),
            question,
            reference_answer,
        }
    }
}

/// Resolve the first alias present in the row, as a string.
fn resolve_field(row: &Value, aliases: &[&str]) -> Option<String> {
    aliases.iter().find_map(|alias| {
        let value = lookup_path(row, alias)?;
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    })
}

/// Follow a dotted path into nested objects.
fn lookup_path<'a>(row: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(row, |value, key| value.get(key))
}

/// Fetch rows from the datasets-server rows endpoint.
///
/// The endpoint returns `{ "rows": [ { "row": {...} }, ... ], ... }`.
async fn fetch_rows(
    hub_id: &str,
    hub_config: &str,
    split: &str,
    limit: usize,
) -> Result<Vec<Value>, HarnessError> {
    let url = format!(
        "{DATASETS_SERVER_URL}/rows?dataset={hub_id}&config={hub_config}&split={split}&offset=0&length={limit}"
    );

    let client = reqwest::Client::new();
    let response = client.get(&url).send().await?;
    if !response.status().is_success() {
        return Err(HarnessError::service(format!(
            "datasets server returned status {} for {hub_id}/{split}",
            response.status()
        )));
    }

    let body: Value = response.json().await?;
    let rows = body
        .get("rows")
        .and_then(|v| v.as_array())
        .ok_or_else(|| HarnessError::service("unexpected datasets server response format"))?;

    Ok(rows
        .iter()
        .filter_map(|entry| entry.get("row").cloned())
        .collect())
}
