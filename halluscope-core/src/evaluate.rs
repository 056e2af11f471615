//! Response evaluation: similarity scoring and hallucination bucketing.
//!
//! The automated baseline scores each response against its positionally
//! aligned gold reference with a case-insensitive character-level sequence
//! similarity ratio, then maps the ratio onto a three-level hallucination
//! score via two fixed thresholds.

use crate::error::HarnessError;
use crate::records::{GenerationRecord, read_json_array, write_json_array};
use serde::Deserialize;
use similar::TextDiff;
use std::path::{Path, PathBuf};

/// Similarity at or above this is a factual match (score 0).
pub const STRONG_MATCH_THRESHOLD: f64 = 0.85;

/// Similarity at or above this (but below strong) is a minor mismatch
/// (score 1); anything lower is a major mismatch (score 2).
pub const WEAK_MATCH_THRESHOLD: f64 = 0.6;

/// Evaluation strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalStrategy {
    /// Score responses against gold references by string similarity.
    Similarity,
    /// Trust scores already present on the records (manual annotation).
    Manual,
}

/// Case-insensitive sequence similarity ratio in `[0, 1]`.
pub fn string_similarity(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    f64::from(TextDiff::from_chars(a.as_str(), b.as_str()).ratio())
}

/// Map a similarity ratio to a hallucination score.
///
/// 0 = factual, 1 = minor hallucination, 2 = major hallucination.
/// Ties at either boundary resolve to the higher-fidelity bucket.
pub fn assign_hallucination_score(similarity: f64) -> u8 {
    if similarity >= STRONG_MATCH_THRESHOLD {
        0
    } else if similarity >= WEAK_MATCH_THRESHOLD {
        1
    } else {
        2
    }
}

/// A gold record only needs its reference answer; records missing the field
/// score against the empty string.
#[derive(Debug, Clone, Deserialize)]
pub struct GoldRecord {
    #[serde(default)]
    pub reference_answer: String,
}

/// Score records in place.
///
/// Under `manual`, records that already carry `hallucination_score` pass
/// through untouched. Under `similarity` with gold data, each response is
/// scored against the aligned gold reference. In every remaining case the
/// record defaults to score 0, which is a stand-in, not a real evaluation.
pub fn evaluate_records(
    records: &mut [GenerationRecord],
    gold: Option<&[GoldRecord]>,
    strategy: EvalStrategy,
) -> Result<(), HarnessError> {
    if let Some(gold) = gold {
        if gold.len() != records.len() {
            return Err(HarnessError::data(format!(
                "input and gold data length mismatch: {} records vs {} gold entries",
                records.len(),
                gold.len()
            )));
        }
    }

    let mut defaulted = 0usize;
    for (i, record) in records.iter_mut().enumerate() {
        match (strategy, gold) {
            (EvalStrategy::Manual, _) if record.is_scored() => {}
            (EvalStrategy::Similarity, Some(gold)) => {
                let similarity = string_similarity(&record.response, &gold[i].reference_answer);
                let rounded = (similarity * 1000.0).round() / 1000.0;
                record.similarity_score = Some(rounded);
                record.hallucination_score = Some(assign_hallucination_score(similarity));
            }
            _ => {
                record.hallucination_score = Some(0);
                defaulted += 1;
            }
        }
    }

    if defaulted > 0 {
        tracing::warn!(
            count = defaulted,
            "no gold reference or prior annotation; defaulted hallucination_score to 0 (not a real evaluation)"
        );
    }
    Ok(())
}

/// Default output path: `<input>.json` -> `<input>_scored.json`.
pub fn derived_output_path(input: &Path) -> PathBuf {
    match input.file_stem().and_then(|s| s.to_str()) {
        Some(stem) => input.with_file_name(format!("{stem}_scored.json")),
        None => input.with_extension("scored.json"),
    }
}

/// Evaluate one generated-response file and write the annotated array.
///
/// Returns the path the evaluated records were written to.
pub async fn evaluate_file(
    input: &Path,
    gold: Option<&Path>,
    strategy: EvalStrategy,
    output: Option<&Path>,
) -> Result<PathBuf, HarnessError> {
    let mut records: Vec<GenerationRecord> = read_json_array(input).await?;

    let gold_records: Option<Vec<GoldRecord>> = match gold {
        Some(path) => Some(read_json_array(path).await?),
        None => None,
    };

    evaluate_records(&mut records, gold_records.as_deref(), strategy)?;

    let output_path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| derived_output_path(input));
    write_json_array(&output_path, &records).await?;

    tracing::info!(path = %output_path.display(), records = records.len(), "evaluated file saved");
    Ok(output_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(response: &str) -> GenerationRecord {
        GenerationRecord {
            model: "mistral:7b".into(),
            prompt_type: "zero_shot".into(),
            question: "q".into(),
            formatted_prompt: "f".into(),
            response: response.into(),
            similarity_score: None,
            hallucination_score: None,
        }
    }

    fn gold(answer: &str) -> GoldRecord {
        GoldRecord {
            reference_answer: answer.into(),
        }
    }

    #[test]
    fn test_score_buckets_and_boundaries() {
        assert_eq!(assign_hallucination_score(1.0), 0);
        assert_eq!(assign_hallucination_score(0.85), 0);
        assert_eq!(assign_hallucination_score(0.849999), 1);
        assert_eq!(assign_hallucination_score(0.6), 1);
        assert_eq!(assign_hallucination_score(0.599999), 2);
        assert_eq!(assign_hallucination_score(0.0), 2);
    }

    #[test]
    fn test_similarity_is_case_insensitive() {
        assert_eq!(string_similarity("PARIS", "paris"), 1.0);
    }

    #[test]
    fn test_near_identical_answer_scores_factual() {
        let similarity = string_similarity(
            "Paris is the capital of France.",
            "Paris is the capital of France",
        );
        assert!(similarity > 0.95, "similarity was {similarity}");
        assert_eq!(assign_hallucination_score(similarity), 0);
    }

    #[test]
    fn test_unrelated_answer_scores_major() {
        let similarity = string_similarity("The moon is made of cheese", "Paris");
        assert_eq!(assign_hallucination_score(similarity), 2);
    }

    #[test]
    fn test_similarity_with_gold_scores_records() {
        let mut records = vec![record("Paris is the capital of France.")];
        let gold = vec![gold("Paris is the capital of France")];
        evaluate_records(&mut records, Some(&gold), EvalStrategy::Similarity).unwrap();
        assert_eq!(records[0].hallucination_score, Some(0));
        let similarity = records[0].similarity_score.unwrap();
        assert!(similarity > 0.95);
        // Rounded to 3 decimals.
        assert_eq!(similarity, (similarity * 1000.0).round() / 1000.0);
    }

    #[test]
    fn test_manual_leaves_annotated_records_untouched() {
        let mut annotated = record("r");
        annotated.similarity_score = Some(0.42);
        annotated.hallucination_score = Some(2);
        let expected = annotated.clone();

        let mut records = vec![annotated];
        evaluate_records(&mut records, None, EvalStrategy::Manual).unwrap();
        assert_eq!(records[0], expected);
    }

    #[test]
    fn test_no_gold_defaults_to_factual() {
        let mut records = vec![record("anything at all")];
        evaluate_records(&mut records, None, EvalStrategy::Similarity).unwrap();
        assert_eq!(records[0].hallucination_score, Some(0));
        assert_eq!(records[0].similarity_score, None);
    }

    #[test]
    fn test_length_mismatch_is_data_error() {
        let mut records = vec![record("a"), record("b")];
        let gold = vec![gold("a")];
        let err = evaluate_records(&mut records, Some(&gold), EvalStrategy::Similarity).unwrap_err();
        assert!(matches!(err, HarnessError::Data(_)));
        // Nothing was scored before the mismatch was detected.
        assert!(records.iter().all(|r| !r.is_scored()));
    }

    #[test]
    fn test_derived_output_path() {
        assert_eq!(
            derived_output_path(Path::new("results/mistral_zero_shot.json")),
            PathBuf::from("results/mistral_zero_shot_scored.json")
        );
    }

    #[tokio::test]
    async fn test_evaluate_file_manual_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("run.json");

        let mut scored = record("Paris");
        scored.similarity_score = Some(0.98);
        scored.hallucination_score = Some(0);
        write_json_array(&input, &[scored]).await.unwrap();
        let before = tokio::fs::read_to_string(&input).await.unwrap();

        let output = dir.path().join("run_again.json");
        evaluate_file(&input, None, EvalStrategy::Manual, Some(&output))
            .await
            .unwrap();
        let after = tokio::fs::read_to_string(&output).await.unwrap();
        assert_eq!(after, before);
    }
}
