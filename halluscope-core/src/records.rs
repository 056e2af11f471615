//! Record types flowing between pipeline stages, plus the JSON array file
//! format they travel in.
//!
//! Stages compose only through files on disk: the loader writes `Sample`
//! arrays, the generator writes `GenerationRecord` arrays, and the evaluator
//! augments those records in place with scores. Array order is preserved
//! end-to-end within each stage.

use crate::error::HarnessError;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::path::Path;

/// One normalized dataset item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub dataset: String,
    pub question: String,
    pub reference_answer: String,
}

/// One model response for one sample under one prompt template.
///
/// The two score fields stay absent until the evaluator fills them, so a
/// generated file and its evaluated counterpart share this one type. A record
/// that already carries `hallucination_score` round-trips unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub model: String,
    pub prompt_type: String,
    pub question: String,
    pub formatted_prompt: String,
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hallucination_score: Option<u8>,
}

impl GenerationRecord {
    /// A record counts as hallucinated when its score is 1 or 2.
    /// Unscored records count as not hallucinated.
    pub fn is_hallucinated(&self) -> bool {
        self.hallucination_score.is_some_and(|s| s >= 1)
    }

    pub fn is_scored(&self) -> bool {
        self.hallucination_score.is_some()
    }
}

/// Read a JSON array file into typed records.
///
/// A file that cannot be parsed as the expected array is a data error, and
/// the message names the offending path.
pub async fn read_json_array<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, HarnessError> {
    let content = tokio::fs::read_to_string(path).await?;
    serde_json::from_str(&content).map_err(|e| {
        HarnessError::data(format!("failed to parse JSON array {}: {e}", path.display()))
    })
}

/// Write records as a 2-space-indented JSON array (the on-disk convention
/// shared by every stage).
pub async fn write_json_array<T: Serialize>(path: &Path, items: &[T]) -> Result<(), HarnessError> {
    let json = serde_json::to_string_pretty(items)?;
    tokio::fs::write(path, json).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_score_fields_absent_until_evaluated() {
        let record = GenerationRecord {
            model: "mistral:7b".into(),
            prompt_type: "zero_shot".into(),
            question: "What is the capital of France?".into(),
            formatted_prompt: "Q: What is the capital of France?\nA:".into(),
            response: "Paris".into(),
            similarity_score: None,
            hallucination_score: None,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("similarity_score"));
        assert!(!json.contains("hallucination_score"));
    }

    #[test]
    fn test_scored_record_roundtrip() {
        let record = GenerationRecord {
            model: "mistral:7b".into(),
            prompt_type: "zero_shot".into(),
            question: "q".into(),
            formatted_prompt: "p".into(),
            response: "r".into(),
            similarity_score: Some(0.913),
            hallucination_score: Some(1),
        };
        let json = serde_json::to_string_pretty(&record).unwrap();
        let parsed: GenerationRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
        // Re-serializing an already-scored record is byte-identical.
        assert_eq!(serde_json::to_string_pretty(&parsed).unwrap(), json);
    }

    #[test]
    fn test_is_hallucinated() {
        let mut record = GenerationRecord {
            model: "m".into(),
            prompt_type: "p".into(),
            question: "q".into(),
            formatted_prompt: "f".into(),
            response: "r".into(),
            similarity_score: None,
            hallucination_score: None,
        };
        assert!(!record.is_hallucinated());
        record.hallucination_score = Some(0);
        assert!(!record.is_hallucinated());
        record.hallucination_score = Some(1);
        assert!(record.is_hallucinated());
        record.hallucination_score = Some(2);
        assert!(record.is_hallucinated());
    }

    #[tokio::test]
    async fn test_json_array_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("samples.json");
        let samples = vec![Sample {
            dataset: "TruthfulQA".into(),
            question: "q".into(),
            reference_answer: "a".into(),
        }];
        write_json_array(&path, &samples).await.unwrap();
        let parsed: Vec<Sample> = read_json_array(&path).await.unwrap();
        assert_eq!(parsed, samples);
    }

    #[tokio::test]
    async fn test_read_json_array_rejects_malformed_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        tokio::fs::write(&path, "{not json").await.unwrap();
        let err = read_json_array::<Sample>(&path).await.unwrap_err();
        assert!(matches!(err, HarnessError::Data(_)));
    }
}
