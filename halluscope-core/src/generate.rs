//! Response generation: one completion per sample, strictly sequential.

use crate::error::HarnessError;
use crate::inference::CompletionClient;
use crate::prompt::PromptTemplate;
use crate::records::{GenerationRecord, Sample};

/// Sampling parameters sent with every completion request.
///
/// Temperature and top-p are fixed across the experiment so that prompt type
/// and model are the only variables; only the token budget is caller-chosen.
#[derive(Debug, Clone)]
pub struct SamplingParams {
    pub temperature: f64,
    pub top_p: f64,
    pub max_tokens: u32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.9,
            max_tokens: 256,
        }
    }
}

impl SamplingParams {
    pub fn with_max_tokens(max_tokens: u32) -> Self {
        Self {
            max_tokens,
            ..Self::default()
        }
    }
}

/// Default output file name: `<model>_<prompt_type>.json`, with path
/// separators in the model id flattened to underscores.
pub fn default_output_name(model: &str, prompt_type: &str) -> String {
    format!("{}_{prompt_type}.json", model.replace('/', "_"))
}

/// Generate one response per sample.
///
/// Requests are issued and awaited one at a time; a failed call propagates
/// and aborts the whole run. Output order matches sample order.
pub async fn generate_responses(
    client: &dyn CompletionClient,
    samples: &[Sample],
    template: &PromptTemplate,
    prompt_type: &str,
    params: &SamplingParams,
) -> Result<Vec<GenerationRecord>, HarnessError> {
    let mut records = Vec::with_capacity(samples.len());
    for (i, sample) in samples.iter().enumerate() {
        let formatted_prompt = template.render(&sample.question);
        let response = client.complete(&formatted_prompt, params).await?;
        tracing::debug!(
            index = i + 1,
            total = samples.len(),
            model = client.model(),
            "generated response"
        );
        records.push(GenerationRecord {
            model: client.model().to_string(),
            prompt_type: prompt_type.to_string(),
            question: sample.question.clone(),
            formatted_prompt,
            response: response.trim().to_string(),
            similarity_score: None,
            hallucination_score: None,
        });
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct EchoClient {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CompletionClient for EchoClient {
        fn model(&self) -> &str {
            "echo-model"
        }

        async fn complete(
            &self,
            prompt: &str,
            _params: &SamplingParams,
        ) -> Result<String, HarnessError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("  echo: {prompt}  "))
        }
    }

    struct FailingClient;

    #[async_trait]
    impl CompletionClient for FailingClient {
        fn model(&self) -> &str {
            "broken"
        }

        async fn complete(
            &self,
            _prompt: &str,
            _params: &SamplingParams,
        ) -> Result<String, HarnessError> {
            Err(HarnessError::service("connection refused"))
        }
    }

    fn samples(n: usize) -> Vec<Sample> {
        (0..n)
            .map(|i| Sample {
                dataset: "TruthfulQA".into(),
                question: format!("question {i}"),
                reference_answer: format!("answer {i}"),
            })
            .collect()
    }

    #[test]
    fn test_default_sampling_params() {
        let params = SamplingParams::default();
        assert_eq!(params.temperature, 0.7);
        assert_eq!(params.top_p, 0.9);
        assert_eq!(params.max_tokens, 256);
    }

    #[test]
    fn test_default_output_name_flattens_model_path() {
        assert_eq!(
            default_output_name("mistralai/Mistral-7B-Instruct-v0.1", "zero_shot"),
            "mistralai_Mistral-7B-Instruct-v0.1_zero_shot.json"
        );
    }

    #[tokio::test]
    async fn test_one_record_per_sample_in_order() {
        let client = EchoClient {
            calls: AtomicUsize::new(0),
        };
        let template = PromptTemplate::new("Q: {question}");
        let records = generate_responses(
            &client,
            &samples(3),
            &template,
            "zero_shot",
            &SamplingParams::default(),
        )
        .await
        .unwrap();

        assert_eq!(client.calls.load(Ordering::SeqCst), 3);
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].question, "question 1");
        assert_eq!(records[1].formatted_prompt, "Q: question 1");
        // Responses are whitespace-trimmed.
        assert_eq!(records[1].response, "echo: Q: question 1");
        assert_eq!(records[1].model, "echo-model");
        assert_eq!(records[1].prompt_type, "zero_shot");
        assert!(records[1].hallucination_score.is_none());
    }

    #[tokio::test]
    async fn test_failed_call_aborts_run() {
        let template = PromptTemplate::new("{question}");
        let err = generate_responses(
            &FailingClient,
            &samples(2),
            &template,
            "zero_shot",
            &SamplingParams::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, HarnessError::Service(_)));
    }
}
