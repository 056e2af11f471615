//! Completion client for OpenAI-compatible endpoints.
//!
//! Supports OpenAI, vLLM, Ollama, LM Studio, and any endpoint following the
//! OpenAI completions API format. The generator issues one request per
//! sample, sequentially; a failed request propagates and aborts the run.
//! No retries, no batching.

use crate::config::InferenceConfig;
use crate::error::HarnessError;
use crate::generate::SamplingParams;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::debug;

/// Seam between the generator and the model service.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Model identifier reported in generation records.
    fn model(&self) -> &str;

    /// Request one completion for a fully formatted prompt.
    async fn complete(&self, prompt: &str, params: &SamplingParams) -> Result<String, HarnessError>;
}

/// Client for OpenAI-compatible completions endpoints.
#[derive(Debug)]
pub struct OpenAiCompatibleClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiCompatibleClient {
    /// Create a client from configuration.
    ///
    /// The API key comes from the config, then the configured environment
    /// variable. Local endpoints (Ollama, vLLM, LM Studio) don't require a
    /// key and get a dummy bearer token instead of failing.
    pub fn new(config: &InferenceConfig, model: &str) -> Result<Self, HarnessError> {
        let is_local =
            config.base_url.contains("localhost") || config.base_url.contains("127.0.0.1");

        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var(&config.api_key_env).ok())
            .or_else(|| {
                if is_local {
                    debug!("no API key set for local endpoint; using dummy bearer token");
                    Some("local".to_string())
                } else {
                    None
                }
            })
            .ok_or_else(|| {
                HarnessError::config(format!(
                    "inference API key not found: env var '{}' not set",
                    config.api_key_env
                ))
            })?;

        Ok(Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompatibleClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str, params: &SamplingParams) -> Result<String, HarnessError> {
        let body = json!({
            "model": self.model,
            "prompt": prompt,
            "max_tokens": params.max_tokens,
            "temperature": params.temperature,
            "top_p": params.top_p,
        });

        let response = self
            .client
            .post(format!("{}/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(HarnessError::service(format!(
                "completion endpoint returned status {status} for model '{}'",
                self.model
            )));
        }

        let value: Value = response.json().await?;
        let text = value
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|choice| choice.get("text"))
            .and_then(|t| t.as_str())
            .ok_or_else(|| {
                HarnessError::service("completion response missing choices[0].text")
            })?;

        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> InferenceConfig {
        InferenceConfig {
            base_url: base_url.to_string(),
            api_key_env: "HALLUSCOPE_TEST_NO_SUCH_KEY".to_string(),
            api_key: None,
        }
    }

    #[test]
    fn test_local_endpoint_needs_no_key() {
        let client = OpenAiCompatibleClient::new(&config("http://localhost:11434/v1"), "mistral:7b")
            .unwrap();
        assert_eq!(client.model(), "mistral:7b");
    }

    #[test]
    fn test_remote_endpoint_without_key_is_config_error() {
        let err =
            OpenAiCompatibleClient::new(&config("https://api.openai.com/v1"), "gpt-4o").unwrap_err();
        assert!(matches!(err, HarnessError::Config(_)));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let client =
            OpenAiCompatibleClient::new(&config("http://localhost:8000/v1/"), "m").unwrap();
        assert_eq!(client.base_url, "http://localhost:8000/v1");
    }

    #[test]
    fn test_explicit_key_wins() {
        let mut cfg = config("https://api.openai.com/v1");
        cfg.api_key = Some("sk-test".to_string());
        let client = OpenAiCompatibleClient::new(&cfg, "gpt-4o").unwrap();
        assert_eq!(client.api_key, "sk-test");
    }
}
