//! Prompt template loading and substitution.

use crate::error::HarnessError;
use std::path::Path;

/// Placeholder token replaced with the sample's question text.
pub const QUESTION_PLACEHOLDER: &str = "{question}";

/// A plain-text prompt template containing a `{question}` placeholder.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    text: String,
}

impl PromptTemplate {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Load a template from `<prompt_dir>/<prompt_type>.txt`.
    pub async fn load(prompt_dir: &Path, prompt_type: &str) -> Result<Self, HarnessError> {
        let path = prompt_dir.join(format!("{prompt_type}.txt"));
        let text = tokio::fs::read_to_string(&path).await.map_err(|e| {
            HarnessError::config(format!(
                "failed to read prompt template {}: {e}",
                path.display()
            ))
        })?;
        Ok(Self { text })
    }

    /// Substitute the question into the template.
    ///
    /// Literal text replacement, no escaping: a question that itself contains
    /// the placeholder token corrupts the template. Known edge case.
    pub fn render(&self, question: &str) -> String {
        self.text.replace(QUESTION_PLACEHOLDER, question)
    }
}
