//! Error types for the halluscope-core crate.

use thiserror::Error;

/// Top-level error type for harness operations.
///
/// The first three variants are the harness's own failure kinds; the rest
/// wrap failures from collaborators (filesystem, JSON codec, HTTP transport).
/// No variant is ever caught and retried internally; every stage propagates
/// and lets the process exit non-zero.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Data error: {0}")]
    Data(String),

    #[error("External service error: {0}")]
    Service(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl HarnessError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data(msg.into())
    }

    pub fn service(msg: impl Into<String>) -> Self {
        Self::Service(msg.into())
    }
}
