//! Harness configuration.
//!
//! Uses `figment` for layered configuration: struct defaults -> optional
//! `halluscope.toml` -> `HALLUSCOPE_`-prefixed environment variables.
//! Configuration is passed explicitly into each stage at invocation time;
//! output directories are created at the start of the stage that writes to
//! them, never at startup.

use crate::error::HarnessError;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name, searched in the working directory.
pub const CONFIG_FILE_NAME: &str = "halluscope.toml";

/// Top-level harness configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// On-disk layout shared by the pipeline stages.
    #[serde(default)]
    pub paths: PathsConfig,
    /// Completion endpoint settings for the generator.
    #[serde(default)]
    pub inference: InferenceConfig,
}

/// Directory and file-name conventions the stages compose through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Where the dataset loader writes normalized sample files.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Where prompt templates (`<prompt_type>.txt`) live.
    #[serde(default = "default_prompt_dir")]
    pub prompt_dir: PathBuf,
    /// Where generated and evaluated record files live.
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
    /// Where the analyzer writes chart images.
    #[serde(default = "default_plot_dir")]
    pub plot_dir: PathBuf,
    /// Metrics CSV file name, written under `results_dir`.
    #[serde(default = "default_metrics_file")]
    pub metrics_file: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            prompt_dir: default_prompt_dir(),
            results_dir: default_results_dir(),
            plot_dir: default_plot_dir(),
            metrics_file: default_metrics_file(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_prompt_dir() -> PathBuf {
    PathBuf::from("prompts")
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("results")
}

fn default_plot_dir() -> PathBuf {
    PathBuf::from("results/plots")
}

fn default_metrics_file() -> String {
    "attribution_metrics.csv".to_string()
}

impl PathsConfig {
    /// Full path of the metrics CSV.
    pub fn metrics_path(&self) -> PathBuf {
        self.results_dir.join(&self.metrics_file)
    }
}

/// Completion endpoint configuration.
///
/// Any OpenAI-compatible completions server works: OpenAI, vLLM, Ollama,
/// LM Studio. The default points at a local Ollama instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Base URL of the completions API (up to and including `/v1`).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Explicit API key; takes priority over the environment variable.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            api_key: None,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:11434/v1".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

/// Load the harness configuration.
///
/// An explicitly given config file must exist; the default `halluscope.toml`
/// is merged only when present.
pub fn load_config(config_file: Option<&Path>) -> Result<HarnessConfig, HarnessError> {
    let mut figment = Figment::from(Serialized::defaults(HarnessConfig::default()));

    match config_file {
        Some(path) => {
            if !path.exists() {
                return Err(HarnessError::config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            figment = figment.merge(Toml::file(path));
        }
        None => {
            figment = figment.merge(Toml::file(CONFIG_FILE_NAME));
        }
    }

    figment = figment.merge(Env::prefixed("HALLUSCOPE_").split("__"));

    figment
        .extract()
        .map_err(|e| HarnessError::config(e.to_string()))
}
