//! Halluscope CLI — batch stages for the hallucination measurement pipeline.
//!
//! One subcommand per stage; stages compose only through files on disk.

mod commands;

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Halluscope: measure LLM hallucination behavior across prompts and models
#[derive(Parser, Debug)]
#[command(name = "halluscope", version, about, long_about = None)]
struct Cli {
    /// Configuration file path (defaults to ./halluscope.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Load a benchmark or custom dataset and normalize it for generation
    Load {
        /// Dataset to load
        #[arg(long, value_enum)]
        dataset: DatasetArg,
        /// Dataset split (if available)
        #[arg(long, default_value = "test")]
        split: String,
        /// Number of samples to load
        #[arg(long, default_value_t = 100)]
        n_samples: usize,
        /// Path to custom dataset file
        #[arg(long)]
        custom_path: Option<PathBuf>,
        /// Custom file format
        #[arg(long, value_enum)]
        custom_format: Option<FormatArg>,
    },
    /// Generate model responses for a normalized dataset
    Generate {
        /// Model identifier (e.g. mistral:7b or mistralai/Mistral-7B-Instruct-v0.1)
        #[arg(long)]
        model: String,
        /// Normalized dataset file name under the data directory
        #[arg(long)]
        dataset: String,
        /// Prompt type name (matches a .txt file in the prompt directory)
        #[arg(long)]
        prompt_type: String,
        /// Max generation tokens
        #[arg(long, default_value_t = 256)]
        max_tokens: u32,
        /// Custom output file path (optional)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Evaluate hallucinations in generated responses
    Evaluate {
        /// Path to a generated-response JSON file
        #[arg(long)]
        input: PathBuf,
        /// Path to save evaluated output (optional)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Path to gold/reference answers (optional)
        #[arg(long)]
        gold: Option<PathBuf>,
        /// Evaluation method
        #[arg(long, value_enum, default_value = "similarity")]
        strategy: StrategyArg,
    },
    /// Compute HR, PS, and MV from evaluated results and render charts
    Analyze,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum DatasetArg {
    Truthfulqa,
    Qafacteval,
    Hallucinationeval,
    Cohs,
    Custom,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum FormatArg {
    Csv,
    Json,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum StrategyArg {
    Similarity,
    Manual,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Set up tracing: human-readable stderr + JSON file logging
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_filter(EnvFilter::new(filter));

    let log_dir = directories::ProjectDirs::from("dev", "halluscope", "halluscope")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "halluscope.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let config = halluscope_core::load_config(cli.config.as_deref())?;

    commands::handle_command(cli.command, &config).await
}
