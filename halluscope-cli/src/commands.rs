//! CLI subcommand handlers, one per pipeline stage.

use crate::{Commands, DatasetArg, FormatArg, StrategyArg};
use halluscope_core::config::HarnessConfig;
use halluscope_core::dataset::{self, CustomFormat, DatasetKind};
use halluscope_core::error::HarnessError;
use halluscope_core::evaluate::{self, EvalStrategy};
use halluscope_core::generate::{self, SamplingParams};
use halluscope_core::inference::OpenAiCompatibleClient;
use halluscope_core::prompt::PromptTemplate;
use halluscope_core::records::{self, Sample};
use halluscope_core::{attribution, plot};
use std::path::PathBuf;

/// Handle a CLI subcommand.
pub async fn handle_command(command: Commands, config: &HarnessConfig) -> anyhow::Result<()> {
    match command {
        Commands::Load {
            dataset,
            split,
            n_samples,
            custom_path,
            custom_format,
        } => handle_load(config, dataset, &split, n_samples, custom_path, custom_format).await,
        Commands::Generate {
            model,
            dataset,
            prompt_type,
            max_tokens,
            output,
        } => handle_generate(config, &model, &dataset, &prompt_type, max_tokens, output).await,
        Commands::Evaluate {
            input,
            output,
            gold,
            strategy,
        } => handle_evaluate(input, output, gold, strategy).await,
        Commands::Analyze => handle_analyze(config).await,
    }
}

async fn handle_load(
    config: &HarnessConfig,
    dataset: DatasetArg,
    split: &str,
    n_samples: usize,
    custom_path: Option<PathBuf>,
    custom_format: Option<FormatArg>,
) -> anyhow::Result<()> {
    let kind = match dataset {
        DatasetArg::Truthfulqa => Some(DatasetKind::TruthfulQa),
        DatasetArg::Qafacteval => Some(DatasetKind::QaFactEval),
        DatasetArg::Hallucinationeval => Some(DatasetKind::HallucinationEval),
        DatasetArg::Cohs => Some(DatasetKind::CohS),
        DatasetArg::Custom => None,
    };

    let samples = match kind {
        Some(kind) => dataset::load_catalog(kind, split, n_samples).await?,
        None => {
            let (path, format) = match (custom_path, custom_format) {
                (Some(path), Some(format)) => (path, format),
                _ => {
                    return Err(HarnessError::config(
                        "for custom dataset, both --custom-path and --custom-format are required",
                    )
                    .into());
                }
            };
            let format = match format {
                FormatArg::Csv => CustomFormat::Csv,
                FormatArg::Json => CustomFormat::Json,
            };
            dataset::custom::load_custom(&path, format, n_samples).await?
        }
    };

    tokio::fs::create_dir_all(&config.paths.data_dir).await?;
    let slug = kind.map(DatasetKind::slug).unwrap_or("custom");
    let output_path = config
        .paths
        .data_dir
        .join(dataset::output_file_name(slug, split, n_samples));
    records::write_json_array(&output_path, &samples).await?;

    println!("Saved {} samples to {}", samples.len(), output_path.display());
    Ok(())
}

async fn handle_generate(
    config: &HarnessConfig,
    model: &str,
    dataset_file: &str,
    prompt_type: &str,
    max_tokens: u32,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let dataset_path = config.paths.data_dir.join(dataset_file);
    let samples: Vec<Sample> = records::read_json_array(&dataset_path).await?;
    let template = PromptTemplate::load(&config.paths.prompt_dir, prompt_type).await?;
    let client = OpenAiCompatibleClient::new(&config.inference, model)?;

    tracing::info!(model, prompt_type, samples = samples.len(), "generating responses");
    let params = SamplingParams::with_max_tokens(max_tokens);
    let generated =
        generate::generate_responses(&client, &samples, &template, prompt_type, &params).await?;

    tokio::fs::create_dir_all(&config.paths.results_dir).await?;
    let output_path = output.unwrap_or_else(|| {
        config
            .paths
            .results_dir
            .join(generate::default_output_name(model, prompt_type))
    });
    records::write_json_array(&output_path, &generated).await?;

    println!("Saved results to {}", output_path.display());
    Ok(())
}

async fn handle_evaluate(
    input: PathBuf,
    output: Option<PathBuf>,
    gold: Option<PathBuf>,
    strategy: StrategyArg,
) -> anyhow::Result<()> {
    let strategy = match strategy {
        StrategyArg::Similarity => EvalStrategy::Similarity,
        StrategyArg::Manual => EvalStrategy::Manual,
    };
    let output_path =
        evaluate::evaluate_file(&input, gold.as_deref(), strategy, output.as_deref()).await?;

    println!("Evaluated file saved to {}", output_path.display());
    Ok(())
}

async fn handle_analyze(config: &HarnessConfig) -> anyhow::Result<()> {
    let results = attribution::load_results(&config.paths.results_dir).await?;
    let report = attribution::analyze(&results)?;

    attribution::write_metrics_csv(&report, &config.paths.metrics_path()).await?;

    tokio::fs::create_dir_all(&config.paths.plot_dir).await?;
    plot::render_charts(&report, &config.paths.plot_dir)?;

    println!(
        "Attribution analysis complete: {} (model, prompt_type) groups",
        report.rates.len()
    );
    Ok(())
}
