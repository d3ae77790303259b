//! llm-classifiers - LLM-backed text classification tools
//!
//! Usage:
//!   llm-classifiers train --model-output out.lora.safetensors < train.jsonl
//!   llm-classifiers classify --labels positive,negative < texts.jsonl
//!   llm-classifiers shieldgemma < safety.jsonl
//!
//! All subcommands read newline-delimited JSON records from stdin and write
//! results to stdout, one line per input record.

use std::io;
use std::path::Path;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;

use llm_classifiers::core::{
    ensure_adapter_output_path, read_json_records, TextRecord, TrainingRecord,
};
use llm_classifiers::models::{load_device, CausalLm, GemmaModel, GemmaPreset, TrainingConfig};
use llm_classifiers::pipelines::agile_classifier::AgileClassifierBuilder;
use llm_classifiers::pipelines::shield_gemma::{SafetyRecord, ShieldGemmaPipeline};
use llm_classifiers::pipelines::token_probability::argmax;

#[derive(Parser)]
#[command(name = "llm-classifiers", version, about = "LLM-backed text classification tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fine-tune a classifier on {"text": ..., "label": ...} records from stdin
    Train(TrainArgs),
    /// Score {"text": ...} records from stdin against a fixed label set
    Classify(ClassifyArgs),
    /// Score safety records from stdin with ShieldGemma harm policies
    Shieldgemma(ShieldGemmaArgs),
}

/// Named checkpoints selectable with `--preset`.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum PresetArg {
    #[value(name = "gemma3-1b")]
    Gemma3_1B,
    #[value(name = "gemma3-4b")]
    Gemma3_4B,
    #[value(name = "shieldgemma-2b")]
    ShieldGemma2B,
}

impl From<PresetArg> for GemmaPreset {
    fn from(preset: PresetArg) -> Self {
        match preset {
            PresetArg::Gemma3_1B => GemmaPreset::Gemma3_1BInstruct,
            PresetArg::Gemma3_4B => GemmaPreset::Gemma3_4BInstruct,
            PresetArg::ShieldGemma2B => GemmaPreset::ShieldGemma2B,
        }
    }
}

/// Checkpoint selection shared by all subcommands. Without `--preset` or
/// the repo overrides, the subcommand's default preset is used.
#[derive(Args)]
struct ModelArgs {
    /// Named checkpoint to load
    #[arg(long, value_enum, conflicts_with_all = ["model_repo", "model_file", "tokenizer_repo"])]
    preset: Option<PresetArg>,

    /// Hugging Face repo holding the GGUF checkpoint
    #[arg(long)]
    model_repo: Option<String>,

    /// GGUF filename within the model repo
    #[arg(long)]
    model_file: Option<String>,

    /// Hugging Face repo holding tokenizer.json
    #[arg(long)]
    tokenizer_repo: Option<String>,

    /// Maximum sequence length; longer prompts are truncated
    #[arg(long, default_value_t = 512)]
    max_sequence_length: usize,
}

impl ModelArgs {
    fn resolved_preset(&self, default_preset: GemmaPreset) -> GemmaPreset {
        self.preset.map(GemmaPreset::from).unwrap_or(default_preset)
    }

    fn load(&self, default_preset: GemmaPreset) -> Result<GemmaModel> {
        let device = load_device()?;
        match (&self.model_repo, &self.model_file, &self.tokenizer_repo) {
            (Some(repo), Some(file), Some(tokenizer)) => GemmaModel::from_files(
                repo,
                file,
                tokenizer,
                self.max_sequence_length,
                &device,
            ),
            (None, None, None) => GemmaModel::from_preset(
                self.resolved_preset(default_preset),
                self.max_sequence_length,
                &device,
            ),
            _ => anyhow::bail!(
                "--model-repo, --model-file and --tokenizer-repo must be given together"
            ),
        }
    }
}

#[derive(Args)]
struct TrainArgs {
    #[command(flatten)]
    model: ModelArgs,

    /// Path to save the fine-tuned adapter weights
    #[arg(long)]
    model_output: String,

    /// Number of passes over the training records
    #[arg(long, default_value_t = 1)]
    epochs: usize,

    /// Training examples per optimizer step
    #[arg(long, default_value_t = 1)]
    batch_size: usize,
}

#[derive(Args)]
struct ClassifyArgs {
    #[command(flatten)]
    model: ModelArgs,

    /// Comma-delimited class labels, in score-vector order
    #[arg(long, required = true, value_delimiter = ',')]
    labels: Vec<String>,
}

#[derive(Args)]
struct ShieldGemmaArgs {
    #[command(flatten)]
    model: ModelArgs,
}

#[derive(Serialize)]
struct ClassifyOutput<'a> {
    text: &'a str,
    prediction: &'a str,
    scores: &'a [f32],
}

fn train(args: &TrainArgs) -> Result<()> {
    ensure_adapter_output_path(&args.model_output)?;

    let records: Vec<TrainingRecord> =
        read_json_records(io::stdin().lock(), TrainingRecord::EXPECTED)?;
    anyhow::ensure!(!records.is_empty(), "no training records on stdin");

    // The label set is the distinct labels in first-occurrence order, so
    // the score-vector order is reproducible from the training file.
    let mut labels: Vec<String> = Vec::new();
    for record in &records {
        if !labels.contains(&record.label) {
            labels.push(record.label.clone());
        }
    }
    tracing::info!(records = records.len(), labels = ?labels, "read training data");

    let model = args.model.load(GemmaPreset::Gemma3_1BInstruct)?;
    let mut classifier = AgileClassifierBuilder::new(&labels).build(model)?;

    let texts: Vec<String> = records.iter().map(|r| r.text.clone()).collect();
    let gold: Vec<String> = records.iter().map(|r| r.label.clone()).collect();
    let config = TrainingConfig {
        epochs: args.epochs,
        batch_size: args.batch_size,
    };
    let history = classifier.fit(&texts, &gold, &config)?;

    for (epoch, loss) in history.epoch_losses.iter().enumerate() {
        tracing::info!(epoch = epoch + 1, loss, "epoch finished");
    }

    classifier
        .model()
        .save_adapter(Path::new(&args.model_output))?;
    tracing::info!(path = %args.model_output, "saved adapter weights");
    Ok(())
}

fn classify(args: &ClassifyArgs) -> Result<()> {
    let records: Vec<TextRecord> = read_json_records(io::stdin().lock(), TextRecord::EXPECTED)?;

    let model = args.model.load(GemmaPreset::Gemma3_1BInstruct)?;
    let classifier = AgileClassifierBuilder::new(&args.labels).build(model)?;

    let texts: Vec<String> = records.iter().map(|r| r.text.clone()).collect();
    let scores = classifier.score(&texts)?;

    let stdout = io::stdout();
    for (record, score) in records.iter().zip(&scores) {
        let prediction = &classifier.labels()[argmax(score)];
        let output = ClassifyOutput {
            text: &record.text,
            prediction,
            scores: score,
        };
        serde_json::to_writer(stdout.lock(), &output)?;
        println!();
    }
    Ok(())
}

fn shieldgemma(args: &ShieldGemmaArgs) -> Result<()> {
    let records: Vec<SafetyRecord> = read_json_records(io::stdin().lock(), SafetyRecord::EXPECTED)?;

    let model = args.model.load(GemmaPreset::ShieldGemma2B)?;
    let pipeline = ShieldGemmaPipeline::new(model)?;

    for probability in pipeline.violation_probability(&records)? {
        println!("{probability}");
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Tracing to stderr so stdout stays machine-readable.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match &cli.command {
        Commands::Train(args) => train(args),
        Commands::Classify(args) => classify(args),
        Commands::Shieldgemma(args) => shieldgemma(args),
    }
}
