use std::fs;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lectorcmp::audio::decoder::decode_audio;
use lectorcmp::cli::{Cli, Command, CompareArgs, PausesArgs};
use lectorcmp::transcript::{fetch_words, JsonTranscript, TranscriptSource};
use lectorcmp::types::Word;
use lectorcmp::{AnalysisConfig, AnalysisOrchestrator, ComparisonRequest, Signal};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);
    match cli.command {
        Command::Compare(args) => handle_compare(&args),
        Command::Pauses(args) => handle_pauses(&args),
    }
}

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn handle_compare(args: &CompareArgs) -> Result<()> {
    args.validate()
        .context("Failed to validate command-line arguments")?;
    let config = AnalysisConfig::from_override(args.config.clone())?;
    let range = args.time_range()?;

    let reference = decode_audio(&args.reference)
        .with_context(|| format!("Failed to decode reference audio {:?}", args.reference))?;
    let learner = decode_audio(&args.learner)
        .with_context(|| format!("Failed to decode learner audio {:?}", args.learner))?;
    info!(
        reference_seconds = reference.duration(),
        learner_seconds = learner.duration(),
        "decoded recordings"
    );

    let reference_words = load_words(
        &JsonTranscript::new(&args.reference_words),
        &reference,
        "reference",
    )?;
    let learner_words =
        load_words(&JsonTranscript::new(&args.learner_words), &learner, "learner")?;

    let orchestrator = AnalysisOrchestrator::new(config)?;
    let result = orchestrator
        .compare(&ComparisonRequest {
            reference,
            learner,
            range,
            reference_words,
            learner_words,
        })
        .context("Comparison failed")?;
    let json = result.to_json()?;

    match &args.output {
        Some(path) => fs::write(path, json)
            .with_context(|| format!("Failed to write result to {:?}", path))?,
        None => println!("{json}"),
    }
    Ok(())
}

fn handle_pauses(args: &PausesArgs) -> Result<()> {
    let config = AnalysisConfig::from_override(args.config.clone())?;
    let source = JsonTranscript::new(&args.reference_words);
    let words = load_words(&source, &Signal::new(Vec::new(), 0), "reference")?;
    let pauses = AnalysisOrchestrator::new(config)?.detect_pauses(&words);
    println!(
        "{}",
        serde_json::to_string(&pauses).context("Failed to serialize pauses")?
    );
    Ok(())
}

fn load_words(source: &JsonTranscript, audio: &Signal, label: &str) -> Result<Vec<Word>> {
    fetch_words(source as &dyn TranscriptSource, audio, label)
        .with_context(|| format!("Failed to load {label} words from {:?}", source.path()))
}
