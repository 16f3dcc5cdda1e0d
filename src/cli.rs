use std::path::PathBuf;

use anyhow::{bail, ensure, Context, Result};
use clap::{Args, Parser, Subcommand};

use crate::transcript;
use crate::types::TimeRange;

#[derive(Parser, Debug)]
#[command(
    name = "lectorcmp",
    version,
    about = "Compare a learner's repetition of a reference excerpt"
)]
pub struct Cli {
    /// Log filter used when RUST_LOG is unset (e.g. "info", "lectorcmp=debug").
    #[arg(long = "log-level", global = true, default_value = "warn")]
    pub log_level: String,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Score one excerpt and print the result as JSON.
    Compare(CompareArgs),
    /// Print pause midpoints (ms) of a reference transcript as a JSON array.
    Pauses(PausesArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CompareArgs {
    /// Full reference recording.
    #[arg(long)]
    pub reference: PathBuf,
    /// Learner's recording of the excerpt.
    #[arg(long)]
    pub learner: PathBuf,
    /// Word timings of the full reference recording.
    #[arg(long = "reference-words")]
    pub reference_words: PathBuf,
    /// Word timings of the learner's recording.
    #[arg(long = "learner-words")]
    pub learner_words: PathBuf,
    /// JSON file holding the excerpt as {"start": .., "end": ..}.
    #[arg(long, conflicts_with_all = ["start", "end"])]
    pub range: Option<PathBuf>,
    /// Excerpt start (seconds or HH:MM:SS.mmm).
    #[arg(long, value_name = "TIME", requires = "end")]
    pub start: Option<String>,
    /// Excerpt end (seconds or HH:MM:SS.mmm).
    #[arg(long, value_name = "TIME", requires = "start")]
    pub end: Option<String>,
    /// Optional analysis configuration overrides.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Write the result here instead of stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

impl CompareArgs {
    pub fn validate(&self) -> Result<()> {
        for (label, path) in [
            ("reference audio", &self.reference),
            ("learner audio", &self.learner),
            ("reference words", &self.reference_words),
            ("learner words", &self.learner_words),
        ] {
            ensure!(path.is_file(), "{label} file does not exist: {:?}", path);
        }
        if self.range.is_none() && self.start.is_none() {
            bail!("Provide the excerpt via --range or --start/--end");
        }
        if let Some(output) = &self.output {
            ensure!(!output.is_dir(), "Output path is a directory: {:?}", output);
        }
        Ok(())
    }

    pub fn time_range(&self) -> Result<TimeRange> {
        if let Some(path) = &self.range {
            return transcript::load_time_range(path)
                .with_context(|| format!("Failed to load time range from {:?}", path));
        }
        let (Some(start), Some(end)) = (self.start.as_deref(), self.end.as_deref()) else {
            bail!("Both --start and --end are required");
        };
        let range = TimeRange::new(
            parse_time_to_seconds(start).with_context(|| format!("Invalid start time '{start}'"))?,
            parse_time_to_seconds(end).with_context(|| format!("Invalid end time '{end}'"))?,
        );
        range.validate()?;
        Ok(range)
    }
}

#[derive(Args, Debug, Clone)]
pub struct PausesArgs {
    /// Word timings of the full reference recording.
    #[arg(long = "reference-words")]
    pub reference_words: PathBuf,
    /// Optional analysis configuration overrides.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Seconds, `MM:SS` or `HH:MM:SS`, with fractional seconds allowed.
pub fn parse_time_to_seconds(raw: &str) -> Result<f64> {
    let parts: Vec<&str> = raw.split(':').collect();
    ensure!(parts.len() <= 3, "Time format must be SS, MM:SS or HH:MM:SS");
    let mut seconds = 0.0;
    for part in &parts {
        let value: f64 = part
            .trim()
            .parse()
            .with_context(|| format!("Invalid time component '{part}'"))?;
        ensure!(value >= 0.0 && value.is_finite(), "Time values must be non-negative");
        seconds = seconds * 60.0 + value;
    }
    Ok(seconds)
}
