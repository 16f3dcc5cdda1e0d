//! Boundary with the transcription/timing service.
//!
//! The service itself is out of scope; this module reads its saved output and
//! validates every record before it reaches the analysis code.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{AnalysisError, Result};
use crate::types::{Signal, TimeRange, Word};

/// Anything that can produce word timings for a recording.
pub trait TranscriptSource {
    fn words(&self, audio: &Signal) -> Result<Vec<Word>>;
}

/// Word list saved to disk, either as a bare array or a full service response.
#[derive(Debug, Clone)]
pub struct JsonTranscript {
    path: PathBuf,
}

impl JsonTranscript {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TranscriptDocument {
    Words(Vec<Word>),
    Response { results: ResponseResults },
}

#[derive(Deserialize)]
struct ResponseResults {
    channels: Vec<ResponseChannel>,
}

#[derive(Deserialize)]
struct ResponseChannel {
    alternatives: Vec<ResponseAlternative>,
}

#[derive(Deserialize)]
struct ResponseAlternative {
    #[serde(default)]
    words: Vec<Word>,
}

impl TranscriptDocument {
    fn into_words(self) -> Vec<Word> {
        match self {
            Self::Words(words) => words,
            Self::Response { results } => results
                .channels
                .into_iter()
                .next()
                .and_then(|channel| channel.alternatives.into_iter().next())
                .map(|alternative| alternative.words)
                .unwrap_or_default(),
        }
    }
}

impl TranscriptSource for JsonTranscript {
    fn words(&self, _audio: &Signal) -> Result<Vec<Word>> {
        let raw = fs::read_to_string(&self.path).map_err(|err| {
            AnalysisError::upstream("reading transcript", format!("{}: {err}", self.path.display()))
        })?;
        let document: TranscriptDocument = serde_json::from_str(&raw).map_err(|err| {
            AnalysisError::upstream("parsing transcript", format!("{}: {err}", self.path.display()))
        })?;
        Ok(document.into_words())
    }
}

/// Ask `source` for word timings and validate them.
///
/// An empty transcript is not an error: the caller scores what it can.
pub fn fetch_words(
    source: &dyn TranscriptSource,
    audio: &Signal,
    label: &str,
) -> Result<Vec<Word>> {
    let words = source.words(audio)?;
    for (index, word) in words.iter().enumerate() {
        word.validate(index)?;
    }
    if words.is_empty() {
        warn!(label, "transcript has no words; dependent dimensions will score low");
    } else {
        debug!(label, words = words.len(), "loaded transcript");
    }
    Ok(words)
}

/// Read a `{"start": .., "end": ..}` document.
pub fn load_time_range(path: impl AsRef<Path>) -> Result<TimeRange> {
    let raw = fs::read_to_string(path.as_ref())
        .map_err(|err| AnalysisError::io("reading time range", err))?;
    let range: TimeRange =
        serde_json::from_str(&raw).map_err(|err| AnalysisError::json("parsing time range", err))?;
    range.validate()?;
    Ok(range)
}
