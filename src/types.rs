//! Core types shared by the comparison engine

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Mono PCM audio, immutable once produced.
#[derive(Debug, Clone)]
pub struct Signal {
    /// Audio samples, normalized to [-1.0, 1.0]
    pub samples: Arc<[f32]>,
    /// Sample rate in Hz (e.g., 44100)
    pub sample_rate: u32,
}

impl Signal {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples: Arc::from(samples),
            sample_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Sample index for a time offset, clamped to the buffer.
    pub fn index_at(&self, seconds: f64) -> usize {
        let index = (seconds.max(0.0) * self.sample_rate as f64).floor() as usize;
        index.min(self.samples.len())
    }

    /// Copy out the samples between two time offsets as a new signal.
    pub fn slice_seconds(&self, start: f64, end: f64) -> Signal {
        let start_index = self.index_at(start);
        let end_index = self.index_at(end).max(start_index);
        Signal::new(
            self.samples[start_index..end_index].to_vec(),
            self.sample_rate,
        )
    }

    pub fn validate(&self, label: &str) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(AnalysisError::malformed(format!(
                "{label} audio has a zero sample rate"
            )));
        }
        if self.samples.is_empty() {
            return Err(AnalysisError::malformed(format!("{label} audio is empty")));
        }
        if self.samples.iter().any(|s| !s.is_finite()) {
            return Err(AnalysisError::malformed(format!(
                "{label} audio contains non-finite samples"
            )));
        }
        Ok(())
    }
}

/// Half-open time span in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeInterval {
    pub start: f64,
    pub end: f64,
}

impl TimeInterval {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn shifted(&self, offset: f64) -> Self {
        Self::new(self.start + offset, self.end + offset)
    }
}

/// Interval believed to contain vowel phonation.
pub type VowelSpan = TimeInterval;

/// A lexical token with its span in the coordinates of its own recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    #[serde(rename = "word", alias = "text")]
    pub text: String,
    pub start: f64,
    pub end: f64,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub punctuated_word: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker_confidence: Option<f64>,
}

fn default_confidence() -> f64 {
    1.0
}

impl Word {
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
            confidence: 1.0,
            punctuated_word: None,
            speaker: None,
            speaker_confidence: None,
        }
    }

    pub fn validate(&self, index: usize) -> Result<()> {
        if !self.start.is_finite() || !self.end.is_finite() || !self.confidence.is_finite() {
            return Err(AnalysisError::malformed(format!(
                "word {index} ('{}') has non-finite timing",
                self.text
            )));
        }
        if self.start < 0.0 || self.end < self.start {
            return Err(AnalysisError::malformed(format!(
                "word {index} ('{}') has invalid span {:.3}s - {:.3}s",
                self.text, self.start, self.end
            )));
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(AnalysisError::malformed(format!(
                "word {index} ('{}') confidence {} outside [0, 1]",
                self.text, self.confidence
            )));
        }
        Ok(())
    }
}

/// Excerpt of the reference recording the learner attempted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Shift a reference word into the excerpt's own time origin.
    pub fn rebase(&self, word: &Word) -> Word {
        Word {
            start: word.start - self.start,
            end: word.end - self.start,
            ..word.clone()
        }
    }

    pub fn rebase_all(&self, words: &[Word]) -> Vec<Word> {
        words.iter().map(|word| self.rebase(word)).collect()
    }

    pub fn validate(&self) -> Result<()> {
        if !self.start.is_finite() || !self.end.is_finite() {
            return Err(AnalysisError::malformed("time range bounds must be finite"));
        }
        if self.start < 0.0 || self.end <= self.start {
            return Err(AnalysisError::malformed(format!(
                "time range {:.3}s - {:.3}s must satisfy 0 <= start < end",
                self.start, self.end
            )));
        }
        Ok(())
    }
}

/// Formant measurement for one analysis frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormantPoint {
    pub time: f64,
    pub f1_hz: f64,
    pub f2_hz: f64,
}

/// Word whose stress-energy distribution diverges from the reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccentMismatch {
    pub word: String,
    #[serde(rename = "lectorProfile")]
    pub reference_energy_profile: Vec<f64>,
    #[serde(rename = "userProfile")]
    pub learner_energy_profile: Vec<f64>,
    #[serde(rename = "lectorSignal")]
    pub reference_signal: Vec<f32>,
    #[serde(rename = "userSignal")]
    pub learner_signal: Vec<f32>,
}

/// Vowel pair whose normalized formant trajectories correlate poorly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LowCorrelationVowel {
    pub word: String,
    pub reference_span: VowelSpan,
    pub learner_span: VowelSpan,
    pub f1_correlation: Option<f64>,
    pub f2_correlation: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transcription {
    #[serde(rename = "lectorTranscription")]
    pub reference: String,
    #[serde(rename = "userTranscription")]
    pub learner: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IntonationContours {
    #[serde(rename = "lectorIntonation")]
    pub reference: Vec<f64>,
    #[serde(rename = "userIntonation")]
    pub learner: Vec<f64>,
}

/// Aggregate scores for one comparison request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    #[serde(rename = "wordsAccuracy")]
    pub lexical_accuracy: f64,
    pub transcription: Transcription,
    pub accent_accuracy: f64,
    #[serde(rename = "accent")]
    pub accent_mismatches: Vec<AccentMismatch>,
    #[serde(rename = "intonationAccuracy")]
    pub intonation_similarity: f64,
    pub intonation: IntonationContours,
    pub pronunciation_accuracy: f64,
}

impl ComparisonResult {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|err| AnalysisError::json("serializing result", err))
    }
}
