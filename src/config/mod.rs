use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Every tunable threshold used by the comparators, grouped per component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub vowels: VowelConfig,
    pub words: WordConfig,
    pub pauses: PauseConfig,
    pub accent: AccentConfig,
    pub intonation: IntonationConfig,
    pub pronunciation: PronunciationConfig,
    pub orchestrator: OrchestratorConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VowelConfig {
    /// Analysis frame length for the energy, ZCR and autocorrelation cues.
    pub frame_ms: f64,
    /// Resolution at which cue agreement is evaluated.
    pub sub_frame_ms: f64,
    /// Ranges shorter than this many frames are discarded as noise.
    pub min_frames: usize,
    pub confidence_per_cue: u32,
    /// A sub-frame is vowel-bearing when its confidence exceeds this.
    pub confidence_threshold: u32,
}

impl Default for VowelConfig {
    fn default() -> Self {
        Self {
            frame_ms: 10.0,
            sub_frame_ms: 1.0,
            min_frames: 3,
            confidence_per_cue: 35,
            confidence_threshold: 90,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WordConfig {
    /// Score reported when nothing usable matched.
    pub no_match_floor: f64,
}

impl Default for WordConfig {
    fn default() -> Self {
        Self {
            no_match_floor: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PauseConfig {
    /// Gaps must be strictly longer than this to count as pauses.
    pub min_gap_ms: f64,
    /// Pauses shorter than this percentile of candidate durations are dropped.
    pub anomaly_percentile: f64,
}

impl Default for PauseConfig {
    fn default() -> Self {
        Self {
            min_gap_ms: 200.0,
            anomaly_percentile: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyllableCounter {
    /// One syllable per `aeiou` letter.
    VowelLetters,
    /// Vowel groups (diphthongs, triphthongs) count once; includes Polish vowels.
    DiphthongAware,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyUnit {
    /// RMS over each detected vowel span.
    Vowel,
    /// RMS over syllables derived from the vowel spans.
    Syllable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccentConfig {
    pub long_word_min_syllables: usize,
    pub min_vowel_spans: usize,
    /// Pairs whose stress-profile correlation is at or below this are mismatches.
    pub correlation_threshold: f64,
    pub accuracy_floor: f64,
    pub chart_points: usize,
    pub syllable_counter: SyllableCounter,
    pub energy_unit: EnergyUnit,
}

impl Default for AccentConfig {
    fn default() -> Self {
        Self {
            long_word_min_syllables: 3,
            min_vowel_spans: 2,
            correlation_threshold: 0.7,
            accuracy_floor: 0.05,
            chart_points: 500,
            syllable_counter: SyllableCounter::VowelLetters,
            energy_unit: EnergyUnit::Vowel,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PitchMethod {
    Autocorrelation,
    Pyin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntonationConfig {
    pub method: PitchMethod,
    pub time_step_ms: f64,
    pub pitch_floor_hz: f64,
    pub pitch_ceiling_hz: f64,
    pub voicing_threshold: f64,
    /// Frames whose peak is below this fraction of the global peak are silent.
    pub silence_threshold: f64,
    pub outlier_std_devs: f64,
    /// Interpolated samples summed into one contour point.
    pub window_size: usize,
    /// Audio above this rate is downsampled before pitch tracking.
    pub max_analysis_rate: u32,
}

impl Default for IntonationConfig {
    fn default() -> Self {
        Self {
            method: PitchMethod::Autocorrelation,
            time_step_ms: 10.0,
            pitch_floor_hz: 75.0,
            pitch_ceiling_hz: 600.0,
            voicing_threshold: 0.45,
            silence_threshold: 0.03,
            outlier_std_devs: 2.0,
            window_size: 10,
            max_analysis_rate: 16_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PronunciationConfig {
    pub time_step_ms: f64,
    pub window_ms: f64,
    pub max_formant_hz: f64,
    pub lpc_order: usize,
    pub pre_emphasis_hz: f64,
    /// Vowel pairs with an F1 or F2 correlation below this are flagged.
    pub correlation_threshold: f64,
}

impl Default for PronunciationConfig {
    fn default() -> Self {
        Self {
            time_step_ms: 10.0,
            window_ms: 25.0,
            max_formant_hz: 5500.0,
            lpc_order: 10,
            pre_emphasis_hz: 50.0,
            correlation_threshold: 0.7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Size of the worker pool; `None` uses the available parallelism.
    pub worker_threads: Option<usize>,
    pub score_pronunciation: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            worker_threads: None,
            score_pronunciation: true,
        }
    }
}

impl AnalysisConfig {
    /// Load from a JSON file when given, otherwise use the defaults.
    pub fn from_override(path: Option<PathBuf>) -> Result<Self> {
        let config = match path {
            Some(custom) => Self::load(&custom)?,
            None => Self::default(),
        };
        config.validate().context("invalid analysis configuration")?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read analysis config at {:?}", path))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse analysis config at {:?}", path))?;
        Ok(config)
    }

    pub fn validate(&self) -> crate::Result<()> {
        let v = &self.vowels;
        ensure_positive(v.frame_ms, "vowels.frame_ms")?;
        ensure_positive(v.sub_frame_ms, "vowels.sub_frame_ms")?;
        ensure_that(v.min_frames > 0, "vowels.min_frames must be at least 1")?;
        ensure_that(
            v.confidence_per_cue > 0,
            "vowels.confidence_per_cue must be positive",
        )?;

        ensure_unit(self.words.no_match_floor, "words.no_match_floor")?;

        ensure_that(
            self.pauses.min_gap_ms >= 0.0,
            "pauses.min_gap_ms must be non-negative",
        )?;
        ensure_that(
            (0.0..=100.0).contains(&self.pauses.anomaly_percentile),
            "pauses.anomaly_percentile must be within [0, 100]",
        )?;

        let a = &self.accent;
        ensure_that(
            a.min_vowel_spans >= 2,
            "accent.min_vowel_spans must be at least 2 to correlate profiles",
        )?;
        ensure_correlation(a.correlation_threshold, "accent.correlation_threshold")?;
        ensure_unit(a.accuracy_floor, "accent.accuracy_floor")?;
        ensure_that(a.chart_points > 0, "accent.chart_points must be positive")?;

        let i = &self.intonation;
        ensure_positive(i.time_step_ms, "intonation.time_step_ms")?;
        ensure_positive(i.pitch_floor_hz, "intonation.pitch_floor_hz")?;
        ensure_that(
            i.pitch_ceiling_hz > i.pitch_floor_hz,
            "intonation.pitch_ceiling_hz must exceed pitch_floor_hz",
        )?;
        ensure_unit(i.voicing_threshold, "intonation.voicing_threshold")?;
        ensure_unit(i.silence_threshold, "intonation.silence_threshold")?;
        ensure_positive(i.outlier_std_devs, "intonation.outlier_std_devs")?;
        ensure_that(
            i.window_size > 0,
            "intonation.window_size must be positive",
        )?;
        ensure_that(
            f64::from(i.max_analysis_rate) >= 2.0 * i.pitch_ceiling_hz,
            "intonation.max_analysis_rate must be at least twice the pitch ceiling",
        )?;

        let p = &self.pronunciation;
        ensure_positive(p.time_step_ms, "pronunciation.time_step_ms")?;
        ensure_positive(p.window_ms, "pronunciation.window_ms")?;
        ensure_positive(p.max_formant_hz, "pronunciation.max_formant_hz")?;
        ensure_that(p.lpc_order >= 4, "pronunciation.lpc_order must be at least 4")?;
        ensure_that(
            p.pre_emphasis_hz >= 0.0,
            "pronunciation.pre_emphasis_hz must be non-negative",
        )?;
        ensure_correlation(p.correlation_threshold, "pronunciation.correlation_threshold")?;

        if let Some(threads) = self.orchestrator.worker_threads {
            ensure_that(threads > 0, "orchestrator.worker_threads must be positive")?;
        }
        Ok(())
    }
}

fn ensure_that(condition: bool, message: &str) -> crate::Result<()> {
    if condition {
        Ok(())
    } else {
        Err(AnalysisError::malformed(message))
    }
}

fn ensure_positive(value: f64, field: &str) -> crate::Result<()> {
    ensure_that(
        value.is_finite() && value > 0.0,
        &format!("{field} must be positive (got {value})"),
    )
}

fn ensure_unit(value: f64, field: &str) -> crate::Result<()> {
    ensure_that(
        (0.0..=1.0).contains(&value),
        &format!("{field} must be within [0, 1] (got {value})"),
    )
}

fn ensure_correlation(value: f64, field: &str) -> crate::Result<()> {
    ensure_that(
        (-1.0..=1.0).contains(&value),
        &format!("{field} must be within [-1, 1] (got {value})"),
    )
}
