//! Runs every comparison dimension for one excerpt and assembles the result.
//!
//! Each dimension is a scoped thread returning its own `Result`. The join
//! barrier waits for all of them before anything is assembled, so a failed
//! dimension fails the whole comparison instead of leaving holes in it.
//! Per-pair fan-out inside a dimension runs on a bounded rayon pool.

use std::thread;

use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{error, info, info_span};

use super::accent::{accent_accuracy, AccentComparator};
use super::intonation::{IntonationComparator, IntonationOutcome};
use super::pauses::PauseDetector;
use super::pronunciation::{PronunciationComparator, PronunciationReport};
use super::words::{matching_words_for_time_range, SequenceAccuracy, WordAligner};
use crate::audio::decoder::ensure_range_within;
use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::types::{
    AccentMismatch, ComparisonResult, IntonationContours, Signal, TimeRange, Transcription, Word,
};

/// One learner attempt at an excerpt of the reference recording.
#[derive(Debug, Clone)]
pub struct ComparisonRequest {
    /// The full reference recording.
    pub reference: Signal,
    pub learner: Signal,
    pub range: TimeRange,
    /// The full reference transcript, in recording time.
    pub reference_words: Vec<Word>,
    pub learner_words: Vec<Word>,
}

pub struct AnalysisOrchestrator {
    config: AnalysisConfig,
    pool: ThreadPool,
}

type Joined<T> = thread::Result<Result<T>>;

impl AnalysisOrchestrator {
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        let mut builder =
            ThreadPoolBuilder::new().thread_name(|i| format!("lectorcmp-worker-{i}"));
        if let Some(threads) = config.orchestrator.worker_threads {
            builder = builder.num_threads(threads);
        }
        let pool = builder
            .build()
            .map_err(|err| AnalysisError::malformed(format!("cannot start worker pool: {err}")))?;
        Ok(Self { config, pool })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Pause midpoints (ms) across a whole reference transcript.
    pub fn detect_pauses(&self, reference_words: &[Word]) -> Vec<u64> {
        PauseDetector::new(self.config.pauses.clone()).detect_pauses(reference_words)
    }

    pub fn compare(&self, request: &ComparisonRequest) -> Result<ComparisonResult> {
        let _span = info_span!(
            "compare",
            start = request.range.start,
            end = request.range.end
        )
        .entered();
        validate_request(request)?;

        let reference_words = matching_words_for_time_range(
            request.range.start,
            request.range.end,
            &request.reference_words,
        );
        let excerpt = request
            .reference
            .slice_seconds(request.range.start, request.range.end);
        info!(
            reference_words = reference_words.len(),
            learner_words = request.learner_words.len(),
            excerpt_seconds = excerpt.duration(),
            "starting comparison"
        );

        let accent = AccentComparator::new(self.config.vowels.clone(), self.config.accent.clone());
        let intonation = IntonationComparator::new(self.config.intonation.clone());
        let aligner = WordAligner::new(self.config.words.clone());
        let pronunciation = PronunciationComparator::new(
            self.config.vowels.clone(),
            self.config.pronunciation.clone(),
        );
        let score_pronunciation = self.config.orchestrator.score_pronunciation;

        let (accent_joined, intonation_joined, words_joined, pronunciation_joined) =
            thread::scope(|scope| {
                let accent_task = scope.spawn(|| {
                    self.pool.install(|| {
                        Ok::<_, AnalysisError>(accent.compare_accents(
                            &excerpt,
                            &request.range,
                            &request.learner,
                            &reference_words,
                            &request.learner_words,
                        ))
                    })
                });
                let intonation_task = scope.spawn(|| {
                    self.pool
                        .install(|| intonation.intonation_similarity(&excerpt, &request.learner))
                });
                let words_task = scope.spawn(|| {
                    Ok::<_, AnalysisError>(
                        aligner.sequence_accuracy(&request.learner_words, &reference_words),
                    )
                });
                let pronunciation_task = scope.spawn(|| {
                    if !score_pronunciation {
                        return Ok(PronunciationReport::default());
                    }
                    self.pool.install(|| {
                        pronunciation.compare_vowel_pronunciation(
                            &excerpt,
                            &request.learner,
                            &request.range,
                            &request.learner_words,
                            &reference_words,
                        )
                    })
                });
                (
                    accent_task.join(),
                    intonation_task.join(),
                    words_task.join(),
                    pronunciation_task.join(),
                )
            });

        let accent_mismatches: Vec<AccentMismatch> = settle("accent", accent_joined)?;
        let intonation: IntonationOutcome = settle("intonation", intonation_joined)?;
        let words: SequenceAccuracy = settle("words", words_joined)?;
        let pronunciation: PronunciationReport = settle("pronunciation", pronunciation_joined)?;

        let accent_accuracy = accent_accuracy(
            request.learner_words.len(),
            accent_mismatches.len(),
            self.config.accent.accuracy_floor,
        );
        info!(
            words_accuracy = words.score,
            accent_accuracy,
            intonation_accuracy = intonation.similarity,
            pronunciation_accuracy = pronunciation.accuracy,
            "comparison complete"
        );

        Ok(ComparisonResult {
            lexical_accuracy: words.score,
            transcription: Transcription {
                reference: words.reference_text,
                learner: words.learner_text,
            },
            accent_accuracy,
            accent_mismatches,
            intonation_similarity: intonation.similarity,
            intonation: IntonationContours {
                reference: intonation.reference_contour,
                learner: intonation.learner_contour,
            },
            pronunciation_accuracy: pronunciation.accuracy,
        })
    }
}

/// Turn a joined task into its value, tagging failures and panics with the dimension.
fn settle<T>(dimension: &'static str, joined: Joined<T>) -> Result<T> {
    let outcome = match joined {
        Ok(result) => result,
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| (*s).to_owned())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "task panicked".to_owned());
            Err(AnalysisError::TaskPanicked { message })
        }
    };
    outcome.map_err(|err| {
        error!(dimension, error = %err, "dimension failed");
        AnalysisError::dimension(dimension, err)
    })
}

fn validate_request(request: &ComparisonRequest) -> Result<()> {
    request.reference.validate("reference")?;
    request.learner.validate("learner")?;
    request.range.validate()?;
    ensure_range_within(&request.reference, &request.range, "reference")?;
    for (index, word) in request.reference_words.iter().enumerate() {
        word.validate(index)?;
    }
    for (index, word) in request.learner_words.iter().enumerate() {
        word.validate(index)?;
    }
    Ok(())
}
