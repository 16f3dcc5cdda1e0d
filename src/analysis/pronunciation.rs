use std::path::Path;

use rayon::prelude::*;
use tracing::{debug, info};

use super::formants::FormantTracker;
use super::outcome::{collect_evaluated, PairOutcome};
use super::stats::{interpolate_to_len, mean_std, pearson};
use super::vowels::{merge_closest_intervals, VowelSegmenter};
use crate::audio::decoder::{decode_audio, load_excerpt};
use crate::audio::slicer::extract_segment;
use crate::config::{PronunciationConfig, VowelConfig};
use crate::error::Result;
use crate::types::{FormantPoint, LowCorrelationVowel, Signal, TimeRange, VowelSpan, Word};

/// Flagged vowels and the share of compared vowels that were not flagged.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PronunciationReport {
    pub low_correlation_vowels: Vec<LowCorrelationVowel>,
    pub accuracy: f64,
    pub compared: usize,
}

#[derive(Debug, Clone)]
struct VowelPair {
    word: String,
    reference_span: VowelSpan,
    learner_span: VowelSpan,
}

#[derive(Debug, Clone)]
struct MeasuredPair {
    pair: VowelPair,
    reference: Vec<FormantPoint>,
    learner: Vec<FormantPoint>,
}

#[derive(Debug, Clone, Default)]
pub struct PronunciationComparator {
    segmenter: VowelSegmenter,
    config: PronunciationConfig,
}

impl PronunciationComparator {
    pub fn new(vowels: VowelConfig, config: PronunciationConfig) -> Self {
        Self {
            segmenter: VowelSegmenter::new(vowels),
            config,
        }
    }

    /// Decode both recordings, cut the reference excerpt and compare.
    pub fn compare_vowel_pronunciation_files(
        &self,
        learner_path: impl AsRef<Path>,
        reference_path: impl AsRef<Path>,
        range: &TimeRange,
        learner_words: &[Word],
        reference_words: &[Word],
    ) -> Result<PronunciationReport> {
        let learner = decode_audio(learner_path)?;
        let excerpt = load_excerpt(reference_path, range)?;
        self.compare_vowel_pronunciation(
            &excerpt,
            &learner,
            range,
            learner_words,
            reference_words,
        )
    }

    /// `reference_excerpt` starts at `range.start`; `reference_words` are in
    /// full-recording time and are rebased here.
    pub fn compare_vowel_pronunciation(
        &self,
        reference_excerpt: &Signal,
        learner: &Signal,
        range: &TimeRange,
        learner_words: &[Word],
        reference_words: &[Word],
    ) -> Result<PronunciationReport> {
        let rebased = range.rebase_all(reference_words);
        let aligned = align_words(&rebased, learner_words);
        if aligned.is_empty() {
            info!("no reference words repeated by the learner; pronunciation not scored");
            return Ok(PronunciationReport::default());
        }

        let outcomes: Vec<PairOutcome<Vec<VowelPair>>> = aligned
            .par_iter()
            .map(|(reference_word, learner_word)| {
                self.vowel_pairs(reference_excerpt, learner, reference_word, learner_word)
            })
            .collect();
        let (per_word, counts) = collect_evaluated("pronunciation", outcomes);
        let pairs: Vec<VowelPair> = per_word.into_iter().flatten().collect();
        debug!(
            words = counts.evaluated,
            skipped = counts.skipped,
            failed = counts.failed,
            vowels = pairs.len(),
            "paired vowels for formant comparison"
        );

        let reference_tracker = FormantTracker::new(reference_excerpt, &self.config)?;
        let learner_tracker = FormantTracker::new(learner, &self.config)?;
        let measured: Vec<MeasuredPair> = pairs
            .into_par_iter()
            .map(|pair| MeasuredPair {
                reference: reference_tracker.trajectory(&pair.reference_span),
                learner: learner_tracker.trajectory(&pair.learner_span),
                pair,
            })
            .collect();

        Ok(self.score(measured))
    }

    fn vowel_pairs(
        &self,
        reference: &Signal,
        learner: &Signal,
        reference_word: &Word,
        learner_word: &Word,
    ) -> PairOutcome<Vec<VowelPair>> {
        let word = reference_word.text.as_str();
        let reference_segment =
            match extract_segment(reference, reference_word.start, reference_word.end) {
                Ok(segment) => segment,
                Err(error) => return PairOutcome::failed(word, error),
            };
        let learner_segment = match extract_segment(learner, learner_word.start, learner_word.end) {
            Ok(segment) => segment,
            Err(error) => return PairOutcome::failed(word, error),
        };

        let reference_vowels = self
            .segmenter
            .find_vowels(&reference_segment.samples, reference_segment.sample_rate);
        let mut learner_vowels = self
            .segmenter
            .find_vowels(&learner_segment.samples, learner_segment.sample_rate);
        if reference_vowels.is_empty() || learner_vowels.is_empty() {
            return PairOutcome::skipped(word, "no vowel spans on one side");
        }
        // Only the learner side is merged; a reference with more spans is left alone.
        while learner_vowels.len() > reference_vowels.len() {
            learner_vowels = merge_closest_intervals(&learner_vowels);
        }

        PairOutcome::Evaluated(
            reference_vowels
                .iter()
                .zip(&learner_vowels)
                .map(|(r, l)| VowelPair {
                    word: word.to_owned(),
                    reference_span: r.shifted(reference_word.start),
                    learner_span: l.shifted(learner_word.start),
                })
                .collect(),
        )
    }

    fn score(&self, measured: Vec<MeasuredPair>) -> PronunciationReport {
        let reference_norm = LobanovNorm::fit(measured.iter().flat_map(|m| m.reference.iter()));
        let learner_norm = LobanovNorm::fit(measured.iter().flat_map(|m| m.learner.iter()));

        let mut compared = 0;
        let mut flagged = Vec::new();
        for m in measured {
            if m.reference.len() < 2 || m.learner.len() < 2 {
                debug!(word = %m.pair.word, "vowel too short for a formant trajectory");
                continue;
            }
            compared += 1;
            let (reference_f1, reference_f2) = reference_norm.apply(&m.reference);
            let (learner_f1, learner_f2) = learner_norm.apply(&m.learner);
            let target = m.reference.len().max(m.learner.len());
            let f1_correlation = pearson(
                &interpolate_to_len(&reference_f1, target),
                &interpolate_to_len(&learner_f1, target),
            );
            let f2_correlation = pearson(
                &interpolate_to_len(&reference_f2, target),
                &interpolate_to_len(&learner_f2, target),
            );
            let below = |c: Option<f64>| c.is_some_and(|c| c < self.config.correlation_threshold);
            if below(f1_correlation) || below(f2_correlation) {
                flagged.push(LowCorrelationVowel {
                    word: m.pair.word,
                    reference_span: m.pair.reference_span,
                    learner_span: m.pair.learner_span,
                    f1_correlation,
                    f2_correlation,
                });
            }
        }

        let accuracy = pronunciation_accuracy(compared, flagged.len());
        info!(
            compared,
            flagged = flagged.len(),
            accuracy,
            "scored vowel pronunciation"
        );
        PronunciationReport {
            low_correlation_vowels: flagged,
            accuracy,
            compared,
        }
    }
}

/// Each reference word takes the first not-yet-used learner word with the same text.
fn align_words<'a>(reference: &'a [Word], learner: &'a [Word]) -> Vec<(&'a Word, &'a Word)> {
    let mut used = vec![false; learner.len()];
    reference
        .iter()
        .filter_map(|reference_word| {
            let index = learner
                .iter()
                .enumerate()
                .position(|(i, w)| !used[i] && w.text == reference_word.text)?;
            used[index] = true;
            Some((reference_word, &learner[index]))
        })
        .collect()
}

pub fn pronunciation_accuracy(compared: usize, flagged: usize) -> f64 {
    if compared == 0 {
        return 0.0;
    }
    (compared.saturating_sub(flagged) as f64 / compared as f64).clamp(0.0, 1.0)
}

/// Per-speaker z-score parameters for F1 and F2.
#[derive(Debug, Clone, Copy)]
struct LobanovNorm {
    f1: Option<(f64, f64)>,
    f2: Option<(f64, f64)>,
}

impl LobanovNorm {
    fn fit<'a>(points: impl Iterator<Item = &'a FormantPoint>) -> Self {
        let (f1, f2): (Vec<f64>, Vec<f64>) = points.map(|p| (p.f1_hz, p.f2_hz)).unzip();
        Self {
            f1: mean_std(&f1),
            f2: mean_std(&f2),
        }
    }

    fn apply(&self, track: &[FormantPoint]) -> (Vec<f64>, Vec<f64>) {
        let z = |value: f64, stats: Option<(f64, f64)>| match stats {
            Some((mean, std)) if std > 0.0 => (value - mean) / std,
            _ => 0.0,
        };
        track
            .iter()
            .map(|p| (z(p.f1_hz, self.f1), z(p.f2_hz, self.f2)))
            .unzip()
    }
}
