use rayon::prelude::*;
use tracing::{debug, info};

use super::outcome::{collect_evaluated, PairOutcome};
use super::stats::{pearson, rms};
use super::syllables::count_syllables;
use super::vowels::{find_syllables, merge_down_to, VowelSegmenter};
use crate::audio::slicer::{extract_segment, sample_for_chart, segment_samples};
use crate::config::{AccentConfig, EnergyUnit, VowelConfig};
use crate::types::{AccentMismatch, Signal, TimeInterval, TimeRange, Word};

#[derive(Debug, Clone, Default)]
pub struct AccentComparator {
    segmenter: VowelSegmenter,
    config: AccentConfig,
}

impl AccentComparator {
    pub fn new(vowels: VowelConfig, config: AccentConfig) -> Self {
        Self {
            segmenter: VowelSegmenter::new(vowels),
            config,
        }
    }

    /// Long words whose stress profile diverges between the two speakers.
    ///
    /// `reference_excerpt` starts at `range.start`; `reference_words` are in
    /// full-recording time and are rebased here. Pairs without enough vowel
    /// evidence are treated as matching.
    pub fn compare_accents(
        &self,
        reference_excerpt: &Signal,
        range: &TimeRange,
        learner: &Signal,
        reference_words: &[Word],
        learner_words: &[Word],
    ) -> Vec<AccentMismatch> {
        if reference_words.is_empty() || learner_words.is_empty() {
            return Vec::new();
        }
        let rebased = range.rebase_all(reference_words);
        let aligned = self.align_long_words(&rebased, learner_words);
        debug!(pairs = aligned.len(), "aligned long words for accent comparison");

        let outcomes: Vec<PairOutcome<Option<AccentMismatch>>> = aligned
            .par_iter()
            .map(|(reference_word, learner_word)| {
                self.compare_word(reference_excerpt, learner, reference_word, learner_word)
            })
            .collect();
        let (evaluated, counts) = collect_evaluated("accent", outcomes);
        let mismatches: Vec<AccentMismatch> = evaluated.into_iter().flatten().collect();
        info!(
            evaluated = counts.evaluated,
            skipped = counts.skipped,
            failed = counts.failed,
            mismatches = mismatches.len(),
            "compared word stress"
        );
        mismatches
    }

    /// Forward-only greedy alignment: a reference word not found after the
    /// cursor is dropped and the cursor stays put.
    fn align_long_words<'a>(
        &self,
        reference: &'a [Word],
        learner: &'a [Word],
    ) -> Vec<(&'a Word, &'a Word)> {
        let mut cursor = 0;
        let mut aligned = Vec::new();
        for reference_word in reference {
            if count_syllables(&reference_word.text, self.config.syllable_counter)
                < self.config.long_word_min_syllables
            {
                continue;
            }
            if let Some(offset) = learner[cursor..]
                .iter()
                .position(|w| w.text == reference_word.text)
            {
                aligned.push((reference_word, &learner[cursor + offset]));
                cursor += offset + 1;
            }
        }
        aligned
    }

    fn compare_word(
        &self,
        reference: &Signal,
        learner: &Signal,
        reference_word: &Word,
        learner_word: &Word,
    ) -> PairOutcome<Option<AccentMismatch>> {
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

        let expected = count_syllables(word, self.config.syllable_counter);
        let reference_units = self.stress_units(&reference_segment, expected);
        let learner_units = self.stress_units(&learner_segment, expected);
        if reference_units.len() < self.config.min_vowel_spans
            || learner_units.len() < self.config.min_vowel_spans
        {
            return PairOutcome::skipped(word, "fewer vowel spans than needed");
        }
        if reference_units.len() != learner_units.len() {
            return PairOutcome::skipped(
                word,
                format!(
                    "vowel counts differ ({} vs {})",
                    reference_units.len(),
                    learner_units.len()
                ),
            );
        }

        let (Some(reference_profile), Some(learner_profile)) = (
            stress_profile(&reference_segment, &reference_units),
            stress_profile(&learner_segment, &learner_units),
        ) else {
            return PairOutcome::skipped(word, "silent vowel spans");
        };
        let Some(correlation) = pearson(&reference_profile, &learner_profile) else {
            return PairOutcome::skipped(word, "flat stress profile");
        };
        debug!(word, correlation, "stress profile correlation");

        if correlation > self.config.correlation_threshold {
            return PairOutcome::Evaluated(None);
        }
        PairOutcome::Evaluated(Some(AccentMismatch {
            word: word.to_owned(),
            reference_energy_profile: reference_profile,
            learner_energy_profile: learner_profile,
            reference_signal: sample_for_chart(
                &reference_segment.samples,
                self.config.chart_points,
            ),
            learner_signal: sample_for_chart(&learner_segment.samples, self.config.chart_points),
        }))
    }

    /// Vowel spans merged down to the expected syllable count, optionally
    /// widened into syllables.
    fn stress_units(&self, segment: &Signal, expected: usize) -> Vec<TimeInterval> {
        let vowels = self
            .segmenter
            .find_vowels(&segment.samples, segment.sample_rate);
        let merged = merge_down_to(&vowels, expected);
        match self.config.energy_unit {
            EnergyUnit::Vowel => merged,
            EnergyUnit::Syllable => find_syllables(0.0, segment.duration(), &merged),
        }
    }
}

/// RMS of each unit as a percentage of the summed RMS; `None` when silent.
fn stress_profile(segment: &Signal, units: &[TimeInterval]) -> Option<Vec<f64>> {
    let energies: Vec<f64> = units
        .iter()
        .map(|unit| {
            rms(segment_samples(
                &segment.samples,
                segment.sample_rate,
                unit.start,
                unit.end,
            ))
        })
        .collect();
    let total: f64 = energies.iter().sum();
    if total <= 0.0 {
        return None;
    }
    Some(energies.iter().map(|e| e / total * 100.0).collect())
}

/// Share of learner words without a stress mismatch.
pub fn accent_accuracy(learner_word_count: usize, mismatches: usize, floor: f64) -> f64 {
    if learner_word_count == 0 {
        return floor;
    }
    let matched = learner_word_count.saturating_sub(mismatches) as f64;
    (matched / learner_word_count as f64).clamp(0.0, 1.0)
}
