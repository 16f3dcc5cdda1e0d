mod common;

use lectorcmp::analysis::accent::{accent_accuracy, AccentComparator};
use lectorcmp::config::{AccentConfig, EnergyUnit, VowelConfig};
use lectorcmp::types::{TimeRange, Word};

use common::{concat, noise, signal, three_vowel_word};

const FIRST_STRESS: [f64; 3] = [0.5, 0.35, 0.35];
const LAST_STRESS: [f64; 3] = [0.35, 0.35, 0.5];

/// A reference recording with 0.5 s of lead-in before the word, and the
/// excerpt that starts at that lead-in.
fn reference_excerpt(stress: [f64; 3]) -> (lectorcmp::Signal, TimeRange, Vec<Word>) {
    let full = signal(concat(&[noise(1.0, 0.05, 90), three_vowel_word(stress, 91)]));
    let range = TimeRange::new(0.5, 1.85);
    let words = vec![Word::new("komputer", 1.0, 1.85)];
    (full.slice_seconds(range.start, range.end), range, words)
}

fn learner(stress: [f64; 3]) -> (lectorcmp::Signal, Vec<Word>) {
    let audio = signal(concat(&[noise(0.2, 0.05, 70), three_vowel_word(stress, 71)]));
    (audio, vec![Word::new("komputer", 0.2, 1.05)])
}

#[test]
fn shifted_stress_is_reported() {
    let (excerpt, range, reference_words) = reference_excerpt(FIRST_STRESS);
    let (learner_audio, learner_words) = learner(LAST_STRESS);
    let mismatches = AccentComparator::default().compare_accents(
        &excerpt,
        &range,
        &learner_audio,
        &reference_words,
        &learner_words,
    );
    assert_eq!(mismatches.len(), 1);
    let mismatch = &mismatches[0];
    assert_eq!(mismatch.word, "komputer");
    assert_eq!(mismatch.reference_signal.len(), 500);
    assert_eq!(mismatch.learner_signal.len(), 500);
    assert_eq!(mismatch.reference_energy_profile.len(), 3);
    assert!(mismatch.reference_energy_profile[0] > mismatch.reference_energy_profile[2]);
    assert!(mismatch.learner_energy_profile[2] > mismatch.learner_energy_profile[0]);
}

#[test]
fn matching_stress_is_not_reported() {
    let (excerpt, range, reference_words) = reference_excerpt(FIRST_STRESS);
    let (learner_audio, learner_words) = learner(FIRST_STRESS);
    let mismatches = AccentComparator::default().compare_accents(
        &excerpt,
        &range,
        &learner_audio,
        &reference_words,
        &learner_words,
    );
    assert!(mismatches.is_empty());
}

#[test]
fn syllable_energy_unit_still_flags_shifted_stress() {
    let comparator = AccentComparator::new(
        VowelConfig::default(),
        AccentConfig {
            energy_unit: EnergyUnit::Syllable,
            ..AccentConfig::default()
        },
    );
    let (excerpt, range, reference_words) = reference_excerpt(FIRST_STRESS);
    let (learner_audio, learner_words) = learner(LAST_STRESS);
    let mismatches = comparator.compare_accents(
        &excerpt,
        &range,
        &learner_audio,
        &reference_words,
        &learner_words,
    );
    assert_eq!(mismatches.len(), 1);
}

#[test]
fn word_beyond_learner_audio_is_skipped_not_fatal() {
    let (excerpt, range, reference_words) = reference_excerpt(FIRST_STRESS);
    let (learner_audio, _) = learner(LAST_STRESS);
    let late = vec![Word::new("komputer", 5.0, 5.8)];
    let mismatches = AccentComparator::default().compare_accents(
        &excerpt,
        &range,
        &learner_audio,
        &reference_words,
        &late,
    );
    assert!(mismatches.is_empty());
}

#[test]
fn unknown_words_produce_nothing() {
    let (excerpt, range, reference_words) = reference_excerpt(FIRST_STRESS);
    let (learner_audio, _) = learner(LAST_STRESS);
    let other = vec![Word::new("telewizor", 0.2, 1.05)];
    assert!(AccentComparator::default()
        .compare_accents(&excerpt, &range, &learner_audio, &reference_words, &other)
        .is_empty());
}

#[test]
fn accuracy_over_learner_words() {
    assert_eq!(accent_accuracy(4, 1, 0.05), 0.75);
    assert_eq!(accent_accuracy(0, 0, 0.05), 0.05);
}
