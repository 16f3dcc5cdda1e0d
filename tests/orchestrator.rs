mod common;

use approx::assert_abs_diff_eq;
use lectorcmp::config::PitchMethod;
use lectorcmp::types::ComparisonResult;
use lectorcmp::{
    AnalysisConfig, AnalysisError, AnalysisOrchestrator, ComparisonRequest, TimeRange, Word,
};

use common::{concat, glide, noise, signal, three_vowel_word};

/// Reference: 1 s lead-in, "komputer" (0.85 s), "tak" on a glide, tail.
fn reference_audio() -> Vec<f32> {
    concat(&[
        noise(1.0, 0.05, 1),
        three_vowel_word([0.5, 0.35, 0.35], 2),
        glide(150.0, 230.0, 0.4, 0.5),
        noise(0.5, 0.05, 3),
    ])
}

fn reference_words() -> Vec<Word> {
    vec![
        Word::new("dzień", 0.2, 0.7),
        Word::new("komputer", 1.0, 1.85),
        Word::new("tak", 1.85, 2.25),
        Word::new("później", 2.4, 2.7),
    ]
}

fn request() -> ComparisonRequest {
    let reference = signal(reference_audio());
    let range = TimeRange::new(1.0, 2.25);
    let learner = reference.slice_seconds(range.start, range.end);
    ComparisonRequest {
        reference,
        learner,
        range,
        reference_words: reference_words(),
        learner_words: vec![Word::new("komputer", 0.0, 0.85), Word::new("tak", 0.85, 1.25)],
    }
}

fn orchestrator() -> AnalysisOrchestrator {
    let mut config = AnalysisConfig::default();
    config.orchestrator.worker_threads = Some(2);
    AnalysisOrchestrator::new(config).unwrap()
}

#[test]
fn perfect_repetition_scores_high_everywhere() {
    let result = orchestrator().compare(&request()).unwrap();
    assert_abs_diff_eq!(result.lexical_accuracy, 1.0);
    assert_eq!(result.transcription.reference, "komputer tak");
    assert_eq!(result.transcription.learner, "komputer tak");
    assert!(result.accent_mismatches.is_empty());
    assert_abs_diff_eq!(result.accent_accuracy, 1.0);
    assert_abs_diff_eq!(result.intonation_similarity, 1.0, epsilon = 1e-9);
    assert!((0.0..=1.0).contains(&result.pronunciation_accuracy));
}

#[test]
fn shifted_stress_lowers_accent_accuracy() {
    let mut req = request();
    req.learner = signal(concat(&[
        three_vowel_word([0.35, 0.35, 0.5], 9),
        glide(150.0, 230.0, 0.4, 0.5),
    ]));
    let result = orchestrator().compare(&req).unwrap();
    assert_eq!(result.accent_mismatches.len(), 1);
    assert_abs_diff_eq!(result.accent_accuracy, 0.5);
}

#[test]
fn empty_learner_audio_is_rejected_before_analysis() {
    let mut req = request();
    req.learner = signal(Vec::new());
    let err = orchestrator().compare(&req).unwrap_err();
    assert!(matches!(err, AnalysisError::MalformedInput { .. }), "{err}");
    assert!(err.failed_dimension().is_none());
}

#[test]
fn range_outside_recording_is_rejected() {
    let mut req = request();
    req.range = TimeRange::new(10.0, 11.0);
    assert!(matches!(
        orchestrator().compare(&req),
        Err(AnalysisError::MalformedInput { .. })
    ));
}

#[test]
fn malformed_word_is_rejected() {
    let mut req = request();
    req.learner_words.push(Word::new("zły", 2.0, 1.0));
    assert!(matches!(
        orchestrator().compare(&req),
        Err(AnalysisError::MalformedInput { .. })
    ));
}

#[test]
fn missing_learner_transcript_scores_floor() {
    let mut req = request();
    req.learner_words.clear();
    let result = orchestrator().compare(&req).unwrap();
    assert_abs_diff_eq!(result.lexical_accuracy, 0.05);
    assert_abs_diff_eq!(result.accent_accuracy, 0.05);
    assert_eq!(result.pronunciation_accuracy, 0.0);
}

#[test]
fn pronunciation_can_be_disabled() {
    let mut config = AnalysisConfig::default();
    config.orchestrator.score_pronunciation = false;
    let result = AnalysisOrchestrator::new(config)
        .unwrap()
        .compare(&request())
        .unwrap();
    assert_eq!(result.pronunciation_accuracy, 0.0);
}

#[test]
fn pyin_pitch_method_completes_comparison() {
    let mut config = AnalysisConfig::default();
    config.intonation.method = PitchMethod::Pyin;
    let result = AnalysisOrchestrator::new(config)
        .unwrap()
        .compare(&request())
        .unwrap();
    assert!(!result.intonation.reference.is_empty());
    assert_abs_diff_eq!(result.intonation_similarity, 1.0, epsilon = 1e-9);
}

#[test]
fn result_round_trips_through_json() {
    let result = orchestrator().compare(&request()).unwrap();
    let json = result.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    for key in [
        "wordsAccuracy",
        "transcription",
        "accentAccuracy",
        "accent",
        "intonationAccuracy",
        "intonation",
        "pronunciationAccuracy",
    ] {
        assert!(value.get(key).is_some(), "missing {key}");
    }
    assert!(value["intonation"].get("lectorIntonation").is_some());
    assert!(value["transcription"].get("userTranscription").is_some());

    let back: ComparisonResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back, result);
}

#[test]
fn pauses_cover_whole_transcript() {
    assert_eq!(orchestrator().detect_pauses(&reference_words()), vec![850]);
}
