mod common;

use approx::assert_abs_diff_eq;
use lectorcmp::analysis::vowels::{merge_closest_intervals, VowelSegmenter};
use lectorcmp::types::TimeInterval;
use rstest::rstest;

use common::{concat, noise, sine, three_vowel_word, SAMPLE_RATE};

#[test]
fn detects_tone_between_noise() {
    let samples = concat(&[noise(0.2, 0.05, 1), sine(200.0, 0.3, 0.5), noise(0.2, 0.05, 2)]);
    let spans = VowelSegmenter::default().find_vowels(&samples, SAMPLE_RATE);
    assert_eq!(spans.len(), 1, "spans: {spans:?}");
    assert_abs_diff_eq!(spans[0].start, 0.2, epsilon = 0.02);
    assert_abs_diff_eq!(spans[0].end, 0.5, epsilon = 0.02);
}

#[test]
fn separated_tones_give_separate_spans() {
    let samples = concat(&[
        noise(0.2, 0.05, 3),
        sine(180.0, 0.3, 0.5),
        noise(0.2, 0.05, 4),
        sine(240.0, 0.3, 0.5),
        noise(0.2, 0.05, 5),
    ]);
    let spans = VowelSegmenter::default().find_vowels(&samples, SAMPLE_RATE);
    assert_eq!(spans.len(), 2, "spans: {spans:?}");
    assert_abs_diff_eq!(spans[1].start, 0.7, epsilon = 0.02);
    assert_abs_diff_eq!(spans[1].end, 1.0, epsilon = 0.02);
}

#[test]
fn noise_only_has_no_long_vowels() {
    let spans = VowelSegmenter::default().find_vowels(&noise(1.0, 0.3, 9), SAMPLE_RATE);
    assert!(spans.iter().all(|s| s.duration() >= 0.03 - 1e-9));
}

#[rstest]
#[case(three_vowel_word([0.5, 0.35, 0.35], 11))]
#[case(three_vowel_word([0.35, 0.35, 0.5], 21))]
#[case(concat(&[
    sine(150.0, 0.05, 0.4),
    noise(0.05, 0.05, 7),
    sine(300.0, 0.02, 0.4),
    noise(0.3, 0.02, 8),
]))]
#[case(noise(0.5, 0.5, 31))]
#[case(concat(&[vec![0.0; 800], sine(120.0, 0.5, 0.9)]))]
fn spans_are_ordered_disjoint_and_long_enough(#[case] samples: Vec<f32>) {
    let segmenter = VowelSegmenter::default();
    let frame = segmenter.config().frame_ms / 1000.0;
    let floor = segmenter.config().min_frames as f64 * frame;
    let spans = segmenter.find_vowels(&samples, SAMPLE_RATE);
    for span in &spans {
        assert!(span.duration() + 1e-9 >= floor, "short span {span:?}");
    }
    for pair in spans.windows(2) {
        assert!(pair[0].start < pair[1].start);
        assert!(pair[0].end <= pair[1].start, "overlap {pair:?}");
    }
}

#[test]
fn three_vowel_word_has_three_spans() {
    let word = three_vowel_word([0.5, 0.35, 0.35], 41);
    let spans = VowelSegmenter::default().find_vowels(&word, SAMPLE_RATE);
    assert_eq!(spans.len(), 3, "spans: {spans:?}");
}

#[test]
fn closest_pair_is_merged_first() {
    let spans = [
        TimeInterval::new(0.0, 1.0),
        TimeInterval::new(3.0, 4.0),
        TimeInterval::new(10.0, 11.0),
    ];
    assert_eq!(
        merge_closest_intervals(&spans),
        vec![TimeInterval::new(0.0, 4.0), TimeInterval::new(10.0, 11.0)]
    );
}
