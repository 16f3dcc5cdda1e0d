//! Vowel-bearing interval detection from three independent frame cues.
//!
//! Each cue (RMS energy, zero-crossing rate, zero-lag autocorrelation) marks
//! the frames that beat the signal-wide mean. Qualifying frames are merged
//! into ranges and short ranges are dropped. A 1 ms sub-frame is accepted as
//! vowel-bearing when the cues covering it push its confidence past the
//! configured threshold, which with the defaults means all three must agree.

use crate::config::VowelConfig;
use crate::types::{TimeInterval, VowelSpan};

#[derive(Debug, Clone, Default)]
pub struct VowelSegmenter {
    config: VowelConfig,
}

impl VowelSegmenter {
    pub fn new(config: VowelConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &VowelConfig {
        &self.config
    }

    /// Ordered, non-overlapping vowel spans, each at least `min_frames` long.
    pub fn find_vowels(&self, samples: &[f32], sample_rate: u32) -> Vec<VowelSpan> {
        let frame_len = samples_per(self.config.frame_ms, sample_rate);
        if samples.len() <= frame_len || sample_rate == 0 {
            return Vec::new();
        }
        let sr = sample_rate as f64;
        let min_duration = self.config.min_frames as f64 * frame_len as f64 / sr;

        let frames = frame_starts(samples.len(), frame_len);
        let cues = [Cue::HighEnergy, Cue::LowZcr, Cue::HighAutocorrelation]
            .map(|cue| cue_ranges(&frames, samples, frame_len, sr, min_duration, cue));
        if cues.iter().any(Vec::is_empty) && self.needs_all_cues() {
            return Vec::new();
        }

        let hop = samples_per(self.config.sub_frame_ms, sample_rate);
        let mut cursors = [0usize; 3];
        let mut accepted: Vec<TimeInterval> = Vec::new();
        let mut index = 0;
        while index < samples.len() {
            let t = index as f64 / sr;
            let mut met = 0u32;
            for (ranges, cursor) in cues.iter().zip(cursors.iter_mut()) {
                while *cursor < ranges.len() && ranges[*cursor].end <= t {
                    *cursor += 1;
                }
                if *cursor < ranges.len() && ranges[*cursor].start <= t {
                    met += 1;
                }
            }
            let confidence = (self.config.confidence_per_cue * met).min(100);
            if confidence > self.config.confidence_threshold {
                accepted.push(TimeInterval::new(t, (index + hop) as f64 / sr));
            }
            index += hop;
        }

        merge_touching(accepted)
            .into_iter()
            .filter(|span| span.duration() + 1e-9 >= min_duration)
            .collect()
    }

    fn needs_all_cues(&self) -> bool {
        self.config.confidence_per_cue * 2 <= self.config.confidence_threshold
    }
}

/// Merge the adjacent pair separated by the smallest gap.
///
/// Spans are sorted by start first; fewer than two spans are returned as-is.
pub fn merge_closest_intervals(spans: &[VowelSpan]) -> Vec<VowelSpan> {
    let mut sorted = spans.to_vec();
    if sorted.len() < 2 {
        return sorted;
    }
    sorted.sort_by(|a, b| a.start.total_cmp(&b.start));
    let closest = (0..sorted.len() - 1)
        .min_by(|&a, &b| {
            let gap_a = sorted[a + 1].start - sorted[a].end;
            let gap_b = sorted[b + 1].start - sorted[b].end;
            gap_a.total_cmp(&gap_b)
        })
        .unwrap_or(0);
    sorted[closest].end = sorted[closest + 1].end;
    sorted.remove(closest + 1);
    sorted
}

/// Repeatedly merge closest spans until at most `target` remain.
pub fn merge_down_to(spans: &[VowelSpan], target: usize) -> Vec<VowelSpan> {
    let mut current = spans.to_vec();
    let target = target.max(1);
    while current.len() > target {
        current = merge_closest_intervals(&current);
    }
    current
}

/// Syllable intervals within `[start, end]` delimited by vowel span ends.
///
/// The first syllable starts at `start` or the first vowel's start,
/// whichever is later; the last syllable is extended to `end`.
pub fn find_syllables(start: f64, end: f64, vowels: &[VowelSpan]) -> Vec<TimeInterval> {
    let inside: Vec<&VowelSpan> = vowels
        .iter()
        .filter(|v| v.end > start && v.start < end)
        .collect();
    let Some(first) = inside.first() else {
        return Vec::new();
    };

    let mut boundary = first.start.max(start);
    let mut syllables = Vec::with_capacity(inside.len());
    for (idx, vowel) in inside.iter().enumerate() {
        let syllable_end = if idx + 1 == inside.len() {
            end
        } else {
            vowel.end.min(end)
        };
        if syllable_end > boundary {
            syllables.push(TimeInterval::new(boundary, syllable_end));
            boundary = syllable_end;
        }
    }
    syllables
}

#[derive(Clone, Copy)]
enum Cue {
    HighEnergy,
    LowZcr,
    HighAutocorrelation,
}

fn samples_per(ms: f64, sample_rate: u32) -> usize {
    ((ms / 1000.0) * sample_rate as f64).floor().max(1.0) as usize
}

fn frame_starts(len: usize, frame_len: usize) -> Vec<usize> {
    (0..len.saturating_sub(frame_len)).step_by(frame_len).collect()
}

fn cue_ranges(
    frames: &[usize],
    samples: &[f32],
    frame_len: usize,
    sr: f64,
    min_duration: f64,
    cue: Cue,
) -> Vec<TimeInterval> {
    let values: Vec<f64> = frames
        .iter()
        .map(|&start| {
            let frame = &samples[start..start + frame_len];
            match cue {
                Cue::HighEnergy => super::stats::rms(frame),
                Cue::LowZcr => zero_crossing_rate(frame),
                Cue::HighAutocorrelation => zero_lag_autocorrelation(frame),
            }
        })
        .collect();
    if values.is_empty() {
        return Vec::new();
    }
    let threshold = values.iter().sum::<f64>() / values.len() as f64;
    let qualifying: Vec<usize> = frames
        .iter()
        .zip(values.iter())
        .filter(|(_, &value)| match cue {
            Cue::LowZcr => value < threshold,
            Cue::HighEnergy | Cue::HighAutocorrelation => value > threshold,
        })
        .map(|(&start, _)| start)
        .collect();

    indices_to_ranges(&qualifying, frame_len, sr)
        .into_iter()
        .filter(|range| range.duration() + 1e-9 >= min_duration)
        .collect()
}

fn zero_crossing_rate(frame: &[f32]) -> f64 {
    if frame.len() < 2 {
        return 0.0;
    }
    let crossings = frame
        .windows(2)
        .filter(|pair| (pair[0] >= 0.0) != (pair[1] >= 0.0))
        .count();
    crossings as f64 / frame.len() as f64
}

fn zero_lag_autocorrelation(frame: &[f32]) -> f64 {
    frame.iter().map(|&s| (s as f64) * (s as f64)).sum()
}

/// Merge frame start indices into contiguous time ranges.
fn indices_to_ranges(indices: &[usize], frame_len: usize, sr: f64) -> Vec<TimeInterval> {
    let Some((&first, rest)) = indices.split_first() else {
        return Vec::new();
    };
    let mut ranges = Vec::new();
    let mut start = first;
    let mut end = first + frame_len;
    for &index in rest {
        if index > end {
            ranges.push(TimeInterval::new(start as f64 / sr, end as f64 / sr));
            start = index;
        }
        end = index + frame_len;
    }
    ranges.push(TimeInterval::new(start as f64 / sr, end as f64 / sr));
    ranges
}

fn merge_touching(segments: Vec<TimeInterval>) -> Vec<TimeInterval> {
    let mut merged: Vec<TimeInterval> = Vec::with_capacity(segments.len());
    for segment in segments {
        match merged.last_mut() {
            Some(current) if segment.start <= current.end + 1e-9 => {
                current.end = current.end.max(segment.end);
            }
            _ => merged.push(segment),
        }
    }
    merged
}
