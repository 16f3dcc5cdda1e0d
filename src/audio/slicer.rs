use crate::error::{AnalysisError, Result};
use crate::types::Signal;

/// Cut the samples covering `[start, end)` seconds out of `signal`.
///
/// Indices are truncated toward zero and clamped to the buffer; a span that
/// starts past the end of the signal is an error rather than an empty slice.
pub fn extract_segment(signal: &Signal, start: f64, end: f64) -> Result<Signal> {
    if !start.is_finite() || !end.is_finite() || end < start {
        return Err(AnalysisError::malformed(format!(
            "invalid segment {start:.3}s - {end:.3}s"
        )));
    }
    let start_sample = (start.max(0.0) * signal.sample_rate as f64) as usize;
    if start_sample >= signal.len() {
        return Err(AnalysisError::malformed(format!(
            "segment starting at {start:.3}s lies past the end of a {:.3}s signal",
            signal.duration()
        )));
    }
    Ok(signal.slice_seconds(start, end))
}

/// Borrowing variant used for RMS measurements inside an already-cut word.
pub(crate) fn segment_samples(samples: &[f32], sample_rate: u32, start: f64, end: f64) -> &[f32] {
    let sr = sample_rate as f64;
    let lo = ((start.max(0.0) * sr) as usize).min(samples.len());
    let hi = ((end.max(0.0) * sr) as usize).clamp(lo, samples.len());
    &samples[lo..hi]
}

/// Pick `points` evenly spaced samples for charting a waveform.
pub fn sample_for_chart(samples: &[f32], points: usize) -> Vec<f32> {
    if samples.is_empty() || points == 0 {
        return Vec::new();
    }
    if points == 1 {
        return vec![samples[0]];
    }
    let last = (samples.len() - 1) as f64;
    (0..points)
        .map(|i| {
            let index = (i as f64 * last / (points - 1) as f64) as usize;
            samples[index.min(samples.len() - 1)]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_word_span() {
        let signal = Signal::new((0..1_000).map(|i| i as f32).collect(), 1_000);
        let segment = extract_segment(&signal, 0.25, 0.5).unwrap();
        assert_eq!(segment.len(), 250);
        assert_eq!(segment.samples[0], 250.0);
    }

    #[test]
    fn span_past_end_is_rejected() {
        let signal = Signal::new(vec![0.0; 100], 100);
        assert!(extract_segment(&signal, 1.5, 2.0).is_err());
        assert!(extract_segment(&signal, 0.5, 0.2).is_err());
    }

    #[test]
    fn span_overhanging_end_is_clamped() {
        let signal = Signal::new(vec![0.0; 100], 100);
        assert_eq!(extract_segment(&signal, 0.5, 3.0).unwrap().len(), 50);
    }

    #[test]
    fn chart_sampling_keeps_endpoints() {
        let samples: Vec<f32> = (0..1_001).map(|i| i as f32).collect();
        let chart = sample_for_chart(&samples, 11);
        assert_eq!(chart.len(), 11);
        assert_eq!(chart[0], 0.0);
        assert_eq!(chart[5], 500.0);
        assert_eq!(chart[10], 1_000.0);
    }

    #[test]
    fn chart_of_short_segment_repeats_samples() {
        let chart = sample_for_chart(&[1.0, 2.0], 4);
        assert_eq!(chart, vec![1.0, 1.0, 1.0, 2.0]);
    }
}
