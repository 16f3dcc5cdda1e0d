use tracing::debug;

use super::stats::percentile;
use crate::config::PauseConfig;
use crate::types::{TimeInterval, Word};

#[derive(Debug, Clone, Default)]
pub struct PauseDetector {
    config: PauseConfig,
}

impl PauseDetector {
    pub fn new(config: PauseConfig) -> Self {
        Self { config }
    }

    /// Pause midpoints in milliseconds, in transcript order.
    pub fn detect_pauses(&self, reference: &[Word]) -> Vec<u64> {
        let candidates = self.silence_between_words(reference);
        let kept = self.filter_duration_anomalies(candidates);
        debug!(pauses = kept.len(), "detected pauses between reference words");
        kept.iter()
            .map(|gap| {
                let midpoint = gap.start + gap.duration() / 2.0;
                (midpoint * 1000.0).round().max(0.0) as u64
            })
            .collect()
    }

    /// Gaps between consecutive words strictly longer than the minimum.
    pub fn silence_between_words(&self, words: &[Word]) -> Vec<TimeInterval> {
        let min_gap = self.config.min_gap_ms / 1000.0;
        words
            .windows(2)
            .filter_map(|pair| {
                let gap = TimeInterval::new(pair[0].end, pair[1].start);
                // Compare in whole microseconds so 0.45 - 0.25 counts as 200 ms.
                let micros = (gap.duration() * 1e6).round();
                (micros > (min_gap * 1e6).round()).then_some(gap)
            })
            .collect()
    }

    fn filter_duration_anomalies(&self, gaps: Vec<TimeInterval>) -> Vec<TimeInterval> {
        let durations: Vec<f64> = gaps.iter().map(TimeInterval::duration).collect();
        let Some(threshold) = percentile(&durations, self.config.anomaly_percentile) else {
            return gaps;
        };
        gaps.into_iter()
            .filter(|gap| gap.duration() >= threshold)
            .collect()
    }
}
