use tracing::{debug, warn};

use super::pitch::extract_pitch_track;
use super::stats::{interpolate_to_len, mean_std, pearson};
use crate::config::IntonationConfig;
use crate::error::Result;
use crate::types::Signal;

/// Windowed pitch profiles for both speakers and their similarity in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct IntonationOutcome {
    pub reference_contour: Vec<f64>,
    pub learner_contour: Vec<f64>,
    pub similarity: f64,
}

#[derive(Debug, Clone, Default)]
pub struct IntonationComparator {
    config: IntonationConfig,
}

impl IntonationComparator {
    pub fn new(config: IntonationConfig) -> Self {
        Self { config }
    }

    pub fn intonation_similarity(
        &self,
        reference: &Signal,
        learner: &Signal,
    ) -> Result<IntonationOutcome> {
        let (reference_track, learner_track) = rayon::join(
            || extract_pitch_track(reference, &self.config),
            || extract_pitch_track(learner, &self.config),
        );
        let outcome = self.compare_pitch_tracks(&reference_track?, &learner_track?);
        debug!(similarity = outcome.similarity, "compared intonation contours");
        Ok(outcome)
    }

    /// Compare two already-extracted voiced pitch tracks.
    pub fn compare_pitch_tracks(&self, reference: &[f64], learner: &[f64]) -> IntonationOutcome {
        let reference = filter_outliers(reference, self.config.outlier_std_devs);
        let learner = filter_outliers(learner, self.config.outlier_std_devs);
        if reference.is_empty() || learner.is_empty() {
            warn!(
                reference_frames = reference.len(),
                learner_frames = learner.len(),
                "no voiced pitch on one side; intonation similarity is 0"
            );
            return IntonationOutcome {
                reference_contour: window_profile(&reference, self.config.window_size),
                learner_contour: window_profile(&learner, self.config.window_size),
                similarity: 0.0,
            };
        }

        let target = reference.len().max(learner.len());
        let reference_contour =
            window_profile(&interpolate_to_len(&reference, target), self.config.window_size);
        let learner_contour =
            window_profile(&interpolate_to_len(&learner, target), self.config.window_size);

        let similarity = match pearson(&reference_contour, &learner_contour) {
            Some(correlation) => ((correlation + 1.0) / 2.0).clamp(0.0, 1.0),
            None if reference_contour == learner_contour => 1.0,
            None => 0.0,
        };
        IntonationOutcome {
            reference_contour,
            learner_contour,
            similarity,
        }
    }
}

/// Keep samples within `mean ± k·σ`; a flat track is returned unchanged.
pub fn filter_outliers(track: &[f64], std_devs: f64) -> Vec<f64> {
    let Some((mean, std)) = mean_std(track) else {
        return Vec::new();
    };
    let limit = std_devs * std;
    track
        .iter()
        .copied()
        .filter(|&value| (value - mean).abs() <= limit)
        .collect()
}

/// Share of the track total falling in each window of `window` samples.
pub fn window_profile(track: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    let total: f64 = track.iter().sum();
    if total == 0.0 {
        return vec![0.0; track.len().div_ceil(window)];
    }
    track
        .chunks(window)
        .map(|chunk| chunk.iter().sum::<f64>() / total)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn outliers_beyond_two_sigma_are_dropped() {
        let mut track = vec![100.0; 20];
        track.push(400.0);
        let kept = filter_outliers(&track, 2.0);
        assert_eq!(kept.len(), 20);
        assert!(kept.iter().all(|&v| v == 100.0));
    }

    #[test]
    fn flat_track_survives_filter() {
        assert_eq!(filter_outliers(&[120.0; 5], 2.0), vec![120.0; 5]);
        assert!(filter_outliers(&[], 2.0).is_empty());
    }

    #[test]
    fn profile_keeps_trailing_partial_window() {
        let profile = window_profile(&[1.0; 25], 10);
        assert_eq!(profile.len(), 3);
        assert_abs_diff_eq!(profile[0], 0.4);
        assert_abs_diff_eq!(profile[2], 0.2);
        assert_abs_diff_eq!(profile.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn zero_total_gives_zero_profile() {
        assert_eq!(window_profile(&[0.0; 25], 10), vec![0.0; 3]);
        assert_eq!(
            window_profile(&[0.0; 25], 10).len(),
            window_profile(&[1.0; 25], 10).len()
        );
    }

    #[test]
    fn shorter_track_is_stretched_to_longer() {
        let comparator = IntonationComparator::default();
        let long: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let short: Vec<f64> = (0..20).map(|i| 100.0 + 2.0 * i as f64).collect();
        let outcome = comparator.compare_pitch_tracks(&long, &short);
        assert_eq!(outcome.reference_contour.len(), 4);
        assert_eq!(outcome.learner_contour.len(), 4);
        assert!(outcome.similarity > 0.99);
    }

    #[test]
    fn empty_side_scores_zero() {
        let outcome = IntonationComparator::default().compare_pitch_tracks(&[120.0; 30], &[]);
        assert_eq!(outcome.similarity, 0.0);
        assert!(outcome.learner_contour.is_empty());
    }
}
