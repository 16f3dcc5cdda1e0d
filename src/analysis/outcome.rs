use tracing::warn;

use crate::error::AnalysisError;

/// Result of evaluating one aligned word pair.
///
/// Pairs are independent: a skipped or failed pair never stops the others.
#[derive(Debug)]
pub enum PairOutcome<T> {
    Evaluated(T),
    Skipped { word: String, reason: String },
    Failed { word: String, error: AnalysisError },
}

impl<T> PairOutcome<T> {
    pub fn skipped(word: &str, reason: impl Into<String>) -> Self {
        Self::Skipped {
            word: word.to_owned(),
            reason: reason.into(),
        }
    }

    pub fn failed(word: &str, error: AnalysisError) -> Self {
        Self::Failed {
            word: word.to_owned(),
            error,
        }
    }
}

/// Tally of a fan-out, kept for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeCounts {
    pub evaluated: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Keep evaluated values, logging every skip and failure under `dimension`.
pub fn collect_evaluated<T>(
    dimension: &'static str,
    outcomes: Vec<PairOutcome<T>>,
) -> (Vec<T>, OutcomeCounts) {
    let mut counts = OutcomeCounts::default();
    let mut values = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        match outcome {
            PairOutcome::Evaluated(value) => {
                counts.evaluated += 1;
                values.push(value);
            }
            PairOutcome::Skipped { word, reason } => {
                counts.skipped += 1;
                warn!(dimension, word = %word, reason = %reason, "skipped word pair");
            }
            PairOutcome::Failed { word, error } => {
                counts.failed += 1;
                warn!(dimension, word = %word, error = %error, "word pair comparison failed");
            }
        }
    }
    (values, counts)
}
