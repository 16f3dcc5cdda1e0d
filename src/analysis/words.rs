use std::collections::HashSet;

use tracing::debug;

use crate::config::WordConfig;
use crate::error::{AnalysisError, Result};
use crate::types::Word;

/// Lexical score plus the joined texts shown to the learner.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceAccuracy {
    pub score: f64,
    pub reference_text: String,
    pub learner_text: String,
}

#[derive(Debug, Clone, Default)]
pub struct WordAligner {
    config: WordConfig,
}

impl WordAligner {
    pub fn new(config: WordConfig) -> Self {
        Self { config }
    }

    /// Share of learner words found anywhere in the reference, capped at 1.
    ///
    /// This is a membership check: order and repetitions are not penalised.
    /// An empty reference or zero matches yields the configured floor.
    pub fn sequence_accuracy(&self, learner: &[Word], reference: &[Word]) -> SequenceAccuracy {
        let score = match_ratio(learner, reference).unwrap_or_else(|err| {
            debug!(error = %err, floor = self.config.no_match_floor, "using word floor");
            self.config.no_match_floor
        });

        SequenceAccuracy {
            score,
            reference_text: join_words(reference),
            learner_text: join_words(learner),
        }
    }
}

fn match_ratio(learner: &[Word], reference: &[Word]) -> Result<f64> {
    if reference.is_empty() {
        return Err(AnalysisError::alignment("reference excerpt has no words"));
    }
    let vocabulary: HashSet<&str> = reference.iter().map(|w| w.text.as_str()).collect();
    let matched = learner
        .iter()
        .filter(|w| vocabulary.contains(w.text.as_str()))
        .count();
    if matched == 0 {
        return Err(AnalysisError::alignment(format!(
            "none of {} learner words occur in the reference",
            learner.len()
        )));
    }
    Ok((matched as f64 / reference.len() as f64).min(1.0))
}

/// Words whose whole span lies within `[start, end]`.
pub fn matching_words_for_time_range(start: f64, end: f64, words: &[Word]) -> Vec<Word> {
    words
        .iter()
        .filter(|w| start <= w.start && w.end <= end)
        .cloned()
        .collect()
}

pub fn join_words(words: &[Word]) -> String {
    words
        .iter()
        .map(|w| w.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(texts: &[&str]) -> Vec<Word> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| Word::new(*t, i as f64, i as f64 + 0.5))
            .collect()
    }

    #[test]
    fn time_range_keeps_fully_contained_words() {
        let all = vec![
            Word::new("before", 0.0, 0.9),
            Word::new("straddle", 0.9, 1.2),
            Word::new("inside", 1.2, 1.8),
            Word::new("edge", 1.8, 2.0),
            Word::new("after", 2.0, 2.5),
        ];
        let picked = matching_words_for_time_range(1.0, 2.0, &all);
        assert_eq!(join_words(&picked), "inside edge");
    }

    #[test]
    fn floor_applies_without_matches() {
        let aligner = WordAligner::default();
        let result =
            aligner.sequence_accuracy(&words(&["different", "words"]), &words(&["these", "are"]));
        assert_eq!(result.score, 0.05);
    }

    #[test]
    fn disjoint_transcripts_are_an_alignment_mismatch() {
        assert!(matches!(
            match_ratio(&words(&["kot"]), &words(&["pies"])),
            Err(AnalysisError::AlignmentMismatch { .. })
        ));
        assert!(matches!(
            match_ratio(&words(&["kot"]), &[]),
            Err(AnalysisError::AlignmentMismatch { .. })
        ));
        assert_eq!(match_ratio(&words(&["kot"]), &words(&["kot", "pies"])).unwrap(), 0.5);
    }
}
