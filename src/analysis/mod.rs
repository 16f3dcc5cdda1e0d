//! Comparators for each scored dimension and the orchestrator that runs them.

pub mod accent;
pub mod formants;
pub mod intonation;
pub mod orchestrator;
pub mod outcome;
pub mod pauses;
pub mod pitch;
pub mod pronunciation;
pub mod stats;
pub mod syllables;
pub mod vowels;
pub mod words;

pub use accent::AccentComparator;
pub use intonation::{IntonationComparator, IntonationOutcome};
pub use orchestrator::{AnalysisOrchestrator, ComparisonRequest};
pub use outcome::PairOutcome;
pub use pauses::PauseDetector;
pub use pronunciation::{PronunciationComparator, PronunciationReport};
pub use vowels::VowelSegmenter;
pub use words::{SequenceAccuracy, WordAligner};
