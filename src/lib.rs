//! Comparative speech analysis: scores a learner's repetition of a reference
//! excerpt on words, stress, intonation and vowel pronunciation.

pub mod analysis;
pub mod audio;
pub mod cli;
pub mod config;
pub mod error;
pub mod transcript;
pub mod types;

pub use analysis::{AnalysisOrchestrator, ComparisonRequest};
pub use config::AnalysisConfig;
pub use error::{AnalysisError, Result};
pub use types::{ComparisonResult, Signal, TimeRange, Word};
