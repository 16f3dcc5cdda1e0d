use thiserror::Error;

/// Convenient alias for results returned by analysis modules.
pub type Result<T> = std::result::Result<T, AnalysisError>;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("insufficient signal while {context}: {message}")]
    InsufficientSignal {
        context: &'static str,
        message: String,
    },
    #[error("no matching words between learner and reference: {message}")]
    AlignmentMismatch { message: String },
    #[error("upstream service unavailable while {context}: {message}")]
    UpstreamUnavailable {
        context: &'static str,
        message: String,
    },
    #[error("malformed input: {message}")]
    MalformedInput { message: String },
    #[error("analysis task panicked: {message}")]
    TaskPanicked { message: String },
    #[error("{dimension} dimension could not be computed: {source}")]
    Dimension {
        dimension: &'static str,
        #[source]
        source: Box<AnalysisError>,
    },
    #[error("I/O error while {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON parse error while {context}: {source}")]
    Json {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl AnalysisError {
    pub(crate) fn insufficient(context: &'static str, message: impl Into<String>) -> Self {
        Self::InsufficientSignal {
            context,
            message: message.into(),
        }
    }

    pub(crate) fn alignment(message: impl Into<String>) -> Self {
        Self::AlignmentMismatch {
            message: message.into(),
        }
    }

    pub(crate) fn upstream(context: &'static str, err: impl std::fmt::Display) -> Self {
        Self::UpstreamUnavailable {
            context,
            message: err.to_string(),
        }
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedInput {
            message: message.into(),
        }
    }

    pub(crate) fn dimension(dimension: &'static str, source: AnalysisError) -> Self {
        Self::Dimension {
            dimension,
            source: Box::new(source),
        }
    }

    pub(crate) fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }

    pub(crate) fn json(context: &'static str, source: serde_json::Error) -> Self {
        Self::Json { context, source }
    }

    /// Name of the failing dimension when this error came out of the orchestrator.
    pub fn failed_dimension(&self) -> Option<&'static str> {
        match self {
            Self::Dimension { dimension, .. } => Some(*dimension),
            _ => None,
        }
    }
}
