//! Error types for lazyqlib

use thiserror::Error;

use crate::query::StageKind;

/// Boxed error raised by a user-supplied predicate or transform.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while building inputs for or draining a query
#[derive(Error, Debug)]
pub enum QueryError {
    /// A predicate or transform failed on a specific element
    #[error("{stage} failed at element {position}: {source}")]
    Evaluation {
        stage: StageKind,
        position: usize,
        source: BoxError,
    },

    /// An aggregate that needs at least one element was given none
    #[error("{operation} requires a non-empty sequence")]
    EmptySequence { operation: &'static str },

    /// An integer aggregate left the range of its value type
    #[error("{operation} overflowed")]
    Overflow { operation: &'static str },

    /// Two keys could not be ordered against each other
    #[error("{stage} could not compare keys: {message}")]
    KeyMismatch { stage: StageKind, message: String },

    /// No sample is registered under this id
    #[error("unknown sample: {0}")]
    UnknownSample(String),

    /// The dataset fixture could not be parsed
    #[error("invalid dataset: {0}")]
    Dataset(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl QueryError {
    pub fn evaluation(stage: StageKind, position: usize, source: impl Into<BoxError>) -> Self {
        Self::Evaluation {
            stage,
            position,
            source: source.into(),
        }
    }

    pub fn empty(operation: &'static str) -> Self {
        Self::EmptySequence { operation }
    }

    pub fn overflow(operation: &'static str) -> Self {
        Self::Overflow { operation }
    }

    pub fn key_mismatch(stage: StageKind, message: impl Into<String>) -> Self {
        Self::KeyMismatch {
            stage,
            message: message.into(),
        }
    }

    /// Position of the failing element, for evaluation errors.
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::Evaluation { position, .. } => Some(*position),
            _ => None,
        }
    }

    /// Stage that raised the error, when there is one.
    pub fn stage(&self) -> Option<StageKind> {
        match self {
            Self::Evaluation { stage, .. } | Self::KeyMismatch { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
