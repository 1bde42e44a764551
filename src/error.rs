//! Error types shared by the scheduling engine and its collaborators.

/// A malformed input value, usually one availability slot or one user-entered rating.
///
/// These are reported and skipped; one bad entry never aborts a whole batch.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("day of week {0} is out of range (expected 0-6)")]
    DayOutOfRange(u8),
    #[error("time range {start}-{end} is empty (start must be before end)")]
    EmptyRange { start: String, end: String },
    #[error("invalid time of day: {0:?}")]
    InvalidTime(String),
    #[error("UTR rating {0} is out of range (expected 1.00-16.50)")]
    UtrOutOfRange(f64),
    #[error("skill quiz has no answers")]
    EmptyQuiz,
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

/// Errors raised by the pure scheduling computations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchedulingError {
    /// The caller passed parameters that can never produce a meaningful result.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Errors surfaced by the service layer wrapping the engine.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Scheduling(#[from] SchedulingError),
    /// An external collaborator (availability store, calendar, ...) failed.
    #[error("{source_name} unavailable: {message}")]
    Source {
        source_name: &'static str,
        message: String,
    },
}

impl ServiceError {
    pub fn source_unavailable(source_name: &'static str, message: impl Into<String>) -> Self {
        Self::Source {
            source_name,
            message: message.into(),
        }
    }
}
