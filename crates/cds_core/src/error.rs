//! Core error types for CDS.

use crate::contest::ContestStatus;

/// Core result type
pub type CoreResult<T> = Result<T, CoreError>;

/// Core error type
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    /// Judged fraction outside `0.0..=1.0`
    #[error("Invalid judging percentage: {value}")]
    InvalidPercentage {
        /// Offending value
        value: f64,
    },

    /// State has not reached a terminal status yet
    #[error("Contest is not finalized (status {status})")]
    NotFinalized {
        /// Status at the time of the request
        status: ContestStatus,
    },

    /// Contest info has never been received
    #[error("Contest info missing")]
    MissingInfo,

    /// Malformed serialized update
    #[error("Decode error: {message}")]
    Decode {
        /// Decoder message
        message: String,
    },
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode {
            message: err.to_string(),
        }
    }
}
