//! Emulation error types.

use cds_core::{ContestStatus, CoreError};
use std::time::Duration;

/// Emulation result type
pub type EmulationResult<T> = Result<T, EmulationError>;

/// Emulation error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EmulationError {
    /// Update source closed before the contest was finalized
    #[error("update stream ended before the contest was finalized (status {status}, {runs} runs seen)")]
    StreamEnded {
        /// Last tracked status
        status: ContestStatus,
        /// Distinct runs seen
        runs: usize,
    },

    /// Rejected configuration value
    #[error("invalid emulation config: {field}: {reason}")]
    InvalidConfig {
        /// Offending field
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },

    /// Offset scaled by speed does not fit a wall clock instant
    #[error("offset {offset:?} at speed x{speed} has no representable deadline")]
    DeadlineOverflow {
        /// Logical offset
        offset: Duration,
        /// Emulation speed
        speed: f64,
    },

    /// Stopped by a cancellation request
    #[error("emulation cancelled")]
    Cancelled,

    /// Data model error
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl EmulationError {
    /// Reject an emulation speed
    pub(crate) fn invalid_speed(speed: f64) -> Self {
        Self::InvalidConfig {
            field: "emulation_speed",
            reason: format!("must be finite and positive, got {speed}"),
        }
    }
}
