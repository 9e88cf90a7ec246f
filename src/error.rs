//! Error types for splitgate
//!
//! Insufficient statistical data is deliberately NOT an error: the evaluator
//! always returns a flagged [`StatisticsResult`](crate::stats::StatisticsResult)
//! rather than failing, so callers never confuse "too early to tell" with a
//! broken experiment.

use thiserror::Error;

use crate::experiment::ExperimentStatus;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Splitgate error types
#[derive(Error, Debug)]
pub enum Error {
    /// Experiment configuration failed validation (bad traffic split,
    /// missing/duplicate control, confidence level out of range, ...)
    #[error("validation failed for `{field}`: {reason}")]
    Validation {
        /// Field or aspect of the experiment that failed validation
        field: &'static str,
        /// Human-readable reason suitable for surfacing to the test designer
        reason: String,
    },

    /// Unknown experiment or variation identifier
    #[error("not found: {0}")]
    NotFound(String),

    /// Operation is invalid for the experiment's current lifecycle state
    #[error("operation `{operation}` conflicts with experiment status {status:?}")]
    StateConflict {
        /// Status the experiment was in when the operation was attempted
        status: ExperimentStatus,
        /// Name of the rejected operation
        operation: &'static str,
    },

    /// Transient failure from the backing store; surfaced untouched.
    /// Retry/backoff belongs to the caller - recording is idempotent and
    /// safe to retry.
    #[error("repository error: {0}")]
    Repository(String),
}

impl Error {
    /// Shorthand for a [`Error::Validation`] with an owned reason.
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display_includes_field() {
        let err = Error::validation("traffic_pct", "percentages sum to 97");
        let msg = err.to_string();
        assert!(msg.contains("traffic_pct"));
        assert!(msg.contains("97"));
    }

    #[test]
    fn test_state_conflict_display() {
        let err = Error::StateConflict {
            status: ExperimentStatus::Completed,
            operation: "transition",
        };
        assert!(err.to_string().contains("Completed"));
    }
}
