//! Conversion attribution types
//!
//! Recording itself lives on the engine (it needs the repository's atomic
//! primitives); this module holds the key and outcome types shared between
//! the engine and repository implementations.

use serde::{Deserialize, Serialize};

/// Identity of one conversion event for dedup purposes.
///
/// A subject converts toward a goal at most once per experiment no matter
/// how many times the underlying event is delivered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributionKey {
    /// Experiment the conversion belongs to.
    pub experiment_id: String,
    /// Subject who converted.
    pub subject_id: String,
    /// Goal the conversion counts toward.
    pub goal_id: String,
}

impl AttributionKey {
    /// Create an attribution key.
    #[must_use]
    pub fn new(
        experiment_id: impl Into<String>,
        subject_id: impl Into<String>,
        goal_id: impl Into<String>,
    ) -> Self {
        Self {
            experiment_id: experiment_id.into(),
            subject_id: subject_id.into(),
            goal_id: goal_id.into(),
        }
    }

    /// Flatten to a single string key for stores indexed by string.
    ///
    /// Uses a `\x1f` unit separator so distinct triples can never collide
    /// by concatenation.
    #[must_use]
    pub fn composite(&self) -> String {
        format!(
            "{}\x1f{}\x1f{}",
            self.experiment_id, self.subject_id, self.goal_id
        )
    }
}

/// Result of a conversion-recording call. Never an error for duplicate or
/// unallocated traffic: both are expected operational cases, reported so
/// the caller can count them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConversionOutcome {
    /// The conversion was attributed and counters were incremented.
    Recorded {
        /// Variation the conversion was attributed to.
        variation_id: String,
        /// True when the experiment is `Completed`: the event is kept for
        /// audit but must not be presented as part of a live evaluation.
        experiment_closed: bool,
    },
    /// This (experiment, subject, goal) was already recorded; counters are
    /// unchanged. Safe to receive any number of times.
    Duplicate {
        /// Variation the original conversion was attributed to.
        variation_id: String,
    },
    /// The subject has no allocation for this experiment and none could be
    /// issued (experiment not running). Counters are unchanged.
    NotAllocated,
}

impl ConversionOutcome {
    /// Whether this outcome changed any counters.
    #[must_use]
    pub const fn recorded(&self) -> bool {
        matches!(self, Self::Recorded { .. })
    }
}
