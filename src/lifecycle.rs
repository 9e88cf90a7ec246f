//! Experiment lifecycle state machine
//!
//! ```text
//! Draft ──> Running ──> Completed (terminal)
//!             │  ▲
//!             ▼  │
//!            Paused ──> Completed
//! ```
//!
//! Activation (`Draft -> Running`) is the single validation gate: structural
//! invariants are checked once there, and `Paused -> Running` resumes
//! without re-validation. Allocation treats `Paused` exactly like
//! "not running", but assignments made earlier stay valid so conversions
//! keep attributing across a pause.

use tracing::info;

use crate::experiment::{Experiment, ExperimentStatus, KindRegistry};
use crate::{Error, Result};

/// Tolerance when checking that traffic percentages sum to 100.
pub const TRAFFIC_SUM_EPSILON: f64 = 0.01;

/// Lifecycle manager: validates configuration invariants and applies
/// status transitions.
///
/// Constructed once at process start (no implicit global) and shared by
/// reference; holds only the kind-policy registry.
pub struct LifecycleManager {
    registry: KindRegistry,
}

impl LifecycleManager {
    /// Manager with the built-in kind policies.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: KindRegistry::new(),
        }
    }

    /// Manager with a caller-supplied kind registry.
    #[must_use]
    pub const fn with_registry(registry: KindRegistry) -> Self {
        Self { registry }
    }

    /// Apply a status transition in place.
    ///
    /// # Errors
    ///
    /// * [`Error::StateConflict`] for an edge the state machine does not
    ///   allow (including anything out of `Completed`).
    /// * [`Error::Validation`] when activating a malformed experiment; the
    ///   experiment stays in `Draft`.
    pub fn transition(&self, experiment: &mut Experiment, target: ExperimentStatus) -> Result<()> {
        use ExperimentStatus::{Completed, Draft, Paused, Running};

        let current = experiment.status();
        match (current, target) {
            (Draft, Running) => self.validate_for_start(experiment)?,
            (Running, Paused | Completed) | (Paused, Running | Completed) => {}
            _ => {
                return Err(Error::StateConflict {
                    status: current,
                    operation: "transition",
                })
            }
        }

        experiment.set_status(target);
        info!(
            experiment = experiment.experiment_id(),
            from = ?current,
            to = ?target,
            "lifecycle transition"
        );
        Ok(())
    }

    /// Check every activation invariant without mutating the experiment.
    ///
    /// # Errors
    ///
    /// Returns the first [`Error::Validation`] found, with a field-level
    /// reason suitable for surfacing to the test designer.
    pub fn validate_for_start(&self, experiment: &Experiment) -> Result<()> {
        if experiment.variations().len() < 2 {
            return Err(Error::validation(
                "variations",
                format!(
                    "must have at least 2 variations, got {}",
                    experiment.variations().len()
                ),
            ));
        }

        let controls = experiment
            .variations()
            .iter()
            .filter(|v| v.is_control())
            .count();
        if controls != 1 {
            return Err(Error::validation(
                "variations",
                format!("exactly one control variation required, got {controls}"),
            ));
        }

        for variation in experiment.variations() {
            let pct = variation.traffic_pct();
            if !(0.0..=100.0).contains(&pct) || !pct.is_finite() {
                return Err(Error::validation(
                    "traffic_pct",
                    format!(
                        "variation `{}` has traffic percentage {pct} outside [0, 100]",
                        variation.variation_id()
                    ),
                ));
            }
        }

        let total = experiment.traffic_total();
        if (total - 100.0).abs() > TRAFFIC_SUM_EPSILON {
            return Err(Error::validation(
                "traffic_pct",
                format!("traffic percentages must sum to 100, got {total}"),
            ));
        }

        match experiment.target_url() {
            Some(url) if is_valid_target_url(url) => {}
            Some(url) => {
                return Err(Error::validation(
                    "target_url",
                    format!("`{url}` is not a valid http(s) URL"),
                ))
            }
            None => return Err(Error::validation("target_url", "target URL is required")),
        }

        let confidence = experiment.confidence_level();
        if !(90.0..=99.0).contains(&confidence) {
            return Err(Error::validation(
                "confidence_level",
                format!("confidence level must be in [90, 99], got {confidence}"),
            ));
        }

        self.registry.validate(experiment)
    }
}

impl Default for LifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Scheme-plus-host check; the engine does not pull in a URL crate for one
/// predicate.
fn is_valid_target_url(url: &str) -> bool {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    rest.is_some_and(|host| !host.is_empty())
}
