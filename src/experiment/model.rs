//! Experiment - root entity of the experimentation schema

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Variation;

/// Lifecycle status of an experiment.
///
/// Transitions are governed by the [`lifecycle`](crate::lifecycle) module:
/// `Draft -> Running -> {Paused <-> Running, Completed}`, with `Completed`
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExperimentStatus {
    /// Created but not yet validated/activated. No allocations are issued.
    Draft,
    /// Actively allocating subjects and attributing conversions.
    Running,
    /// Temporarily stopped: no new allocations, existing assignments stay
    /// valid so conversions keep attributing if the experiment resumes.
    Paused,
    /// Terminal. No new allocations; late conversions for already-allocated
    /// subjects are still recorded but flagged as post-completion.
    Completed,
}

/// Kind of experiment, selecting the validation policy applied at start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExperimentKind {
    /// Classic two-arm split on a single page.
    SimpleSplit,
    /// More than two arms varying several factors.
    Multivariate,
    /// Arms redirect the subject to a different URL.
    Redirect,
    /// Arms serve entirely separate URLs.
    SplitUrl,
}

/// Experiment is the root entity: configuration, lifecycle status and the
/// ordered list of variations (exactly one of which is the control).
///
/// Mutated only by lifecycle transitions and counter increments; never
/// deleted while `Running`, only transitioned to `Completed`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Experiment {
    experiment_id: String,
    name: String,
    hypothesis: Option<String>,
    kind: ExperimentKind,
    target_url: Option<String>,
    confidence_level: f64,
    min_sample_size: u64,
    expected_lift: Option<f64>,
    status: ExperimentStatus,
    variations: Vec<Variation>,
    created_at: DateTime<Utc>,
}

impl Experiment {
    /// Create a builder for an experiment.
    ///
    /// Defaults: `SimpleSplit` kind, 95% confidence, minimum sample size
    /// 1000, status `Draft`, no variations.
    #[must_use]
    pub fn builder(
        experiment_id: impl Into<String>,
        name: impl Into<String>,
    ) -> ExperimentBuilder {
        ExperimentBuilder::new(experiment_id, name)
    }

    /// Get the experiment ID.
    #[must_use]
    pub fn experiment_id(&self) -> &str {
        &self.experiment_id
    }

    /// Get the experiment name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the hypothesis text, if any.
    #[must_use]
    pub fn hypothesis(&self) -> Option<&str> {
        self.hypothesis.as_deref()
    }

    /// Get the experiment kind.
    #[must_use]
    pub const fn kind(&self) -> ExperimentKind {
        self.kind
    }

    /// Get the target URL, if set.
    #[must_use]
    pub fn target_url(&self) -> Option<&str> {
        self.target_url.as_deref()
    }

    /// Get the configured confidence level in `[90, 99]`.
    #[must_use]
    pub const fn confidence_level(&self) -> f64 {
        self.confidence_level
    }

    /// Get the minimum per-arm sample size required for sufficiency.
    #[must_use]
    pub const fn min_sample_size(&self) -> u64 {
        self.min_sample_size
    }

    /// Get the designer's expected lift, if stated.
    #[must_use]
    pub const fn expected_lift(&self) -> Option<f64> {
        self.expected_lift
    }

    /// Get the current lifecycle status.
    #[must_use]
    pub const fn status(&self) -> ExperimentStatus {
        self.status
    }

    /// Set the lifecycle status.
    ///
    /// Callers should go through
    /// [`LifecycleManager::transition`](crate::lifecycle::LifecycleManager::transition),
    /// which enforces the state machine; this is the raw setter the
    /// repository uses once a transition has been validated.
    pub fn set_status(&mut self, status: ExperimentStatus) {
        self.status = status;
    }

    /// Get the variations in creation order.
    #[must_use]
    pub fn variations(&self) -> &[Variation] {
        &self.variations
    }

    /// Mutable access to the variations, for counter application.
    pub fn variations_mut(&mut self) -> &mut [Variation] {
        &mut self.variations
    }

    /// Get the control variation, if exactly the model invariant holds.
    ///
    /// Returns the first control-flagged arm; validation guarantees there
    /// is exactly one before the experiment can start.
    #[must_use]
    pub fn control(&self) -> Option<&Variation> {
        self.variations.iter().find(|v| v.is_control())
    }

    /// Look up a variation by ID.
    #[must_use]
    pub fn variation(&self, variation_id: &str) -> Option<&Variation> {
        self.variations
            .iter()
            .find(|v| v.variation_id() == variation_id)
    }

    /// Sum of all variations' traffic percentages.
    #[must_use]
    pub fn traffic_total(&self) -> f64 {
        self.variations.iter().map(Variation::traffic_pct).sum()
    }

    /// Get the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Builder for [`Experiment`].
#[derive(Debug)]
pub struct ExperimentBuilder {
    experiment_id: String,
    name: String,
    hypothesis: Option<String>,
    kind: ExperimentKind,
    target_url: Option<String>,
    confidence_level: f64,
    min_sample_size: u64,
    expected_lift: Option<f64>,
    variations: Vec<Variation>,
    created_at: DateTime<Utc>,
}

impl ExperimentBuilder {
    /// Create a new builder with required fields and defaults.
    #[must_use]
    pub fn new(experiment_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            experiment_id: experiment_id.into(),
            name: name.into(),
            hypothesis: None,
            kind: ExperimentKind::SimpleSplit,
            target_url: None,
            confidence_level: 95.0,
            min_sample_size: 1000,
            expected_lift: None,
            variations: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Set the hypothesis text.
    #[must_use]
    pub fn hypothesis(mut self, hypothesis: impl Into<String>) -> Self {
        self.hypothesis = Some(hypothesis.into());
        self
    }

    /// Set the experiment kind.
    #[must_use]
    pub const fn kind(mut self, kind: ExperimentKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the target URL the experiment runs against.
    #[must_use]
    pub fn target_url(mut self, url: impl Into<String>) -> Self {
        self.target_url = Some(url.into());
        self
    }

    /// Set the confidence level (validated to `[90, 99]` at activation).
    #[must_use]
    pub const fn confidence_level(mut self, level: f64) -> Self {
        self.confidence_level = level;
        self
    }

    /// Set the minimum per-arm sample size.
    #[must_use]
    pub const fn min_sample_size(mut self, n: u64) -> Self {
        self.min_sample_size = n;
        self
    }

    /// Set the designer's expected lift.
    #[must_use]
    pub const fn expected_lift(mut self, lift: f64) -> Self {
        self.expected_lift = Some(lift);
        self
    }

    /// Append a variation (creation order is allocation order).
    #[must_use]
    pub fn variation(mut self, variation: Variation) -> Self {
        self.variations.push(variation);
        self
    }

    /// Set a custom creation timestamp (useful for deserialization/testing).
    #[must_use]
    pub const fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Build the [`Experiment`] in `Draft` status.
    #[must_use]
    pub fn build(self) -> Experiment {
        Experiment {
            experiment_id: self.experiment_id,
            name: self.name,
            hypothesis: self.hypothesis,
            kind: self.kind,
            target_url: self.target_url,
            confidence_level: self.confidence_level,
            min_sample_size: self.min_sample_size,
            expected_lift: self.expected_lift,
            status: ExperimentStatus::Draft,
            variations: self.variations,
            created_at: self.created_at,
        }
    }
}
