//! Experiment engine - the dependency-injected service surface
//!
//! One [`ExperimentEngine`] is constructed at process start with its
//! repository and passed by reference into request handlers; there is no
//! process-wide singleton. The engine owns no mutable state of its own -
//! every call reads fresh experiment state from the repository, so many
//! handlers can share one engine without coordination.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::allocation::allocate;
use crate::conversion::{AttributionKey, ConversionOutcome};
use crate::experiment::{CounterDelta, ExperimentStatus, Variation};
use crate::lifecycle::LifecycleManager;
use crate::repo::ExperimentRepository;
use crate::stats::{evaluate, ArmCounts, StatisticsResult};
use crate::{Error, Result};

/// Engine policy knobs.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Automatically complete a running experiment the first time an
    /// evaluation finds an arm that is both sufficient and significant.
    /// Off by default; enabling it is the caller's stop policy.
    pub auto_complete: bool,
}

/// Per-arm slice of an evaluation report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmReport {
    /// Variation this arm describes.
    pub variation_id: String,
    /// Variation display name.
    pub name: String,
    /// Counter snapshot the statistics were computed from.
    pub counts: ArmCounts,
    /// Two-proportion test result against the control.
    pub stats: StatisticsResult,
}

/// Evaluation report for a whole experiment: each non-control arm tested
/// against the control. Derived on demand, never persisted.
///
/// The counters are read without coordination with in-flight increments;
/// a report may trail concurrent recording by a few events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentReport {
    /// Experiment the report describes.
    pub experiment_id: String,
    /// When the snapshot was taken.
    pub generated_at: DateTime<Utc>,
    /// Status at snapshot time.
    pub status: ExperimentStatus,
    /// True when the experiment is `Completed`: the numbers are final for
    /// live purposes and late conversions are audit-only.
    pub experiment_closed: bool,
    /// True when this evaluation itself triggered auto-completion.
    pub auto_completed: bool,
    /// Control arm counter snapshot.
    pub control: ArmCounts,
    /// One entry per non-control variation, in creation order.
    pub arms: Vec<ArmReport>,
}

/// The experimentation engine: deterministic allocation, idempotent
/// conversion recording, on-demand evaluation and lifecycle transitions.
pub struct ExperimentEngine<R: ExperimentRepository> {
    repo: R,
    lifecycle: LifecycleManager,
    config: EngineConfig,
}

impl<R: ExperimentRepository> ExperimentEngine<R> {
    /// Create an engine with default configuration.
    #[must_use]
    pub fn new(repo: R) -> Self {
        Self::with_config(repo, EngineConfig::default())
    }

    /// Create an engine with an explicit configuration.
    #[must_use]
    pub fn with_config(repo: R, config: EngineConfig) -> Self {
        Self {
            repo,
            lifecycle: LifecycleManager::new(),
            config,
        }
    }

    /// Access the underlying repository.
    pub const fn repo(&self) -> &R {
        &self.repo
    }

    /// Allocate a variant for a subject, or `None` if the experiment is
    /// not running.
    ///
    /// Deterministic and idempotent: the first call materializes the
    /// allocation record and counts the visitor; every later call (and any
    /// concurrent race loser) returns the same variation without touching
    /// counters. Percentage changes after activation never reassign an
    /// already-bucketed subject.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] for an unknown experiment, or a repository
    /// failure.
    pub async fn allocate_variant(
        &self,
        experiment_id: &str,
        subject_id: &str,
    ) -> Result<Option<String>> {
        let experiment = self.repo.get(experiment_id).await?;
        if experiment.status() != ExperimentStatus::Running {
            debug!(
                experiment = experiment_id,
                status = ?experiment.status(),
                "no allocation: experiment not running"
            );
            return Ok(None);
        }

        // The decision needs no lock: every caller computes the same
        // bucket, so racing allocations agree on the variation.
        let Some(chosen) = allocate(&experiment, subject_id) else {
            return Ok(None);
        };
        let chosen_id = chosen.variation_id().to_string();

        let (winner, newly_assigned) = self
            .repo
            .record_assignment_if_absent(experiment_id, subject_id, &chosen_id)
            .await?;
        if newly_assigned {
            self.repo
                .increment_variant_counters(experiment_id, &winner, CounterDelta::visitor())
                .await?;
        }
        Ok(Some(winner))
    }

    /// Attribute a conversion event to the subject's allocated variation.
    ///
    /// At most once per (experiment, subject, goal): duplicate delivery
    /// returns [`ConversionOutcome::Duplicate`] and changes nothing, which
    /// is what makes this call safe to retry after a transient repository
    /// failure.
    ///
    /// A subject without an allocation record is allocated on the spot
    /// when the experiment is running (same hash, same answer); otherwise
    /// the outcome is [`ConversionOutcome::NotAllocated`]. Conversions on a
    /// completed experiment are recorded for audit and flagged
    /// `experiment_closed`.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] for a negative value, [`Error::NotFound`] for
    /// an unknown experiment, or a repository failure.
    pub async fn record_conversion(
        &self,
        experiment_id: &str,
        subject_id: &str,
        goal_id: &str,
        value: f64,
    ) -> Result<ConversionOutcome> {
        if !value.is_finite() || value < 0.0 {
            return Err(Error::validation(
                "value",
                format!("conversion value must be a non-negative number, got {value}"),
            ));
        }

        let experiment = self.repo.get(experiment_id).await?;

        let variation_id = match self.repo.assignment(experiment_id, subject_id).await? {
            Some(assigned) => assigned,
            None => {
                // No allocation record yet. Recording uses the identical
                // deterministic allocation, so the two paths always agree.
                let Some(chosen) = allocate(&experiment, subject_id) else {
                    debug!(
                        experiment = experiment_id,
                        subject = subject_id,
                        "conversion dropped: subject has no allocation"
                    );
                    return Ok(ConversionOutcome::NotAllocated);
                };
                let chosen_id = chosen.variation_id().to_string();
                let (winner, newly_assigned) = self
                    .repo
                    .record_assignment_if_absent(experiment_id, subject_id, &chosen_id)
                    .await?;
                if newly_assigned {
                    self.repo
                        .increment_variant_counters(
                            experiment_id,
                            &winner,
                            CounterDelta::visitor(),
                        )
                        .await?;
                }
                winner
            }
        };

        let key = AttributionKey::new(experiment_id, subject_id, goal_id);
        if !self.repo.try_record_attribution(&key).await? {
            debug!(
                experiment = experiment_id,
                subject = subject_id,
                goal = goal_id,
                "duplicate conversion ignored"
            );
            return Ok(ConversionOutcome::Duplicate { variation_id });
        }

        if let Err(err) = self
            .repo
            .increment_variant_counters(experiment_id, &variation_id, CounterDelta::conversion(value))
            .await
        {
            // Release the dedup key, or the caller's retry would be misread
            // as a duplicate and the conversion silently lost.
            if let Err(revoke_err) = self.repo.revoke_attribution(&key).await {
                warn!(
                    experiment = experiment_id,
                    subject = subject_id,
                    goal = goal_id,
                    error = %revoke_err,
                    "failed to release attribution after increment error"
                );
            }
            return Err(err);
        }

        let experiment_closed = experiment.status() == ExperimentStatus::Completed;
        if experiment_closed {
            warn!(
                experiment = experiment_id,
                subject = subject_id,
                "conversion recorded after completion (audit only)"
            );
        }
        Ok(ConversionOutcome::Recorded {
            variation_id,
            experiment_closed,
        })
    }

    /// Evaluate every non-control arm against the control from current
    /// counters.
    ///
    /// Read-only with respect to counters, unless `auto_complete` is
    /// enabled and an arm crosses sufficiency + significance, in which
    /// case the experiment is transitioned to `Completed` as a side
    /// effect and the report says so.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] for an unknown experiment, [`Error::Validation`]
    /// if the experiment has no control arm, or a repository failure.
    pub async fn evaluate(&self, experiment_id: &str) -> Result<ExperimentReport> {
        let experiment = self.repo.get(experiment_id).await?;
        let control = experiment
            .control()
            .ok_or_else(|| Error::validation("variations", "experiment has no control arm"))?;
        let control_counts = ArmCounts::new(control.visitors(), control.conversions());

        let arms: Vec<ArmReport> = experiment
            .variations()
            .iter()
            .filter(|v| !v.is_control())
            .map(|variation| arm_report(variation, control_counts, &experiment))
            .collect();

        let mut auto_completed = false;
        let mut status = experiment.status();
        if self.config.auto_complete
            && status == ExperimentStatus::Running
            && arms
                .iter()
                .any(|arm| arm.stats.significant && arm.stats.sufficient_sample)
        {
            self.repo
                .set_status(experiment_id, ExperimentStatus::Completed)
                .await?;
            status = ExperimentStatus::Completed;
            auto_completed = true;
            info!(experiment = experiment_id, "auto-completed: significance and sufficiency reached");
        }

        Ok(ExperimentReport {
            experiment_id: experiment_id.to_string(),
            generated_at: Utc::now(),
            status,
            experiment_closed: status == ExperimentStatus::Completed,
            auto_completed,
            control: control_counts,
            arms,
        })
    }

    /// Transition an experiment to a target status.
    ///
    /// Validates the edge (and, for activation, the full configuration)
    /// before writing the new status through the repository.
    ///
    /// # Errors
    ///
    /// [`Error::StateConflict`] for a disallowed edge,
    /// [`Error::Validation`] for a malformed activation,
    /// [`Error::NotFound`] for an unknown experiment.
    pub async fn transition(&self, experiment_id: &str, target: ExperimentStatus) -> Result<()> {
        let mut experiment = self.repo.get(experiment_id).await?;
        self.lifecycle.transition(&mut experiment, target)?;
        self.repo.set_status(experiment_id, target).await
    }
}

fn arm_report(
    variation: &Variation,
    control_counts: ArmCounts,
    experiment: &crate::experiment::Experiment,
) -> ArmReport {
    let counts = ArmCounts::new(variation.visitors(), variation.conversions());
    ArmReport {
        variation_id: variation.variation_id().to_string(),
        name: variation.name().to_string(),
        counts,
        stats: evaluate(
            control_counts,
            counts,
            experiment.confidence_level(),
            experiment.min_sample_size(),
        ),
    }
}
