//! Experiment repository collaborator
//!
//! The engine is a stateless computation layer: every read and write of
//! experiment state goes through [`ExperimentRepository`]. The repository
//! call is the only point where an engine operation may suspend; the core
//! itself performs only arithmetic and hashing.
//!
//! Two operations carry atomicity requirements the engine's correctness
//! depends on:
//!
//! - `increment_variant_counters` must be an atomic read-modify-write;
//!   many concurrent conversions for different subjects hit the same
//!   counters.
//! - `try_record_attribution` and `record_assignment_if_absent` must be
//!   atomic check-and-set / insert-if-absent, or duplicate events and
//!   racing first allocations would double-count.
//!
//! The engine never retries internally. Transient failures surface as
//! [`Error::Repository`](crate::Error::Repository); callers can retry
//! freely because recording is idempotent.

mod memory;

pub use memory::MemoryExperimentRepository;

use std::future::Future;

use crate::conversion::AttributionKey;
use crate::experiment::{CounterDelta, Experiment, ExperimentStatus, Variation};
use crate::Result;

/// Storage collaborator owning all mutable experiment state.
pub trait ExperimentRepository: Send + Sync {
    /// Fetch an experiment by ID.
    ///
    /// Fails with [`Error::NotFound`](crate::Error::NotFound) for an
    /// unknown ID.
    fn get(&self, experiment_id: &str) -> impl Future<Output = Result<Experiment>> + Send;

    /// Insert or replace an experiment record (seeding / test setup).
    fn insert(&self, experiment: Experiment) -> impl Future<Output = Result<()>> + Send;

    /// List an experiment's variations in creation order.
    fn list_variations(
        &self,
        experiment_id: &str,
    ) -> impl Future<Output = Result<Vec<Variation>>> + Send {
        async move { Ok(self.get(experiment_id).await?.variations().to_vec()) }
    }

    /// Set an experiment's lifecycle status.
    ///
    /// The caller (the engine) is responsible for having validated the
    /// transition; this is a raw write.
    fn set_status(
        &self,
        experiment_id: &str,
        status: ExperimentStatus,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Atomically apply a counter delta to one variation.
    fn increment_variant_counters(
        &self,
        experiment_id: &str,
        variation_id: &str,
        delta: CounterDelta,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Atomic check-and-set on a conversion attribution key.
    ///
    /// Returns `true` exactly once per key; every later call (including a
    /// concurrent race loser) sees `false`.
    fn try_record_attribution(
        &self,
        key: &AttributionKey,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Release an attribution key that was recorded but whose counter
    /// increment failed.
    ///
    /// Compensation hook for the engine: without it, a transient increment
    /// failure would leave the key set and the caller's retry would be
    /// misread as a duplicate, silently losing the conversion. No-op for a
    /// key that is not recorded.
    fn revoke_attribution(&self, key: &AttributionKey) -> impl Future<Output = Result<()>> + Send;

    /// Look up the materialized allocation record for a subject.
    fn assignment(
        &self,
        experiment_id: &str,
        subject_id: &str,
    ) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Atomically materialize an allocation record if none exists.
    ///
    /// Returns the winning variation ID and whether this call created the
    /// record. Losing a creation race returns the already-stored ID with
    /// `false`, so the first-seen visitor increment happens at most once.
    fn record_assignment_if_absent(
        &self,
        experiment_id: &str,
        subject_id: &str,
        variation_id: &str,
    ) -> impl Future<Output = Result<(String, bool)>> + Send;
}
