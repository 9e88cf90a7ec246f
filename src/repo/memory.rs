//! In-memory repository implementation using `DashMap`.
//!
//! The default backend for tests and single-process deployments - data is
//! lost on process restart. DashMap's per-shard locking provides the
//! atomicity the trait contract requires: `entry` gives insert-if-absent,
//! `get_mut` gives an exclusive read-modify-write on one experiment.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::ExperimentRepository;
use crate::conversion::AttributionKey;
use crate::experiment::{CounterDelta, Experiment, ExperimentStatus};
use crate::{Error, Result};

/// In-memory experiment repository.
///
/// Thread-safe; intended to be shared behind the engine across request
/// handlers. Not durable - correctness of dedup across process restarts
/// requires a durable store implementing the same trait.
#[derive(Default)]
pub struct MemoryExperimentRepository {
    experiments: DashMap<String, Experiment>,
    /// (experiment, subject) -> variation: the materialized allocation
    /// records.
    assignments: DashMap<String, String>,
    /// Conversion attribution keys already counted.
    attributions: DashMap<String, ()>,
}

impl MemoryExperimentRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of experiments stored.
    #[must_use]
    pub fn experiment_count(&self) -> usize {
        self.experiments.len()
    }

    /// Number of materialized allocation records.
    #[must_use]
    pub fn assignment_count(&self) -> usize {
        self.assignments.len()
    }

    fn assignment_key(experiment_id: &str, subject_id: &str) -> String {
        format!("{experiment_id}\x1f{subject_id}")
    }
}

impl ExperimentRepository for MemoryExperimentRepository {
    async fn get(&self, experiment_id: &str) -> Result<Experiment> {
        self.experiments
            .get(experiment_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Error::NotFound(format!("experiment `{experiment_id}`")))
    }

    async fn insert(&self, experiment: Experiment) -> Result<()> {
        self.experiments
            .insert(experiment.experiment_id().to_string(), experiment);
        Ok(())
    }

    async fn set_status(&self, experiment_id: &str, status: ExperimentStatus) -> Result<()> {
        let mut entry = self
            .experiments
            .get_mut(experiment_id)
            .ok_or_else(|| Error::NotFound(format!("experiment `{experiment_id}`")))?;
        entry.value_mut().set_status(status);
        Ok(())
    }

    async fn increment_variant_counters(
        &self,
        experiment_id: &str,
        variation_id: &str,
        delta: CounterDelta,
    ) -> Result<()> {
        // get_mut holds the shard write lock for the duration, making the
        // read-modify-write atomic.
        let mut entry = self
            .experiments
            .get_mut(experiment_id)
            .ok_or_else(|| Error::NotFound(format!("experiment `{experiment_id}`")))?;
        let variation = entry
            .value_mut()
            .variations_mut()
            .iter_mut()
            .find(|v| v.variation_id() == variation_id)
            .ok_or_else(|| Error::NotFound(format!("variation `{variation_id}`")))?;
        variation.apply(&delta);
        Ok(())
    }

    async fn try_record_attribution(&self, key: &AttributionKey) -> Result<bool> {
        // insert is atomic per shard: exactly one caller observes None.
        Ok(self.attributions.insert(key.composite(), ()).is_none())
    }

    async fn revoke_attribution(&self, key: &AttributionKey) -> Result<()> {
        self.attributions.remove(&key.composite());
        Ok(())
    }

    async fn assignment(&self, experiment_id: &str, subject_id: &str) -> Result<Option<String>> {
        let key = Self::assignment_key(experiment_id, subject_id);
        Ok(self.assignments.get(&key).map(|entry| entry.value().clone()))
    }

    async fn record_assignment_if_absent(
        &self,
        experiment_id: &str,
        subject_id: &str,
        variation_id: &str,
    ) -> Result<(String, bool)> {
        let key = Self::assignment_key(experiment_id, subject_id);
        match self.assignments.entry(key) {
            Entry::Occupied(existing) => Ok((existing.get().clone(), false)),
            Entry::Vacant(vacant) => {
                vacant.insert(variation_id.to_string());
                Ok((variation_id.to_string(), true))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::Variation;

    fn seeded() -> MemoryExperimentRepository {
        let repo = MemoryExperimentRepository::new();
        let experiment = Experiment::builder("exp-1", "Memory repo test")
            .target_url("https://www.example.com")
            .variation(Variation::control("var-a", "A", 50.0))
            .variation(Variation::new("var-b", "B", 50.0))
            .build();
        repo.experiments
            .insert("exp-1".to_string(), experiment);
        repo
    }

    #[tokio::test]
    async fn test_get_unknown_is_not_found() {
        let repo = MemoryExperimentRepository::new();
        let err = repo.get("missing").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_increment_counters() {
        let repo = seeded();
        repo.increment_variant_counters("exp-1", "var-a", CounterDelta::visitor())
            .await
            .unwrap();
        repo.increment_variant_counters("exp-1", "var-a", CounterDelta::conversion(5.0))
            .await
            .unwrap();

        let exp = repo.get("exp-1").await.unwrap();
        let var = exp.variation("var-a").unwrap();
        assert_eq!(var.visitors(), 1);
        assert_eq!(var.conversions(), 1);
        assert!((var.conversion_value() - 5.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_increment_unknown_variation() {
        let repo = seeded();
        let err = repo
            .increment_variant_counters("exp-1", "var-z", CounterDelta::visitor())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_attribution_check_and_set() {
        let repo = seeded();
        let key = AttributionKey::new("exp-1", "subject-1", "purchase");
        assert!(repo.try_record_attribution(&key).await.unwrap());
        assert!(!repo.try_record_attribution(&key).await.unwrap());

        // Different goal is a different key.
        let other = AttributionKey::new("exp-1", "subject-1", "signup");
        assert!(repo.try_record_attribution(&other).await.unwrap());
    }

    #[tokio::test]
    async fn test_revoke_reopens_attribution() {
        let repo = seeded();
        let key = AttributionKey::new("exp-1", "subject-1", "purchase");
        assert!(repo.try_record_attribution(&key).await.unwrap());

        repo.revoke_attribution(&key).await.unwrap();
        assert!(
            repo.try_record_attribution(&key).await.unwrap(),
            "revoked key should accept a fresh attribution"
        );

        // Revoking an unknown key is a no-op.
        let unknown = AttributionKey::new("exp-1", "subject-9", "purchase");
        repo.revoke_attribution(&unknown).await.unwrap();
    }

    #[tokio::test]
    async fn test_assignment_insert_if_absent() {
        let repo = seeded();
        let (winner, created) = repo
            .record_assignment_if_absent("exp-1", "subject-1", "var-a")
            .await
            .unwrap();
        assert_eq!(winner, "var-a");
        assert!(created);

        // A second write with a different variation loses to the first.
        let (winner, created) = repo
            .record_assignment_if_absent("exp-1", "subject-1", "var-b")
            .await
            .unwrap();
        assert_eq!(winner, "var-a");
        assert!(!created);

        assert_eq!(
            repo.assignment("exp-1", "subject-1").await.unwrap(),
            Some("var-a".to_string())
        );
    }

    #[tokio::test]
    async fn test_list_variations_default_impl() {
        let repo = seeded();
        let variations = repo.list_variations("exp-1").await.unwrap();
        assert_eq!(variations.len(), 2);
        assert_eq!(variations[0].variation_id(), "var-a");
    }
}
