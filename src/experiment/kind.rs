//! Per-kind validation policies
//!
//! The experiment kinds carry different structural requirements (a simple
//! split is exactly two arms; redirect kinds need destination URLs). Rather
//! than a switch buried in the lifecycle code, each kind gets a policy
//! object and a registry maps the kind tag to its implementation. The
//! lifecycle manager consults the registry at activation time.

use std::collections::HashMap;

use super::{Experiment, ExperimentKind};
use crate::{Error, Result};

/// Validation capability for one experiment kind.
pub trait KindPolicy: Send + Sync {
    /// Check kind-specific structural requirements.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when the experiment violates the
    /// kind's structural rules.
    fn validate(&self, experiment: &Experiment) -> Result<()>;
}

struct SimpleSplitPolicy;

impl KindPolicy for SimpleSplitPolicy {
    fn validate(&self, experiment: &Experiment) -> Result<()> {
        if experiment.variations().len() == 2 {
            Ok(())
        } else {
            Err(Error::validation(
                "variations",
                format!(
                    "simple split requires exactly 2 variations, got {}",
                    experiment.variations().len()
                ),
            ))
        }
    }
}

struct MultivariatePolicy;

impl KindPolicy for MultivariatePolicy {
    fn validate(&self, _experiment: &Experiment) -> Result<()> {
        // Arm-count minimum is enforced by the common activation checks.
        Ok(())
    }
}

struct RedirectPolicy;

impl KindPolicy for RedirectPolicy {
    fn validate(&self, experiment: &Experiment) -> Result<()> {
        for variation in experiment.variations() {
            if !variation.is_control() && variation.url().is_none() {
                return Err(Error::validation(
                    "variations",
                    format!(
                        "redirect experiment requires a destination URL on variation `{}`",
                        variation.variation_id()
                    ),
                ));
            }
        }
        Ok(())
    }
}

/// Registry mapping an [`ExperimentKind`] to its validation policy.
///
/// Constructed once at process start and passed into the lifecycle manager
/// (no process-wide singleton).
pub struct KindRegistry {
    policies: HashMap<ExperimentKind, Box<dyn KindPolicy>>,
}

impl KindRegistry {
    /// Registry with the built-in policies for all four kinds.
    #[must_use]
    pub fn new() -> Self {
        let mut policies: HashMap<ExperimentKind, Box<dyn KindPolicy>> = HashMap::new();
        policies.insert(ExperimentKind::SimpleSplit, Box::new(SimpleSplitPolicy));
        policies.insert(ExperimentKind::Multivariate, Box::new(MultivariatePolicy));
        policies.insert(ExperimentKind::Redirect, Box::new(RedirectPolicy));
        // Split-URL arms also serve their own URLs.
        policies.insert(ExperimentKind::SplitUrl, Box::new(RedirectPolicy));
        Self { policies }
    }

    /// Replace or add the policy for a kind.
    pub fn register(&mut self, kind: ExperimentKind, policy: Box<dyn KindPolicy>) {
        self.policies.insert(kind, policy);
    }

    /// Validate an experiment against its kind's policy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] from the kind policy.
    pub fn validate(&self, experiment: &Experiment) -> Result<()> {
        match self.policies.get(&experiment.kind()) {
            Some(policy) => policy.validate(experiment),
            None => Ok(()),
        }
    }
}

impl Default for KindRegistry {
    fn default() -> Self {
        Self::new()
    }
}
