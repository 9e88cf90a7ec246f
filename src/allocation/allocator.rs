//! Traffic allocator: cumulative-partition variant selection

use tracing::trace;

use super::bucket;
use crate::experiment::{Experiment, ExperimentStatus, Variation};

/// Deterministically pick the variation for a subject, or `None` when the
/// experiment is not `Running`.
///
/// Probing a `Draft` or `Paused` experiment is legitimate caller behavior,
/// so a non-running status yields `None` rather than an error.
///
/// The partition of `[0, 100)` is built control-first, then the remaining
/// variations in creation order, each covering a range equal to its traffic
/// percentage. If the configured percentages fall short of 100 (activation
/// validation should have rejected this, but the allocator is called on
/// whatever record the repository returns), the final variation absorbs the
/// remainder so every bucket value maps to some arm.
///
/// Idempotent: same (experiment id, subject) in, same variation out, for as
/// long as the variant list and percentages are unchanged. Stability across
/// configuration changes is the job of the materialized allocation record,
/// not of this function.
#[must_use]
pub fn allocate<'a>(experiment: &'a Experiment, subject_id: &str) -> Option<&'a Variation> {
    if experiment.status() != ExperimentStatus::Running {
        return None;
    }
    let ordered = ordered_variations(experiment);
    if ordered.is_empty() {
        return None;
    }

    let point = bucket(experiment.experiment_id(), subject_id);
    let mut cumulative = 0.0;
    for variation in &ordered {
        cumulative += variation.traffic_pct();
        if point < cumulative {
            trace!(
                experiment = experiment.experiment_id(),
                subject = subject_id,
                bucket = point,
                variation = variation.variation_id(),
                "allocated"
            );
            return Some(variation);
        }
    }

    // Remainder absorption: percentages summed below 100, the last arm
    // takes whatever is left of [0, 100).
    ordered.last().copied()
}

/// Control first, then the rest in creation order. Stable ordering is part
/// of the determinism contract: reordering arms would re-partition buckets.
fn ordered_variations(experiment: &Experiment) -> Vec<&Variation> {
    let mut ordered: Vec<&Variation> = Vec::with_capacity(experiment.variations().len());
    ordered.extend(experiment.variations().iter().filter(|v| v.is_control()));
    ordered.extend(experiment.variations().iter().filter(|v| !v.is_control()));
    ordered
}
