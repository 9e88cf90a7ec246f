//! Experiment data model
//!
//! ## Schema Overview
//!
//! ```text
//! Experiment (1) ──< Variation (N, exactly one control)
//! ```
//!
//! An [`Experiment`] owns an ordered list of [`Variation`]s. Exactly one
//! variation is the control; traffic percentages must sum to 100 (within
//! `±0.01`) before the experiment may start. Counters on each variation
//! (`visitors`, `conversions`, `conversion_value`) are monotonically
//! non-decreasing for the lifetime of the experiment and are only mutated
//! through the repository's atomic increment operation.
//!
//! ## Usage
//!
//! ```rust
//! use splitgate::experiment::{Experiment, ExperimentKind, Variation};
//!
//! let experiment = Experiment::builder("exp-001", "Pricing page headline")
//!     .hypothesis("A benefit-led headline lifts signups")
//!     .kind(ExperimentKind::SimpleSplit)
//!     .target_url("https://www.example.com/pricing")
//!     .confidence_level(95.0)
//!     .min_sample_size(1000)
//!     .variation(Variation::control("var-a", "Current headline", 50.0))
//!     .variation(Variation::new("var-b", "Benefit headline", 50.0))
//!     .build();
//!
//! assert!(experiment.control().is_some());
//! ```

mod kind;
mod model;
mod variation;

pub use model::{Experiment, ExperimentBuilder, ExperimentKind, ExperimentStatus};
pub use kind::{KindPolicy, KindRegistry};
pub use variation::{CounterDelta, Variation, VariationBuilder};
