//! Frequentist two-proportion evaluation
//!
//! Pure, read-only statistics over counter snapshots. The evaluator never
//! mutates variation counters and may be called concurrently with
//! allocation and recording without coordination; a report can trail
//! in-flight increments by a handful of events, which is an accepted
//! eventual-consistency tolerance rather than a defect.
//!
//! # Example
//!
//! ```rust
//! use splitgate::stats::{evaluate, ArmCounts};
//!
//! let control = ArmCounts::new(1000, 100);
//! let variant = ArmCounts::new(1000, 140);
//! let result = evaluate(control, variant, 95.0, 1000);
//!
//! assert!(result.significant);
//! assert!(result.p_value < 0.05);
//! ```

mod evaluator;
mod normal;

pub use evaluator::{evaluate, ArmCounts, StatisticsResult};
pub use normal::{normal_cdf, z_critical};
