//! # Splitgate: Deterministic A/B Experimentation Engine
//!
//! Splitgate is the computation core of an experimentation platform:
//! deterministic assignment of subjects to test variants under a configured
//! traffic split, at-most-once conversion attribution under concurrent
//! delivery, and frequentist two-proportion evaluation of the results.
//!
//! ## Design Principles
//!
//! - **Determinism**: allocation is a pure function of (experiment, subject);
//!   two concurrent requests for the same subject can never disagree.
//! - **Idempotence**: conversion recording is safe to retry; duplicate
//!   delivery of the same (experiment, subject, goal) event is a no-op.
//! - **Purity at the leaves**: the hasher and the statistical evaluator are
//!   pure functions, safe under unlimited concurrency with no locking.
//! - **Externally owned state**: counters live behind an
//!   [`ExperimentRepository`](repo::ExperimentRepository); the engine never
//!   caches a mutable copy across calls.
//!
//! ## Example Usage
//!
//! ```rust
//! use splitgate::engine::ExperimentEngine;
//! use splitgate::experiment::{Experiment, ExperimentStatus, Variation};
//! use splitgate::repo::{ExperimentRepository, MemoryExperimentRepository};
//!
//! # async fn example() -> splitgate::Result<()> {
//! let repo = MemoryExperimentRepository::new();
//! repo.insert(
//!     Experiment::builder("exp-001", "Checkout button copy")
//!         .target_url("https://shop.example/checkout")
//!         .variation(Variation::control("var-a", "Current copy", 50.0))
//!         .variation(Variation::new("var-b", "New copy", 50.0))
//!         .build(),
//! )
//! .await?;
//!
//! let engine = ExperimentEngine::new(repo);
//! engine.transition("exp-001", ExperimentStatus::Running).await?;
//!
//! let assigned = engine.allocate_variant("exp-001", "visitor-42").await?;
//! assert!(assigned.is_some());
//!
//! engine
//!     .record_conversion("exp-001", "visitor-42", "purchase", 29.90)
//!     .await?;
//! let report = engine.evaluate("exp-001").await?;
//! println!("{} arms evaluated", report.arms.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod allocation;
pub mod conversion;
pub mod engine;
pub mod error;
pub mod experiment;
pub mod lifecycle;
pub mod repo;
pub mod stats;

pub use error::{Error, Result};
