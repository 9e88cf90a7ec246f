//! Deterministic traffic allocation
//!
//! Two leaves: [`bucket`] maps (experiment, subject) to a stable value in
//! `[0, 100)`, and [`allocate`] resolves that value against the experiment's
//! cumulative traffic partition. Both are pure; repeated calls with the same
//! inputs always agree, which is what makes concurrent allocation safe
//! without a lock on the decision itself.
//!
//! # Example
//!
//! ```rust
//! use splitgate::allocation::bucket;
//!
//! let b1 = bucket("exp-001", "visitor-42");
//! let b2 = bucket("exp-001", "visitor-42");
//! assert_eq!(b1, b2);
//! assert!((0.0..100.0).contains(&b1));
//! ```

mod allocator;
mod hasher;

pub use allocator::allocate;
pub use hasher::bucket;
