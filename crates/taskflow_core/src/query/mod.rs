//! Read-side projections over the task collection.
//!
//! # Invariants
//! - Every projection is pure: same inputs, same output, no writes.

pub mod filter;
pub mod overview;
