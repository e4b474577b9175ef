//! Derived metrics kept consistent with their source collections.
//!
//! # Invariants
//! - Derived values are recomputed from a post-mutation snapshot, never
//!   adjusted incrementally.

pub mod progress;
