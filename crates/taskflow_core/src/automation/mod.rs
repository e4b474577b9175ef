//! Automation rule evaluation.
//!
//! # Responsibility
//! - Match domain events against active automation triggers.
//! - Execute matching actions against the store in declaration order.
//! - Bound cascades where actions emit events that re-enter evaluation.
//!
//! # Invariants
//! - Only `active` rules are evaluated.
//! - Cascades run depth-first and finish before the mutation returns.
//! - Missing references skip a single action; they never abort a pass.
//! - Exceeding a cascade limit stops the cascade, keeps applied effects and
//!   is reported, never raised.

pub mod engine;
pub mod event;
pub mod notify;
