//! Domain model for tasks, projects, goals, tags, documents and automations.
//!
//! # Responsibility
//! - Define the canonical records owned by the domain store.
//! - Provide create/patch input shapes consumed by store mutations.
//! - Validate caller input before it reaches the store.
//!
//! # Invariants
//! - Every entity is identified by a stable v4 UUID that is never reused.
//! - Timestamps are Unix epoch milliseconds.
//! - Cross-entity references are plain ids, re-resolved on every use.

pub mod automation;
pub mod document;
pub mod goal;
pub mod project;
pub mod tag;
pub mod task;
pub mod validation;

/// Unix epoch milliseconds.
pub type EpochMs = i64;

/// Milliseconds in one day.
pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Lifecycle state shared by tasks, projects and goals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Todo,
    InProgress,
    Completed,
    Archived,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
            Self::Archived => "archived",
        }
    }

    /// Returns whether work in this state still needs attention.
    pub fn is_open(self) -> bool {
        matches!(self, Self::Todo | Self::InProgress)
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::Todo
    }
}

/// Priority shared by tasks, projects and goals.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 4] = [Self::Low, Self::Medium, Self::High, Self::Urgent];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::Medium
    }
}

/// Removes duplicate ids while keeping first-occurrence order.
pub fn dedupe_ids(ids: &mut Vec<uuid::Uuid>) {
    let mut seen = std::collections::HashSet::with_capacity(ids.len());
    ids.retain(|id| seen.insert(*id));
}

#[cfg(test)]
mod tests {
    use super::{dedupe_ids, Priority, Status};
    use uuid::Uuid;

    #[test]
    fn dedupe_keeps_first_occurrence_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut ids = vec![a, b, a, b, a];
        dedupe_ids(&mut ids);
        assert_eq!(ids, vec![a, b]);
    }

    #[test]
    fn status_serializes_as_kebab_case() {
        let text = serde_json::to_string(&Status::InProgress).unwrap();
        assert_eq!(text, "\"in-progress\"");
        assert_eq!(Status::InProgress.as_str(), "in-progress");
        assert!(!Status::Archived.is_open());
    }

    #[test]
    fn priority_defaults_to_medium() {
        assert_eq!(Priority::default(), Priority::Medium);
    }
}
