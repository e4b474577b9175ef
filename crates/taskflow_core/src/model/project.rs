//! Project model.
//!
//! # Invariants
//! - `progress` is derived from the project's tasks and never set by callers.
//! - A completed project reports `progress == 100`.

use crate::model::tag::TagId;
use crate::model::{EpochMs, Priority, Status};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ProjectId = Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: Status,
    pub priority: Priority,
    #[serde(default)]
    pub tags: Vec<TagId>,
    #[serde(default)]
    pub start_date: Option<EpochMs>,
    #[serde(default)]
    pub due_date: Option<EpochMs>,
    #[serde(default)]
    pub team_members: Vec<String>,
    /// Completion percentage in `[0, 100]`.
    pub progress: f64,
    pub created_at: EpochMs,
    pub updated_at: EpochMs,
    #[serde(default)]
    pub completed_at: Option<EpochMs>,
}

impl Project {
    pub fn is_completed(&self) -> bool {
        self.status == Status::Completed
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    pub status: Status,
    pub priority: Priority,
    pub tags: Vec<TagId>,
    pub start_date: Option<EpochMs>,
    pub due_date: Option<EpochMs>,
    pub team_members: Vec<String>,
}

impl NewProject {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Partial project update. Progress is intentionally absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub tags: Option<Vec<TagId>>,
    pub start_date: Option<Option<EpochMs>>,
    pub due_date: Option<Option<EpochMs>>,
    pub team_members: Option<Vec<String>>,
}
