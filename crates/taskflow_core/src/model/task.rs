//! Task model.
//!
//! # Responsibility
//! - Define the task record and its create/patch inputs.
//!
//! # Invariants
//! - `completed_at` is `Some` exactly when `status == Completed`.
//! - `tags` holds no duplicate ids.
//! - `updated_at` is refreshed on every mutation.

use crate::model::goal::GoalId;
use crate::model::project::ProjectId;
use crate::model::tag::TagId;
use crate::model::{EpochMs, Priority, Status};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type TaskId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: Status,
    pub priority: Priority,
    #[serde(default)]
    pub tags: Vec<TagId>,
    #[serde(default)]
    pub project_id: Option<ProjectId>,
    #[serde(default)]
    pub goal_id: Option<GoalId>,
    #[serde(default)]
    pub due_date: Option<EpochMs>,
    pub created_at: EpochMs,
    pub updated_at: EpochMs,
    #[serde(default)]
    pub completed_at: Option<EpochMs>,
}

impl Task {
    pub fn is_completed(&self) -> bool {
        self.status == Status::Completed
    }

    pub fn has_tag(&self, tag: TagId) -> bool {
        self.tags.contains(&tag)
    }

    /// Applies a status value and keeps `completed_at` consistent.
    ///
    /// Returns `true` when the task transitioned into `Completed`.
    pub(crate) fn set_status(&mut self, status: Status, now: EpochMs) -> bool {
        let was_completed = self.is_completed();
        self.status = status;
        match (was_completed, status == Status::Completed) {
            (false, true) => {
                self.completed_at = Some(now);
                true
            }
            (true, false) => {
                self.completed_at = None;
                false
            }
            _ => false,
        }
    }
}

/// Create input for a task. Omitted fields take model defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub status: Status,
    pub priority: Priority,
    pub tags: Vec<TagId>,
    pub project_id: Option<ProjectId>,
    pub goal_id: Option<GoalId>,
    pub due_date: Option<EpochMs>,
}

impl NewTask {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Partial task update; `None` leaves a field untouched.
///
/// Clearable fields use `Some(None)` to reset the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub tags: Option<Vec<TagId>>,
    pub project_id: Option<Option<ProjectId>>,
    pub goal_id: Option<Option<GoalId>>,
    pub due_date: Option<Option<EpochMs>>,
}

impl TaskPatch {
    pub fn priority(priority: Priority) -> Self {
        Self {
            priority: Some(priority),
            ..Self::default()
        }
    }

    pub fn tags(tags: Vec<TagId>) -> Self {
        Self {
            tags: Some(tags),
            ..Self::default()
        }
    }
}
