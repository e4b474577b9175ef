//! Goal model with numeric progress and milestones.
//!
//! # Invariants
//! - `target > 0`.
//! - Reaching `current >= target` completes the goal.
//! - Completing the goal sets `current = target`.

use crate::model::tag::TagId;
use crate::model::{EpochMs, Priority, Status};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type GoalId = Uuid;
pub type MilestoneId = Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub id: MilestoneId,
    pub title: String,
    pub target: f64,
    pub is_completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: GoalId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub target: f64,
    pub current: f64,
    pub unit: String,
    pub status: Status,
    pub priority: Priority,
    #[serde(default)]
    pub tags: Vec<TagId>,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
    #[serde(default)]
    pub start_date: Option<EpochMs>,
    #[serde(default)]
    pub due_date: Option<EpochMs>,
    pub created_at: EpochMs,
    pub updated_at: EpochMs,
    #[serde(default)]
    pub completed_at: Option<EpochMs>,
}

impl Goal {
    pub fn is_completed(&self) -> bool {
        self.status == Status::Completed
    }

    /// Completion ratio as a percentage, capped at 100.
    pub fn percent(&self) -> f64 {
        if self.target <= 0.0 {
            return 0.0;
        }
        (self.current / self.target * 100.0).clamp(0.0, 100.0)
    }

    pub(crate) fn mark_completed(&mut self, now: EpochMs) {
        self.current = self.target;
        self.status = Status::Completed;
        if self.completed_at.is_none() {
            self.completed_at = Some(now);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMilestone {
    pub title: String,
    pub target: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewGoal {
    pub title: String,
    pub description: Option<String>,
    pub target: f64,
    pub current: f64,
    pub unit: String,
    pub status: Status,
    pub priority: Priority,
    pub tags: Vec<TagId>,
    pub milestones: Vec<NewMilestone>,
    pub start_date: Option<EpochMs>,
    pub due_date: Option<EpochMs>,
}

impl NewGoal {
    pub fn new(title: impl Into<String>, target: f64, unit: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            target,
            current: 0.0,
            unit: unit.into(),
            status: Status::Todo,
            priority: Priority::Medium,
            tags: vec![],
            milestones: vec![],
            start_date: None,
            due_date: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GoalPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub target: Option<f64>,
    pub unit: Option<String>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub tags: Option<Vec<TagId>>,
    pub start_date: Option<Option<EpochMs>>,
    pub due_date: Option<Option<EpochMs>>,
}
