//! Task list filter.

use crate::model::tag::TagId;
use crate::model::task::Task;
use crate::model::{Priority, Status};
use serde::{Deserialize, Serialize};

/// Either every value or exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Selection<T> {
    All,
    Only(T),
}

impl<T: PartialEq> Selection<T> {
    pub fn admits(&self, value: &T) -> bool {
        match self {
            Self::All => true,
            Self::Only(expected) => expected == value,
        }
    }
}

impl<T> Default for Selection<T> {
    fn default() -> Self {
        Self::All
    }
}

/// Filter state persisted with the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFilter {
    #[serde(default)]
    pub status: Selection<Status>,
    #[serde(default)]
    pub priority: Selection<Priority>,
    /// Task must carry at least one of these; empty admits every task.
    #[serde(default)]
    pub tags: Vec<TagId>,
    /// Case-insensitive title substring; empty admits every task.
    #[serde(default)]
    pub search_query: String,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        if !self.status.admits(&task.status) || !self.priority.admits(&task.priority) {
            return false;
        }
        if !self.tags.is_empty() && !self.tags.iter().any(|tag| task.has_tag(*tag)) {
            return false;
        }
        if self.search_query.is_empty() {
            return true;
        }
        task.title
            .to_lowercase()
            .contains(&self.search_query.to_lowercase())
    }

    /// Adds `tag` when absent, removes it when present.
    pub fn toggle_tag(&mut self, tag: TagId) {
        if let Some(index) = self.tags.iter().position(|id| *id == tag) {
            self.tags.remove(index);
        } else {
            self.tags.push(tag);
        }
    }
}

/// Returns tasks admitted by `filter`, preserving collection order.
pub fn filter_tasks<'a>(tasks: &'a [Task], filter: &TaskFilter) -> Vec<&'a Task> {
    tasks.iter().filter(|task| filter.matches(task)).collect()
}
