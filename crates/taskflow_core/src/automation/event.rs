//! Domain events emitted by task mutations.

use crate::model::automation::TriggerKind;
use crate::model::tag::TagId;
use crate::model::task::TaskId;
use crate::model::Priority;

/// Something that happened to one subject task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainEvent {
    TaskCreated { task: TaskId },
    TaskCompleted { task: TaskId },
    TaskDueSoon { task: TaskId },
    /// Carries the new priority.
    PriorityChanged { task: TaskId, priority: Priority },
    /// One event per newly added tag.
    TagAdded { task: TaskId, tag: TagId },
}

impl DomainEvent {
    pub fn kind(&self) -> TriggerKind {
        match self {
            Self::TaskCreated { .. } => TriggerKind::TaskCreated,
            Self::TaskCompleted { .. } => TriggerKind::TaskCompleted,
            Self::TaskDueSoon { .. } => TriggerKind::TaskDueSoon,
            Self::PriorityChanged { .. } => TriggerKind::PriorityChanged,
            Self::TagAdded { .. } => TriggerKind::TagAdded,
        }
    }

    pub fn subject(&self) -> TaskId {
        match self {
            Self::TaskCreated { task }
            | Self::TaskCompleted { task }
            | Self::TaskDueSoon { task }
            | Self::PriorityChanged { task, .. }
            | Self::TagAdded { task, .. } => *task,
        }
    }
}
