//! Automation rule model: one trigger, one action, an on/off switch.
//!
//! # Responsibility
//! - Define the closed set of trigger and action kinds.
//! - Validate rule payloads before they are stored.
//!
//! # Invariants
//! - Rules hold weak references (tag ids) that are re-resolved on execution.
//! - Toggling `active` has no side effects beyond the flag itself.

use crate::model::tag::TagId;
use crate::model::validation::{require_name, require_title, ValidationError};
use crate::model::{EpochMs, Priority};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type AutomationId = Uuid;

/// Discriminant shared by triggers and domain events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerKind {
    TaskCreated,
    TaskCompleted,
    TaskDueSoon,
    PriorityChanged,
    TagAdded,
}

impl TriggerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TaskCreated => "task-created",
            Self::TaskCompleted => "task-completed",
            Self::TaskDueSoon => "task-due-soon",
            Self::PriorityChanged => "priority-changed",
            Self::TagAdded => "tag-added",
        }
    }
}

/// Condition an automation listens for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Trigger {
    TaskCreated,
    TaskCompleted,
    /// Fires when the subject task is due within `days` whole days.
    TaskDueSoon { days: i64 },
    /// Fires when a task's priority changes to exactly `priority`.
    PriorityChanged { priority: Priority },
    /// Fires when exactly `tag` is newly added to a task.
    TagAdded { tag: TagId },
}

impl Trigger {
    pub fn kind(&self) -> TriggerKind {
        match self {
            Self::TaskCreated => TriggerKind::TaskCreated,
            Self::TaskCompleted => TriggerKind::TaskCompleted,
            Self::TaskDueSoon { .. } => TriggerKind::TaskDueSoon,
            Self::PriorityChanged { .. } => TriggerKind::PriorityChanged,
            Self::TagAdded { .. } => TriggerKind::TagAdded,
        }
    }

    pub fn tag_ref(&self) -> Option<TagId> {
        match self {
            Self::TagAdded { tag } => Some(*tag),
            _ => None,
        }
    }
}

/// Effect an automation performs when its trigger matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Action {
    CreateTask {
        title: String,
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        priority: Option<Priority>,
        #[serde(default)]
        tags: Vec<TagId>,
    },
    ChangePriority {
        priority: Priority,
    },
    AddTag {
        tag: TagId,
    },
    SendNotification {
        message: String,
    },
}

impl Action {
    pub fn kind_str(&self) -> &'static str {
        match self {
            Self::CreateTask { .. } => "create-task",
            Self::ChangePriority { .. } => "change-priority",
            Self::AddTag { .. } => "add-tag",
            Self::SendNotification { .. } => "send-notification",
        }
    }

    /// All tag ids this action refers to.
    pub fn tag_refs(&self) -> Vec<TagId> {
        match self {
            Self::CreateTask { tags, .. } => tags.clone(),
            Self::AddTag { tag } => vec![*tag],
            Self::ChangePriority { .. } | Self::SendNotification { .. } => vec![],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Automation {
    pub id: AutomationId,
    pub name: String,
    pub active: bool,
    pub trigger: Trigger,
    pub action: Action,
    pub created_at: EpochMs,
}

impl Automation {
    /// Returns whether the rule can no longer be satisfied once `tag` is gone.
    pub fn depends_on_tag(&self, tag: TagId) -> bool {
        self.trigger.tag_ref() == Some(tag) || matches!(self.action, Action::AddTag { tag: t } if t == tag)
    }

    /// Removes `tag` from a create-task tag list. Returns the number removed.
    pub(crate) fn strip_action_tag(&mut self, tag: TagId) -> usize {
        match &mut self.action {
            Action::CreateTask { tags, .. } => {
                let before = tags.len();
                tags.retain(|id| *id != tag);
                before - tags.len()
            }
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAutomation {
    pub name: String,
    pub active: bool,
    pub trigger: Trigger,
    pub action: Action,
}

impl NewAutomation {
    /// Builds an active rule.
    pub fn new(name: impl Into<String>, trigger: Trigger, action: Action) -> Self {
        Self {
            name: name.into(),
            active: true,
            trigger,
            action,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutomationPatch {
    pub name: Option<String>,
    pub active: Option<bool>,
    pub trigger: Option<Trigger>,
    pub action: Option<Action>,
}

/// Validates a rule payload independent of store contents.
pub fn validate_rule(name: &str, action: &Action) -> Result<(), ValidationError> {
    require_name(name)?;
    match action {
        Action::CreateTask { title, .. } => require_title(title),
        Action::SendNotification { message } if message.trim().is_empty() => {
            Err(ValidationError::EmptyNotification)
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::{validate_rule, Action, Trigger, TriggerKind};
    use crate::model::validation::ValidationError;
    use crate::model::Priority;
    use uuid::Uuid;

    #[test]
    fn trigger_serializes_with_type_tag() {
        let trigger = Trigger::PriorityChanged {
            priority: Priority::High,
        };
        let json = serde_json::to_value(&trigger).unwrap();
        assert_eq!(json["type"], "priority-changed");
        assert_eq!(json["priority"], "high");
        assert_eq!(trigger.kind(), TriggerKind::PriorityChanged);
    }

    #[test]
    fn create_task_action_defaults_optional_fields_on_read() {
        let action: Action =
            serde_json::from_str(r#"{"type":"create-task","title":"Follow up"}"#).unwrap();
        assert_eq!(
            action,
            Action::CreateTask {
                title: "Follow up".to_string(),
                description: None,
                priority: None,
                tags: vec![],
            }
        );
    }

    #[test]
    fn validate_rule_rejects_blank_payloads() {
        let notify = Action::SendNotification {
            message: "  ".to_string(),
        };
        assert_eq!(
            validate_rule("ping", &notify).unwrap_err(),
            ValidationError::EmptyNotification
        );
        let add_tag = Action::AddTag { tag: Uuid::new_v4() };
        assert_eq!(validate_rule("", &add_tag).unwrap_err(), ValidationError::EmptyName);
    }
}
