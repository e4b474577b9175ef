//! Input validation errors shared by every entity kind.

use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Rejection raised before a mutation reaches the store.
///
/// A validation failure never leaves partial state behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Task, goal or document title is blank after trim.
    EmptyTitle,
    /// Project, tag or automation name is blank after trim.
    EmptyName,
    /// Tag color is not `#rgb` or `#rrggbb`.
    InvalidColor(String),
    /// Referenced tag id is not in the tag collection.
    UnknownTag(Uuid),
    /// Referenced project id is not in the project collection.
    UnknownProject(Uuid),
    /// Referenced goal id is not in the goal collection.
    UnknownGoal(Uuid),
    /// Goal target must be a positive finite number.
    InvalidGoalTarget,
    /// Notification action carries a blank message.
    EmptyNotification,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title must not be blank"),
            Self::EmptyName => write!(f, "name must not be blank"),
            Self::InvalidColor(value) => write!(f, "invalid tag color `{value}`"),
            Self::UnknownTag(id) => write!(f, "unknown tag: {id}"),
            Self::UnknownProject(id) => write!(f, "unknown project: {id}"),
            Self::UnknownGoal(id) => write!(f, "unknown goal: {id}"),
            Self::InvalidGoalTarget => write!(f, "goal target must be a positive number"),
            Self::EmptyNotification => write!(f, "notification message must not be blank"),
        }
    }
}

impl Error for ValidationError {}

/// Ensures a user-facing title is not blank.
pub fn require_title(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    Ok(())
}

/// Ensures a user-facing name is not blank.
pub fn require_name(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(())
}
