//! Tag model.
//!
//! # Invariants
//! - Tag identity is immutable; only `name` and `color` change.
//! - Deleting a tag strips its id from every referencing entity.

use crate::model::validation::{require_name, ValidationError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type TagId = Uuid;

static TAG_COLOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("valid tag color regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    /// CSS hex color, `#rgb` or `#rrggbb`.
    pub color: String,
}

/// Partial update for a tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagPatch {
    pub name: Option<String>,
    pub color: Option<String>,
}

impl Tag {
    /// Validates name and color, returning trimmed copies.
    pub fn validate_fields(name: &str, color: &str) -> Result<(String, String), ValidationError> {
        require_name(name)?;
        let color = color.trim();
        if !TAG_COLOR_RE.is_match(color) {
            return Err(ValidationError::InvalidColor(color.to_string()));
        }
        Ok((name.trim().to_string(), color.to_string()))
    }
}

/// Tags seeded into a fresh store.
pub fn default_tags() -> Vec<Tag> {
    [("Personal", "#3b82f6"), ("Work", "#f97316"), ("Home", "#14b8a6")]
        .into_iter()
        .map(|(name, color)| Tag {
            id: Uuid::new_v4(),
            name: name.to_string(),
            color: color.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{default_tags, Tag};
    use crate::model::validation::ValidationError;

    #[test]
    fn accepts_short_and_long_hex_colors() {
        assert!(Tag::validate_fields("Work", "#f97316").is_ok());
        assert!(Tag::validate_fields("Work", " #abc ").is_ok());
    }

    #[test]
    fn rejects_invalid_color_and_blank_name() {
        let err = Tag::validate_fields("Work", "orange").unwrap_err();
        assert_eq!(err, ValidationError::InvalidColor("orange".to_string()));
        let err = Tag::validate_fields("   ", "#fff").unwrap_err();
        assert_eq!(err, ValidationError::EmptyName);
    }

    #[test]
    fn default_tags_have_unique_ids() {
        let tags = default_tags();
        assert_eq!(tags.len(), 3);
        assert_ne!(tags[0].id, tags[1].id);
        assert_eq!(tags[1].name, "Work");
    }
}
