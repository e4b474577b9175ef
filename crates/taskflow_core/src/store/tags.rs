//! Tag mutations with cascading reference cleanup.

use super::{EntityKind, StoreError, StoreResult, StoreState};
use crate::model::automation::AutomationId;
use crate::model::tag::{Tag, TagId, TagPatch};
use crate::model::EpochMs;
use uuid::Uuid;

/// Outcome of deleting a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRemoval {
    pub tag: Tag,
    /// References stripped from tasks, projects, goals, documents, the task
    /// filter and create-task action tag lists.
    pub stripped_refs: usize,
    /// Automations whose trigger or add-tag action needed the tag.
    pub dropped_automations: Vec<AutomationId>,
}

fn strip(tags: &mut Vec<TagId>, id: TagId) -> bool {
    let before = tags.len();
    tags.retain(|tag| *tag != id);
    tags.len() != before
}

impl StoreState {
    pub fn insert_tag(&mut self, name: &str, color: &str) -> StoreResult<Tag> {
        let (name, color) = Tag::validate_fields(name, color)?;
        let tag = Tag {
            id: Uuid::new_v4(),
            name,
            color,
        };
        self.tags.push(tag.clone());
        Ok(tag)
    }

    pub fn update_tag(&mut self, id: TagId, patch: TagPatch) -> StoreResult<Tag> {
        let index = self.tag_index(id)?;
        let current = &self.tags[index];
        let name = patch.name.unwrap_or_else(|| current.name.clone());
        let color = patch.color.unwrap_or_else(|| current.color.clone());
        let (name, color) = Tag::validate_fields(&name, &color)?;

        let tag = &mut self.tags[index];
        tag.name = name;
        tag.color = color;
        Ok(tag.clone())
    }

    /// Deletes a tag and strips every reference to it.
    ///
    /// Entities that carried the tag get `updated_at = now`. Automations that
    /// can never fire or act without the tag are removed.
    pub fn remove_tag(&mut self, id: TagId, now: EpochMs) -> StoreResult<TagRemoval> {
        let index = self.tag_index(id)?;
        let tag = self.tags.remove(index);
        let mut stripped_refs = 0;

        for task in &mut self.tasks {
            if strip(&mut task.tags, id) {
                task.updated_at = now;
                stripped_refs += 1;
            }
        }
        for project in &mut self.projects {
            if strip(&mut project.tags, id) {
                project.updated_at = now;
                stripped_refs += 1;
            }
        }
        for goal in &mut self.goals {
            if strip(&mut goal.tags, id) {
                goal.updated_at = now;
                stripped_refs += 1;
            }
        }
        for document in &mut self.documents {
            if strip(&mut document.tags, id) {
                document.updated_at = now;
                stripped_refs += 1;
            }
        }
        if strip(&mut self.filter.tags, id) {
            stripped_refs += 1;
        }

        let dropped_automations = self
            .automations
            .iter()
            .filter(|automation| automation.depends_on_tag(id))
            .map(|automation| automation.id)
            .collect::<Vec<_>>();
        self.automations
            .retain(|automation| !dropped_automations.contains(&automation.id));
        for automation in &mut self.automations {
            stripped_refs += automation.strip_action_tag(id);
        }

        Ok(TagRemoval {
            tag,
            stripped_refs,
            dropped_automations,
        })
    }

    fn tag_index(&self, id: TagId) -> StoreResult<usize> {
        self.tags
            .iter()
            .position(|tag| tag.id == id)
            .ok_or(StoreError::NotFound {
                kind: EntityKind::Tag,
                id,
            })
    }
}
