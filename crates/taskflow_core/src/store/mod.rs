//! In-memory domain store: the single writer of application state.
//!
//! # Responsibility
//! - Own the canonical collections and the task filter state.
//! - Apply mutations atomically: validate first, then write.
//! - Report the domain events each task mutation produced.
//! - Keep project progress consistent after every task mutation.
//!
//! # Invariants
//! - A rejected mutation leaves every collection untouched.
//! - Every mutation on an absent id fails with `StoreError::NotFound`.
//! - No entity holds a tag/project/goal id missing from its collection.
//! - Collections keep insertion order; automations evaluate in that order.

mod automations;
mod documents;
mod goals;
mod projects;
mod tags;
mod tasks;

pub use tags::TagRemoval;

use crate::automation::event::DomainEvent;
use crate::metrics::progress::project_progress;
use crate::model::automation::{Action, Automation, AutomationId};
use crate::model::document::{Document, DocumentId};
use crate::model::goal::{Goal, GoalId};
use crate::model::project::{Project, ProjectId};
use crate::model::tag::{default_tags, Tag, TagId};
use crate::model::task::{Task, TaskId};
use crate::model::validation::ValidationError;
use crate::query::filter::TaskFilter;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type StoreResult<T> = Result<T, StoreError>;

/// Entity collection name used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Task,
    Project,
    Goal,
    Milestone,
    Tag,
    Document,
    Automation,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Project => "project",
            Self::Goal => "goal",
            Self::Milestone => "milestone",
            Self::Tag => "tag",
            Self::Document => "document",
            Self::Automation => "automation",
        }
    }
}

/// Store mutation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    NotFound { kind: EntityKind, id: Uuid },
    Validation(ValidationError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { kind, id } => write!(f, "{} not found: {id}", kind.as_str()),
            Self::Validation(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound { .. } => None,
        }
    }
}

impl From<ValidationError> for StoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Result of a mutation: the written entity plus the events it emitted.
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation<T> {
    pub value: T,
    pub events: Vec<DomainEvent>,
}

impl<T> Mutation<T> {
    pub(crate) fn quiet(value: T) -> Self {
        Self {
            value,
            events: Vec::new(),
        }
    }
}

/// Canonical application state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreState {
    #[serde(default)]
    tasks: Vec<Task>,
    #[serde(default)]
    projects: Vec<Project>,
    #[serde(default)]
    goals: Vec<Goal>,
    #[serde(default)]
    tags: Vec<Tag>,
    #[serde(default)]
    documents: Vec<Document>,
    #[serde(default)]
    automations: Vec<Automation>,
    #[serde(default)]
    filter: TaskFilter,
}

impl StoreState {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the default Personal/Work/Home tags.
    pub fn with_default_tags() -> Self {
        Self {
            tags: default_tags(),
            ..Self::default()
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn automations(&self) -> &[Automation] {
        &self.automations
    }

    pub fn filter(&self) -> &TaskFilter {
        &self.filter
    }

    pub(crate) fn filter_mut(&mut self) -> &mut TaskFilter {
        &mut self.filter
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn project(&self, id: ProjectId) -> Option<&Project> {
        self.projects.iter().find(|project| project.id == id)
    }

    pub fn goal(&self, id: GoalId) -> Option<&Goal> {
        self.goals.iter().find(|goal| goal.id == id)
    }

    pub fn tag(&self, id: TagId) -> Option<&Tag> {
        self.tags.iter().find(|tag| tag.id == id)
    }

    pub fn document(&self, id: DocumentId) -> Option<&Document> {
        self.documents.iter().find(|doc| doc.id == id)
    }

    pub fn automation(&self, id: AutomationId) -> Option<&Automation> {
        self.automations.iter().find(|automation| automation.id == id)
    }

    pub fn has_tag(&self, id: TagId) -> bool {
        self.tag(id).is_some()
    }

    /// Fails with `UnknownTag` for the first id missing from the tag collection.
    pub(crate) fn check_tags(&self, ids: &[TagId]) -> Result<(), ValidationError> {
        match ids.iter().find(|id| !self.has_tag(**id)) {
            Some(missing) => Err(ValidationError::UnknownTag(*missing)),
            None => Ok(()),
        }
    }

    pub(crate) fn check_project(&self, id: Option<ProjectId>) -> Result<(), ValidationError> {
        match id {
            Some(id) if self.project(id).is_none() => Err(ValidationError::UnknownProject(id)),
            _ => Ok(()),
        }
    }

    pub(crate) fn check_goal(&self, id: Option<GoalId>) -> Result<(), ValidationError> {
        match id {
            Some(id) if self.goal(id).is_none() => Err(ValidationError::UnknownGoal(id)),
            _ => Ok(()),
        }
    }

    /// Post-mutation hook: recomputes progress for every touched project.
    ///
    /// Completed projects stay pinned at 100.
    pub(crate) fn refresh_progress<I>(&mut self, touched: I)
    where
        I: IntoIterator<Item = Option<ProjectId>>,
    {
        for project_id in touched.into_iter().flatten() {
            let Some(index) = self.projects.iter().position(|p| p.id == project_id) else {
                continue;
            };
            let progress = if self.projects[index].is_completed() {
                100.0
            } else {
                project_progress(project_id, &self.tasks)
            };
            self.projects[index].progress = progress;
        }
    }

    /// Strips every reference to entities that no longer exist.
    ///
    /// Used after loading external snapshots. Returns the number of
    /// references removed (dropped automations count once each).
    pub fn repair_references(&mut self) -> usize {
        let tag_ids: HashSet<TagId> =
            self.tags.iter().map(|tag| tag.id).collect();
        let project_ids: HashSet<ProjectId> =
            self.projects.iter().map(|project| project.id).collect();
        let goal_ids: HashSet<GoalId> =
            self.goals.iter().map(|goal| goal.id).collect();
        let mut removed = 0;

        let retain_tags = |tags: &mut Vec<TagId>| {
            let before = tags.len();
            tags.retain(|id| tag_ids.contains(id));
            before - tags.len()
        };

        for task in &mut self.tasks {
            removed += retain_tags(&mut task.tags);
            if task.project_id.is_some_and(|id| !project_ids.contains(&id)) {
                task.project_id = None;
                removed += 1;
            }
            if task.goal_id.is_some_and(|id| !goal_ids.contains(&id)) {
                task.goal_id = None;
                removed += 1;
            }
        }
        for project in &mut self.projects {
            removed += retain_tags(&mut project.tags);
        }
        for goal in &mut self.goals {
            removed += retain_tags(&mut goal.tags);
        }
        for document in &mut self.documents {
            removed += retain_tags(&mut document.tags);
            if document
                .project_id
                .is_some_and(|id| !project_ids.contains(&id))
            {
                document.project_id = None;
                removed += 1;
            }
        }
        removed += retain_tags(&mut self.filter.tags);

        let before = self.automations.len();
        self.automations.retain(|automation| {
            let trigger_ok = automation
                .trigger
                .tag_ref()
                .map_or(true, |id| tag_ids.contains(&id));
            let action_ok = match automation.action {
                Action::AddTag { tag } => tag_ids.contains(&tag),
                _ => true,
            };
            trigger_ok && action_ok
        });
        removed += before - self.automations.len();
        for automation in &mut self.automations {
            if let Action::CreateTask { tags, .. } = &mut automation.action {
                removed += retain_tags(tags);
            }
        }

        let all_projects: Vec<Option<ProjectId>> =
            self.projects.iter().map(|project| Some(project.id)).collect();
        self.refresh_progress(all_projects);
        removed
    }
}
