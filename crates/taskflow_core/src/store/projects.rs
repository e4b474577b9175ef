//! Project mutations.
//!
//! # Invariants
//! - Completing a project force-completes its tasks and pins progress at 100.
//! - Deleting a project clears `project_id` on tasks and documents; the
//!   dependents themselves survive.

use super::{EntityKind, Mutation, StoreError, StoreResult, StoreState};
use crate::automation::event::DomainEvent;
use crate::model::dedupe_ids;
use crate::model::project::{NewProject, Project, ProjectId, ProjectPatch};
use crate::model::validation::require_name;
use crate::model::{EpochMs, Status};
use uuid::Uuid;

impl StoreState {
    pub fn insert_project(&mut self, input: NewProject, now: EpochMs) -> StoreResult<Project> {
        require_name(&input.name)?;
        let mut tags = input.tags;
        dedupe_ids(&mut tags);
        self.check_tags(&tags)?;

        let project = Project {
            id: Uuid::new_v4(),
            name: input.name.trim().to_string(),
            description: input.description,
            status: input.status,
            priority: input.priority,
            tags,
            start_date: input.start_date,
            due_date: input.due_date,
            team_members: input.team_members,
            progress: if input.status == Status::Completed {
                100.0
            } else {
                0.0
            },
            created_at: now,
            updated_at: now,
            completed_at: (input.status == Status::Completed).then_some(now),
        };
        self.projects.push(project.clone());
        Ok(project)
    }

    /// Merges `patch` into a project.
    ///
    /// A status change into `Completed` behaves like [`Self::complete_project`].
    pub fn update_project(
        &mut self,
        id: ProjectId,
        patch: ProjectPatch,
        now: EpochMs,
    ) -> StoreResult<Mutation<Project>> {
        let index = self.project_index(id)?;
        let mut next = self.projects[index].clone();

        if let Some(name) = patch.name {
            require_name(&name)?;
            next.name = name.trim().to_string();
        }
        if let Some(mut tags) = patch.tags {
            dedupe_ids(&mut tags);
            self.check_tags(&tags)?;
            next.tags = tags;
        }
        if let Some(description) = patch.description {
            next.description = description;
        }
        if let Some(priority) = patch.priority {
            next.priority = priority;
        }
        if let Some(start_date) = patch.start_date {
            next.start_date = start_date;
        }
        if let Some(due_date) = patch.due_date {
            next.due_date = due_date;
        }
        if let Some(team_members) = patch.team_members {
            next.team_members = team_members;
        }
        next.updated_at = now;

        let completing = patch.status == Some(Status::Completed) && !next.is_completed();
        if let Some(status) = patch.status.filter(|status| *status != Status::Completed) {
            next.status = status;
            next.completed_at = None;
        }
        self.projects[index] = next;

        if completing {
            return self.complete_project(id, now);
        }
        self.refresh_progress([Some(id)]);
        Ok(Mutation::quiet(self.projects[index].clone()))
    }

    /// Completes a project and every task that belongs to it.
    ///
    /// Emits `TaskCompleted` for each task that was not yet completed.
    pub fn complete_project(
        &mut self,
        id: ProjectId,
        now: EpochMs,
    ) -> StoreResult<Mutation<Project>> {
        let index = self.project_index(id)?;

        let mut events = Vec::new();
        for task in self
            .tasks
            .iter_mut()
            .filter(|task| task.project_id == Some(id))
        {
            if task.set_status(Status::Completed, now) {
                task.updated_at = now;
                events.push(DomainEvent::TaskCompleted { task: task.id });
            }
        }

        let project = &mut self.projects[index];
        project.status = Status::Completed;
        project.completed_at.get_or_insert(now);
        project.updated_at = now;
        project.progress = 100.0;

        Ok(Mutation {
            value: project.clone(),
            events,
        })
    }

    /// Removes a project and clears references to it.
    pub fn remove_project(&mut self, id: ProjectId, now: EpochMs) -> StoreResult<Project> {
        let index = self.project_index(id)?;
        let removed = self.projects.remove(index);

        for task in self
            .tasks
            .iter_mut()
            .filter(|task| task.project_id == Some(id))
        {
            task.project_id = None;
            task.updated_at = now;
        }
        for document in self
            .documents
            .iter_mut()
            .filter(|doc| doc.project_id == Some(id))
        {
            document.project_id = None;
            document.updated_at = now;
        }
        Ok(removed)
    }

    fn project_index(&self, id: ProjectId) -> StoreResult<usize> {
        self.projects
            .iter()
            .position(|project| project.id == id)
            .ok_or(StoreError::NotFound {
                kind: EntityKind::Project,
                id,
            })
    }
}
