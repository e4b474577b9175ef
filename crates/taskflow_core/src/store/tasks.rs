//! Task mutations and the domain events they emit.

use super::{EntityKind, Mutation, StoreError, StoreResult, StoreState};
use crate::automation::event::DomainEvent;
use crate::model::dedupe_ids;
use crate::model::task::{NewTask, Task, TaskId, TaskPatch};
use crate::model::validation::require_title;
use crate::model::{EpochMs, Status};
use uuid::Uuid;

impl StoreState {
    /// Appends a new task and emits `TaskCreated`.
    pub fn insert_task(&mut self, input: NewTask, now: EpochMs) -> StoreResult<Mutation<Task>> {
        require_title(&input.title)?;
        let mut tags = input.tags;
        dedupe_ids(&mut tags);
        self.check_tags(&tags)?;
        self.check_project(input.project_id)?;
        self.check_goal(input.goal_id)?;

        let task = Task {
            id: Uuid::new_v4(),
            title: input.title.trim().to_string(),
            description: input.description,
            status: input.status,
            priority: input.priority,
            tags,
            project_id: input.project_id,
            goal_id: input.goal_id,
            due_date: input.due_date,
            created_at: now,
            updated_at: now,
            completed_at: (input.status == Status::Completed).then_some(now),
        };

        self.tasks.push(task.clone());
        self.refresh_progress([task.project_id]);
        Ok(Mutation {
            events: vec![DomainEvent::TaskCreated { task: task.id }],
            value: task,
        })
    }

    /// Merges `patch` into an existing task (last write wins per field).
    ///
    /// # Events
    /// - `PriorityChanged` only when the priority value actually differs.
    /// - `TagAdded` once per tag id absent before the update, in patch order.
    /// - `TaskCompleted` when the status enters `Completed`.
    pub fn update_task(
        &mut self,
        id: TaskId,
        patch: TaskPatch,
        now: EpochMs,
    ) -> StoreResult<Mutation<Task>> {
        let index = self.task_index(id)?;
        let previous = self.tasks[index].clone();
        let mut next = previous.clone();

        if let Some(title) = patch.title {
            require_title(&title)?;
            next.title = title.trim().to_string();
        }
        if let Some(description) = patch.description {
            next.description = description;
        }
        if let Some(priority) = patch.priority {
            next.priority = priority;
        }
        if let Some(mut tags) = patch.tags {
            dedupe_ids(&mut tags);
            self.check_tags(&tags)?;
            next.tags = tags;
        }
        if let Some(project_id) = patch.project_id {
            self.check_project(project_id)?;
            next.project_id = project_id;
        }
        if let Some(goal_id) = patch.goal_id {
            self.check_goal(goal_id)?;
            next.goal_id = goal_id;
        }
        if let Some(due_date) = patch.due_date {
            next.due_date = due_date;
        }
        let completed_now = match patch.status {
            Some(status) => next.set_status(status, now),
            None => false,
        };
        next.updated_at = now;

        let mut events = Vec::new();
        if next.priority != previous.priority {
            events.push(DomainEvent::PriorityChanged {
                task: id,
                priority: next.priority,
            });
        }
        events.extend(
            next.tags
                .iter()
                .filter(|tag| !previous.has_tag(**tag))
                .map(|tag| DomainEvent::TagAdded { task: id, tag: *tag }),
        );
        if completed_now {
            events.push(DomainEvent::TaskCompleted { task: id });
        }

        self.tasks[index] = next.clone();
        self.refresh_progress([previous.project_id, next.project_id]);
        Ok(Mutation {
            value: next,
            events,
        })
    }

    /// Marks a task completed and emits `TaskCompleted`.
    ///
    /// Completing an already completed task is a no-op: the first
    /// `completed_at` is preserved and no event is emitted.
    pub fn complete_task(&mut self, id: TaskId, now: EpochMs) -> StoreResult<Mutation<Task>> {
        let index = self.task_index(id)?;
        if self.tasks[index].is_completed() {
            return Ok(Mutation::quiet(self.tasks[index].clone()));
        }

        let task = &mut self.tasks[index];
        task.set_status(Status::Completed, now);
        task.updated_at = now;
        let task = task.clone();

        self.refresh_progress([task.project_id]);
        Ok(Mutation {
            events: vec![DomainEvent::TaskCompleted { task: task.id }],
            value: task,
        })
    }

    /// Removes a task and recomputes its project's progress.
    pub fn remove_task(&mut self, id: TaskId) -> StoreResult<Task> {
        let index = self.task_index(id)?;
        let removed = self.tasks.remove(index);
        self.refresh_progress([removed.project_id]);
        Ok(removed)
    }

    fn task_index(&self, id: TaskId) -> StoreResult<usize> {
        self.tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or(StoreError::NotFound {
                kind: EntityKind::Task,
                id,
            })
    }
}

#[cfg(test)]
mod tests {
    use crate::automation::event::DomainEvent;
    use crate::model::project::NewProject;
    use crate::model::task::{NewTask, TaskPatch};
    use crate::model::validation::ValidationError;
    use crate::model::{Priority, Status};
    use crate::store::{StoreError, StoreState};
    use uuid::Uuid;

    #[test]
    fn insert_rejects_blank_title_without_writing() {
        let mut state = StoreState::new();
        let err = state.insert_task(NewTask::titled("   "), 1).unwrap_err();
        assert_eq!(err, StoreError::Validation(ValidationError::EmptyTitle));
        assert!(state.tasks().is_empty());
    }

    #[test]
    fn insert_rejects_unknown_tag() {
        let mut state = StoreState::new();
        let ghost = Uuid::new_v4();
        let input = NewTask {
            tags: vec![ghost],
            ..NewTask::titled("tagged")
        };
        let err = state.insert_task(input, 1).unwrap_err();
        assert_eq!(err, StoreError::Validation(ValidationError::UnknownTag(ghost)));
    }

    #[test]
    fn update_emits_only_real_changes() {
        let mut state = StoreState::with_default_tags();
        let work = state.tags()[1].id;
        let home = state.tags()[2].id;
        let created = state
            .insert_task(
                NewTask {
                    tags: vec![work],
                    ..NewTask::titled("plan")
                },
                1,
            )
            .unwrap();
        let id = created.value.id;

        let same = state
            .update_task(id, TaskPatch::priority(Priority::Medium), 2)
            .unwrap();
        assert!(same.events.is_empty());
        assert_eq!(same.value.updated_at, 2);

        let changed = state
            .update_task(
                id,
                TaskPatch {
                    priority: Some(Priority::High),
                    tags: Some(vec![work, home, home]),
                    ..TaskPatch::default()
                },
                3,
            )
            .unwrap();
        assert_eq!(
            changed.events,
            vec![
                DomainEvent::PriorityChanged {
                    task: id,
                    priority: Priority::High
                },
                DomainEvent::TagAdded { task: id, tag: home },
            ]
        );
        assert_eq!(changed.value.tags, vec![work, home]);
    }

    #[test]
    fn status_patch_tracks_completed_at() {
        let mut state = StoreState::new();
        let id = state.insert_task(NewTask::titled("ship"), 1).unwrap().value.id;
        let done = state
            .update_task(
                id,
                TaskPatch {
                    status: Some(Status::Completed),
                    ..TaskPatch::default()
                },
                5,
            )
            .unwrap();
        assert_eq!(done.value.completed_at, Some(5));
        assert_eq!(done.events, vec![DomainEvent::TaskCompleted { task: id }]);

        let reopened = state
            .update_task(
                id,
                TaskPatch {
                    status: Some(Status::Todo),
                    ..TaskPatch::default()
                },
                6,
            )
            .unwrap();
        assert_eq!(reopened.value.completed_at, None);
    }

    #[test]
    fn moving_task_between_projects_updates_both() {
        let mut state = StoreState::new();
        let first = state.insert_project(NewProject::named("a"), 1).unwrap().id;
        let second = state.insert_project(NewProject::named("b"), 1).unwrap().id;
        let id = state
            .insert_task(
                NewTask {
                    project_id: Some(first),
                    status: Status::Completed,
                    ..NewTask::titled("moved")
                },
                2,
            )
            .unwrap()
            .value
            .id;
        assert_eq!(state.project(first).unwrap().progress, 100.0);

        state
            .update_task(
                id,
                TaskPatch {
                    project_id: Some(Some(second)),
                    ..TaskPatch::default()
                },
                3,
            )
            .unwrap();
        assert_eq!(state.project(first).unwrap().progress, 0.0);
        assert_eq!(state.project(second).unwrap().progress, 100.0);
    }

    #[test]
    fn missing_task_is_not_found() {
        let mut state = StoreState::new();
        let ghost = Uuid::new_v4();
        assert!(matches!(
            state.complete_task(ghost, 1),
            Err(StoreError::NotFound { id, .. }) if id == ghost
        ));
        assert!(state.remove_task(ghost).is_err());
    }
}
