//! Workspace use-case service.
//!
//! # Responsibility
//! - Own the store state and every collaborator it talks to.
//! - Run each mutation through store -> automation cascade -> snapshot save.
//! - Expose read-side projections over the current state.
//!
//! # Invariants
//! - One mutation runs at a time; its cascade settles before it returns.
//! - Every successful mutation saves a full snapshot.
//! - A rejected mutation changes nothing and saves nothing.
//! - A mutation whose save fails is rolled back, cascade effects and stats
//!   included. Notifications already handed to the sink are not recalled.
//! - Cascade truncation is reported in the result and stats, never raised.
//!
//! The service is single-threaded (`!Sync`). Callers sharing it across
//! threads must serialize access, e.g. behind a `Mutex`.

use crate::automation::engine::{AutomationEngine, CascadeReport};
use crate::automation::event::DomainEvent;
use crate::automation::notify::NotificationSink;
use crate::clock::Clock;
use crate::config::CoreConfig;
use crate::model::automation::{Automation, AutomationId, AutomationPatch, NewAutomation};
use crate::model::document::{Document, DocumentId, DocumentPatch, NewDocument};
use crate::model::goal::{Goal, GoalId, GoalPatch, MilestoneId, NewGoal};
use crate::model::project::{NewProject, Project, ProjectId, ProjectPatch};
use crate::model::tag::{Tag, TagId, TagPatch};
use crate::model::task::{NewTask, Task, TaskId, TaskPatch};
use crate::model::{Priority, Status};
use crate::persist::snapshot::{self, encode, encode_pretty};
use crate::persist::{PersistError, SnapshotStore};
use crate::query::filter::{filter_tasks, Selection, TaskFilter};
use crate::query::overview::{task_overview, upcoming_tasks, TaskOverview, UpcomingTasks};
use crate::store::{EntityKind, Mutation, StoreError, StoreState, TagRemoval};
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug)]
pub enum ServiceError {
    Store(StoreError),
    Persist(PersistError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Persist(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Persist(err) => Some(err),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<PersistError> for ServiceError {
    fn from(value: PersistError) -> Self {
        Self::Persist(value)
    }
}

/// Entity written by a mutation plus the cascade it caused.
#[derive(Debug, Clone, PartialEq)]
pub struct Applied<T> {
    pub value: T,
    pub cascade: CascadeReport,
}

/// Cumulative automation counters since the service was opened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub cascades: u64,
    pub actions_executed: u64,
    pub skipped_actions: u64,
    pub truncated_cascades: u64,
}

impl EngineStats {
    fn record(&mut self, report: &CascadeReport) {
        self.cascades += 1;
        self.actions_executed += u64::from(report.actions_executed);
        self.skipped_actions += u64::from(report.skipped_actions);
        if report.is_truncated() {
            self.truncated_cascades += 1;
        }
    }
}

/// State-owning facade over store, automation engine and persistence.
pub struct WorkspaceService<S, N, C>
where
    S: SnapshotStore,
    N: NotificationSink,
    C: Clock,
{
    state: StoreState,
    store: S,
    sink: N,
    clock: C,
    engine: AutomationEngine,
    snapshot_key: String,
    stats: EngineStats,
}

impl<S, N, C> WorkspaceService<S, N, C>
where
    S: SnapshotStore,
    N: NotificationSink,
    C: Clock,
{
    /// Loads the persisted snapshot, or starts fresh when none exists.
    ///
    /// Loaded snapshots go through reference repair before use.
    pub fn open(store: S, sink: N, clock: C, config: &CoreConfig) -> ServiceResult<Self> {
        let state = match store.load(&config.snapshot_key)? {
            Some(text) => {
                let mut state = snapshot::decode(&text)?;
                let repaired = state.repair_references();
                info!(
                    "event=snapshot_load module=service status=ok tasks={} automations={} repaired_refs={}",
                    state.tasks().len(),
                    state.automations().len(),
                    repaired
                );
                state
            }
            None if config.seed_default_tags => StoreState::with_default_tags(),
            None => StoreState::new(),
        };

        Ok(Self {
            state,
            store,
            sink,
            clock,
            engine: AutomationEngine::new(config.cascade_limits()),
            snapshot_key: config.snapshot_key.clone(),
            stats: EngineStats::default(),
        })
    }

    pub fn state(&self) -> &StoreState {
        &self.state
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    pub fn snapshot_store(&self) -> &S {
        &self.store
    }

    pub fn sink(&self) -> &N {
        &self.sink
    }

    pub fn tasks(&self) -> &[Task] {
        self.state.tasks()
    }

    pub fn get_task(&self, id: TaskId) -> Option<&Task> {
        self.state.task(id)
    }

    // ---- tasks ----

    pub fn create_task(&mut self, input: NewTask) -> ServiceResult<Applied<Task>> {
        let checkpoint = self.checkpoint();
        let now = self.clock.now_ms();
        let mutation = self.state.insert_task(input, now)?;
        info!(
            "event=task_create module=service status=ok task_id={}",
            mutation.value.id
        );
        self.commit(checkpoint, mutation, now, |state, task| state.task(task.id).cloned())
    }

    pub fn update_task(&mut self, id: TaskId, patch: TaskPatch) -> ServiceResult<Applied<Task>> {
        let checkpoint = self.checkpoint();
        let now = self.clock.now_ms();
        let mutation = self.state.update_task(id, patch, now)?;
        debug!(
            "event=task_update module=service status=ok task_id={id} events={}",
            mutation.events.len()
        );
        self.commit(checkpoint, mutation, now, |state, task| state.task(task.id).cloned())
    }

    pub fn complete_task(&mut self, id: TaskId) -> ServiceResult<Applied<Task>> {
        let checkpoint = self.checkpoint();
        let now = self.clock.now_ms();
        let mutation = self.state.complete_task(id, now)?;
        info!(
            "event=task_complete module=service status=ok task_id={id} first_completion={}",
            !mutation.events.is_empty()
        );
        self.commit(checkpoint, mutation, now, |state, task| state.task(task.id).cloned())
    }

    pub fn delete_task(&mut self, id: TaskId) -> ServiceResult<Task> {
        let checkpoint = self.checkpoint();
        let removed = self.state.remove_task(id)?;
        info!("event=task_delete module=service status=ok task_id={id}");
        self.persist(checkpoint)?;
        Ok(removed)
    }

    /// Emits `task-due-soon` for every open task with a due date.
    ///
    /// Each task is its own top-level cascade; reports are merged.
    pub fn scan_due_soon(&mut self) -> ServiceResult<CascadeReport> {
        let checkpoint = self.checkpoint();
        let now = self.clock.now_ms();
        let subjects: Vec<TaskId> = self
            .state
            .tasks()
            .iter()
            .filter(|task| task.status.is_open() && task.due_date.is_some())
            .map(|task| task.id)
            .collect();

        let mut combined = CascadeReport::default();
        for task in subjects {
            let report = self.cascade(vec![DomainEvent::TaskDueSoon { task }], now);
            combined.merge(report);
        }
        self.persist(checkpoint)?;
        Ok(combined)
    }

    // ---- projects ----

    pub fn create_project(&mut self, input: NewProject) -> ServiceResult<Project> {
        let checkpoint = self.checkpoint();
        let project = self.state.insert_project(input, self.clock.now_ms())?;
        self.persist(checkpoint)?;
        Ok(project)
    }

    pub fn update_project(
        &mut self,
        id: ProjectId,
        patch: ProjectPatch,
    ) -> ServiceResult<Applied<Project>> {
        let checkpoint = self.checkpoint();
        let now = self.clock.now_ms();
        let mutation = self.state.update_project(id, patch, now)?;
        self.commit(checkpoint, mutation, now, |state, project| {
            state.project(project.id).cloned()
        })
    }

    /// Completes a project and its tasks; task completions run automations.
    pub fn complete_project(&mut self, id: ProjectId) -> ServiceResult<Applied<Project>> {
        let checkpoint = self.checkpoint();
        let now = self.clock.now_ms();
        let mutation = self.state.complete_project(id, now)?;
        info!(
            "event=project_complete module=service status=ok project_id={id} tasks_completed={}",
            mutation.events.len()
        );
        self.commit(checkpoint, mutation, now, |state, project| {
            state.project(project.id).cloned()
        })
    }

    pub fn delete_project(&mut self, id: ProjectId) -> ServiceResult<Project> {
        let checkpoint = self.checkpoint();
        let removed = self.state.remove_project(id, self.clock.now_ms())?;
        self.persist(checkpoint)?;
        Ok(removed)
    }

    // ---- goals ----

    pub fn create_goal(&mut self, input: NewGoal) -> ServiceResult<Goal> {
        let checkpoint = self.checkpoint();
        let goal = self.state.insert_goal(input, self.clock.now_ms())?;
        self.persist(checkpoint)?;
        Ok(goal)
    }

    pub fn update_goal(&mut self, id: GoalId, patch: GoalPatch) -> ServiceResult<Goal> {
        let checkpoint = self.checkpoint();
        let goal = self.state.update_goal(id, patch, self.clock.now_ms())?;
        self.persist(checkpoint)?;
        Ok(goal)
    }

    pub fn update_goal_progress(&mut self, id: GoalId, current: f64) -> ServiceResult<Goal> {
        let checkpoint = self.checkpoint();
        let goal = self.state.set_goal_progress(id, current, self.clock.now_ms())?;
        self.persist(checkpoint)?;
        Ok(goal)
    }

    pub fn complete_goal(&mut self, id: GoalId) -> ServiceResult<Goal> {
        let checkpoint = self.checkpoint();
        let goal = self.state.complete_goal(id, self.clock.now_ms())?;
        self.persist(checkpoint)?;
        Ok(goal)
    }

    pub fn toggle_milestone(
        &mut self,
        goal_id: GoalId,
        milestone_id: MilestoneId,
    ) -> ServiceResult<Goal> {
        let checkpoint = self.checkpoint();
        let goal = self
            .state
            .toggle_milestone(goal_id, milestone_id, self.clock.now_ms())?;
        self.persist(checkpoint)?;
        Ok(goal)
    }

    pub fn delete_goal(&mut self, id: GoalId) -> ServiceResult<Goal> {
        let checkpoint = self.checkpoint();
        let removed = self.state.remove_goal(id, self.clock.now_ms())?;
        self.persist(checkpoint)?;
        Ok(removed)
    }

    // ---- tags ----

    pub fn create_tag(&mut self, name: &str, color: &str) -> ServiceResult<Tag> {
        let checkpoint = self.checkpoint();
        let tag = self.state.insert_tag(name, color)?;
        self.persist(checkpoint)?;
        Ok(tag)
    }

    pub fn update_tag(&mut self, id: TagId, patch: TagPatch) -> ServiceResult<Tag> {
        let checkpoint = self.checkpoint();
        let tag = self.state.update_tag(id, patch)?;
        self.persist(checkpoint)?;
        Ok(tag)
    }

    pub fn delete_tag(&mut self, id: TagId) -> ServiceResult<TagRemoval> {
        let checkpoint = self.checkpoint();
        let removal = self.state.remove_tag(id, self.clock.now_ms())?;
        info!(
            "event=tag_delete module=service status=ok tag_id={id} stripped_refs={} dropped_automations={}",
            removal.stripped_refs,
            removal.dropped_automations.len()
        );
        self.persist(checkpoint)?;
        Ok(removal)
    }

    // ---- documents ----

    pub fn create_document(&mut self, input: NewDocument) -> ServiceResult<Document> {
        let checkpoint = self.checkpoint();
        let document = self.state.insert_document(input, self.clock.now_ms())?;
        self.persist(checkpoint)?;
        Ok(document)
    }

    pub fn update_document(
        &mut self,
        id: DocumentId,
        patch: DocumentPatch,
    ) -> ServiceResult<Document> {
        let checkpoint = self.checkpoint();
        let document = self.state.update_document(id, patch, self.clock.now_ms())?;
        self.persist(checkpoint)?;
        Ok(document)
    }

    pub fn delete_document(&mut self, id: DocumentId) -> ServiceResult<Document> {
        let checkpoint = self.checkpoint();
        let removed = self.state.remove_document(id)?;
        self.persist(checkpoint)?;
        Ok(removed)
    }

    // ---- automations ----

    pub fn create_automation(&mut self, input: NewAutomation) -> ServiceResult<Automation> {
        let checkpoint = self.checkpoint();
        let automation = self.state.insert_automation(input, self.clock.now_ms())?;
        info!(
            "event=automation_create module=service status=ok automation_id={} trigger={} action={}",
            automation.id,
            automation.trigger.kind().as_str(),
            automation.action.kind_str()
        );
        self.persist(checkpoint)?;
        Ok(automation)
    }

    pub fn update_automation(
        &mut self,
        id: AutomationId,
        patch: AutomationPatch,
    ) -> ServiceResult<Automation> {
        let checkpoint = self.checkpoint();
        let automation = self.state.update_automation(id, patch)?;
        self.persist(checkpoint)?;
        Ok(automation)
    }

    pub fn toggle_automation(&mut self, id: AutomationId) -> ServiceResult<Automation> {
        let checkpoint = self.checkpoint();
        let automation = self.state.toggle_automation(id)?;
        self.persist(checkpoint)?;
        Ok(automation)
    }

    pub fn delete_automation(&mut self, id: AutomationId) -> ServiceResult<Automation> {
        let checkpoint = self.checkpoint();
        let removed = self.state.remove_automation(id)?;
        self.persist(checkpoint)?;
        Ok(removed)
    }

    // ---- filter ----

    pub fn set_status_filter(&mut self, status: Selection<Status>) -> ServiceResult<()> {
        let checkpoint = self.checkpoint();
        self.state.filter_mut().status = status;
        self.persist(checkpoint)
    }

    pub fn set_priority_filter(&mut self, priority: Selection<Priority>) -> ServiceResult<()> {
        let checkpoint = self.checkpoint();
        self.state.filter_mut().priority = priority;
        self.persist(checkpoint)
    }

    /// Adds or removes one tag from the filter; the tag must exist.
    pub fn toggle_tag_filter(&mut self, tag: TagId) -> ServiceResult<()> {
        if !self.state.has_tag(tag) {
            return Err(StoreError::NotFound {
                kind: EntityKind::Tag,
                id: tag,
            }
            .into());
        }
        let checkpoint = self.checkpoint();
        self.state.filter_mut().toggle_tag(tag);
        self.persist(checkpoint)
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) -> ServiceResult<()> {
        let checkpoint = self.checkpoint();
        self.state.filter_mut().search_query = query.into();
        self.persist(checkpoint)
    }

    pub fn reset_filters(&mut self) -> ServiceResult<()> {
        let checkpoint = self.checkpoint();
        *self.state.filter_mut() = TaskFilter::default();
        self.persist(checkpoint)
    }

    // ---- queries ----

    /// Tasks admitted by the current filter state.
    pub fn filtered_tasks(&self) -> Vec<&Task> {
        filter_tasks(self.state.tasks(), self.state.filter())
    }

    pub fn overview(&self) -> TaskOverview {
        task_overview(self.state.tasks(), self.state.tags(), self.clock.now_ms())
    }

    pub fn upcoming(&self) -> UpcomingTasks {
        upcoming_tasks(self.state.tasks(), self.clock.now_ms())
    }

    // ---- export / import ----

    /// Serializes the full state for download and archives a copy.
    pub fn export_snapshot(&mut self) -> ServiceResult<String> {
        let text = encode_pretty(&self.state)?;
        self.store
            .archive(&self.snapshot_key, &text, self.clock.now_ms())?;
        info!(
            "event=snapshot_export module=service status=ok bytes={}",
            text.len()
        );
        Ok(text)
    }

    /// Replaces the whole state with an exported snapshot.
    ///
    /// Returns how many dangling references were repaired. The current
    /// state is kept when decoding fails.
    pub fn import_snapshot(&mut self, text: &str) -> ServiceResult<usize> {
        let checkpoint = self.checkpoint();
        let state = snapshot::decode(text)?;
        self.install(checkpoint, state)
    }

    /// Writes the export to `path`, then archives the same text.
    pub fn export_to_path(&mut self, path: impl AsRef<Path>) -> ServiceResult<()> {
        let path = path.as_ref();
        let text = snapshot::export_to_path(&self.state, path)?;
        self.store
            .archive(&self.snapshot_key, &text, self.clock.now_ms())?;
        info!(
            "event=snapshot_export module=service status=ok path={} bytes={}",
            path.display(),
            text.len()
        );
        Ok(())
    }

    pub fn import_from_path(&mut self, path: impl AsRef<Path>) -> ServiceResult<usize> {
        let checkpoint = self.checkpoint();
        let state = snapshot::import_from_path(path)?;
        self.install(checkpoint, state)
    }

    // ---- internals ----

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            state: self.state.clone(),
            stats: self.stats,
        }
    }

    fn install(&mut self, checkpoint: Checkpoint, mut state: StoreState) -> ServiceResult<usize> {
        let repaired = state.repair_references();
        self.state = state;
        info!(
            "event=snapshot_import module=service status=ok tasks={} repaired_refs={}",
            self.state.tasks().len(),
            repaired
        );
        self.persist(checkpoint)?;
        Ok(repaired)
    }

    fn commit<T>(
        &mut self,
        checkpoint: Checkpoint,
        mutation: Mutation<T>,
        now: i64,
        reread: impl FnOnce(&StoreState, &T) -> Option<T>,
    ) -> ServiceResult<Applied<T>> {
        let Mutation { value, events } = mutation;
        let cascade = self.cascade(events, now);
        let value = reread(&self.state, &value).unwrap_or(value);
        self.persist(checkpoint)?;
        Ok(Applied { value, cascade })
    }

    fn cascade(&mut self, events: Vec<DomainEvent>, now: i64) -> CascadeReport {
        if events.is_empty() {
            return CascadeReport::default();
        }
        let report = self.engine.run(&mut self.state, events, now, &mut self.sink);
        self.stats.record(&report);
        if let Some(limit) = report.truncated {
            warn!(
                "event=automation_cascade module=service status=truncated truncated_total={} error={}",
                self.stats.truncated_cascades, limit
            );
        }
        report
    }

    /// Saves the current state; on failure restores `checkpoint`.
    fn persist(&mut self, checkpoint: Checkpoint) -> ServiceResult<()> {
        let saved = encode(&self.state)
            .and_then(|text| self.store.save(&self.snapshot_key, &text).map(|()| text));
        match saved {
            Ok(text) => {
                debug!(
                    "event=snapshot_save module=service status=ok bytes={}",
                    text.len()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=snapshot_save module=service status=error action=rollback error={}",
                    err
                );
                self.state = checkpoint.state;
                self.stats = checkpoint.stats;
                Err(err.into())
            }
        }
    }
}

/// State captured before a mutation, restored when its save fails.
struct Checkpoint {
    state: StoreState,
    stats: EngineStats,
}
