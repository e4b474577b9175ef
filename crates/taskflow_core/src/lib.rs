//! Core domain logic for Taskflow.
//!
//! This crate owns the productivity store (tasks, projects, goals, tags,
//! documents, automations), the project-progress metric, the automation
//! engine and its cascade guard, the task query layer and snapshot
//! persistence. UI shells talk to it through [`WorkspaceService`].

pub mod automation;
pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod persist;
pub mod query;
pub mod service;
pub mod store;

pub use automation::engine::{
    AutomationEngine, CascadeLimitExceeded, CascadeLimits, CascadeReport, SkipReason,
};
pub use automation::event::DomainEvent;
pub use automation::notify::{
    LogNotificationSink, Notification, NotificationOutbox, NotificationSink,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{
    default_log_level, init_logging, init_logging_from_config, logging_status, LoggingError,
};
pub use metrics::progress::project_progress;
pub use model::automation::{Action, Automation, AutomationId, NewAutomation, Trigger};
pub use model::document::{Document, DocumentId, NewDocument};
pub use model::goal::{Goal, GoalId, Milestone, MilestoneId, NewGoal};
pub use model::project::{NewProject, Project, ProjectId};
pub use model::tag::{Tag, TagId};
pub use model::task::{NewTask, Task, TaskId, TaskPatch};
pub use model::validation::ValidationError;
pub use model::{EpochMs, Priority, Status};
pub use persist::memory_store::MemorySnapshotStore;
pub use persist::sqlite_store::SqliteSnapshotStore;
pub use persist::{PersistError, PersistResult, SnapshotStore};
pub use query::filter::{filter_tasks, Selection, TaskFilter};
pub use query::overview::{task_overview, upcoming_tasks, TaskOverview, UpcomingTasks};
pub use service::workspace_service::{
    Applied, EngineStats, ServiceError, ServiceResult, WorkspaceService,
};
pub use store::{EntityKind, Mutation, StoreError, StoreResult, StoreState, TagRemoval};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
