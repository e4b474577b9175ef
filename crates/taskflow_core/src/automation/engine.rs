//! Automation engine: trigger matching, action dispatch, cascade limits.
//!
//! Cascades are driven by an explicit stack of event frames rather than
//! recursion. A frame's matching rules are resolved when the frame is first
//! visited, so a rule sees the store as left by every earlier action.

use crate::automation::event::DomainEvent;
use crate::automation::notify::{Notification, NotificationSink};
use crate::model::automation::{Action, Automation, AutomationId, Trigger};
use crate::model::task::{NewTask, Task, TaskPatch};
use crate::model::{EpochMs, Priority, Status, DAY_MS};
use crate::store::StoreState;
use log::{debug, warn};
use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const DEFAULT_MAX_CASCADE_DEPTH: u32 = 10;
pub const DEFAULT_MAX_CASCADE_ACTIONS: u32 = 256;

/// Bounds applied to one top-level cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CascadeLimits {
    /// Deepest event depth still evaluated; top-level events are depth 0.
    pub max_depth: u32,
    /// Maximum actions executed before the cascade is cut.
    pub max_actions: u32,
}

impl Default for CascadeLimits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_CASCADE_DEPTH,
            max_actions: DEFAULT_MAX_CASCADE_ACTIONS,
        }
    }
}

/// A cascade was cut short. Effects applied before the cut remain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeLimitExceeded {
    Depth { limit: u32 },
    Actions { limit: u32 },
}

impl Display for CascadeLimitExceeded {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Depth { limit } => write!(f, "automation cascade exceeded depth limit {limit}"),
            Self::Actions { limit } => {
                write!(f, "automation cascade exceeded action limit {limit}")
            }
        }
    }
}

impl Error for CascadeLimitExceeded {}

/// Why a matched action was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The subject task no longer exists.
    MissingTask,
    /// The referenced tag no longer exists.
    MissingTag,
    /// The store rejected the action's write.
    Rejected,
    /// The action would not change anything.
    AlreadyApplied,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingTask => "missing_task",
            Self::MissingTag => "missing_tag",
            Self::Rejected => "rejected",
            Self::AlreadyApplied => "already_applied",
        }
    }
}

/// Summary of one cascade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeReport {
    pub events_processed: u32,
    pub actions_executed: u32,
    pub skipped_actions: u32,
    pub truncated: Option<CascadeLimitExceeded>,
}

impl CascadeReport {
    pub fn is_truncated(&self) -> bool {
        self.truncated.is_some()
    }

    /// Folds another report into this one. The first truncation wins.
    pub fn merge(&mut self, other: CascadeReport) {
        self.events_processed += other.events_processed;
        self.actions_executed += other.actions_executed;
        self.skipped_actions += other.skipped_actions;
        if self.truncated.is_none() {
            self.truncated = other.truncated;
        }
    }
}

enum Outcome {
    Applied(Vec<DomainEvent>),
    Skipped(SkipReason),
}

struct Frame {
    event: DomainEvent,
    depth: u32,
    pending: Option<VecDeque<AutomationId>>,
}

impl Frame {
    fn new(event: DomainEvent, depth: u32) -> Self {
        Self {
            event,
            depth,
            pending: None,
        }
    }
}

/// Returns whole days until `due`, rounded up. Negative when overdue.
///
/// Distances beyond the `i64` range saturate.
pub fn days_until(due: EpochMs, now: EpochMs) -> i64 {
    let diff = due.saturating_sub(now);
    let days = diff / DAY_MS;
    if diff % DAY_MS > 0 {
        days + 1
    } else {
        days
    }
}

/// Returns whether `trigger` matches `event` for the given subject task.
///
/// Type match is required; priority, tag and due-date triggers refine it.
/// A due-soon trigger never matches a missing task or a task without a due
/// date.
pub fn trigger_matches(
    trigger: &Trigger,
    event: &DomainEvent,
    subject: Option<&Task>,
    now: EpochMs,
) -> bool {
    match (trigger, event) {
        (Trigger::TaskCreated, DomainEvent::TaskCreated { .. }) => true,
        (Trigger::TaskCompleted, DomainEvent::TaskCompleted { .. }) => true,
        (Trigger::TaskDueSoon { days }, DomainEvent::TaskDueSoon { .. }) => subject
            .and_then(|task| task.due_date)
            .is_some_and(|due| days_until(due, now) <= *days),
        (
            Trigger::PriorityChanged { priority: wanted },
            DomainEvent::PriorityChanged { priority, .. },
        ) => wanted == priority,
        (Trigger::TagAdded { tag: wanted }, DomainEvent::TagAdded { tag, .. }) => wanted == tag,
        _ => false,
    }
}

/// Stateless rule evaluator; all state lives in the store it is given.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutomationEngine {
    limits: CascadeLimits,
}

impl AutomationEngine {
    pub fn new(limits: CascadeLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> CascadeLimits {
        self.limits
    }

    /// Ids of active rules matching `event`, in declaration order.
    pub fn matching(
        &self,
        state: &StoreState,
        event: &DomainEvent,
        now: EpochMs,
    ) -> Vec<AutomationId> {
        let subject = state.task(event.subject());
        state
            .automations()
            .iter()
            .filter(|automation| automation.active)
            .filter(|automation| automation.trigger.kind() == event.kind())
            .filter(|automation| trigger_matches(&automation.trigger, event, subject, now))
            .map(|automation| automation.id)
            .collect()
    }

    /// Processes `events` and every event their actions induce.
    ///
    /// Events are handled depth-first: all effects of one rule's action run
    /// before the next matching rule. Returns when the cascade settles or a
    /// limit is hit.
    pub fn run(
        &self,
        state: &mut StoreState,
        events: Vec<DomainEvent>,
        now: EpochMs,
        sink: &mut dyn NotificationSink,
    ) -> CascadeReport {
        let mut report = CascadeReport::default();
        let mut stack: Vec<Frame> = events
            .into_iter()
            .rev()
            .map(|event| Frame::new(event, 0))
            .collect();

        while let Some(frame) = stack.last_mut() {
            if frame.pending.is_none() {
                let matches = self.matching(state, &frame.event, now);
                report.events_processed += 1;
                if frame.depth > self.limits.max_depth && !matches.is_empty() {
                    report.truncated = Some(CascadeLimitExceeded::Depth {
                        limit: self.limits.max_depth,
                    });
                    break;
                }
                frame.pending = Some(matches.into());
            }

            let next = frame.pending.as_mut().and_then(VecDeque::pop_front);
            let Some(automation_id) = next else {
                stack.pop();
                continue;
            };
            let event = frame.event;
            let depth = frame.depth;

            if report.actions_executed >= self.limits.max_actions {
                report.truncated = Some(CascadeLimitExceeded::Actions {
                    limit: self.limits.max_actions,
                });
                break;
            }
            let Some(automation) = state.automation(automation_id).cloned() else {
                continue;
            };

            match execute(state, &automation, &event, now, sink) {
                Outcome::Applied(induced) => {
                    report.actions_executed += 1;
                    debug!(
                        "event=automation_fire module=automation status=ok automation_id={} trigger={} action={} depth={} induced={}",
                        automation.id,
                        automation.trigger.kind().as_str(),
                        automation.action.kind_str(),
                        depth,
                        induced.len()
                    );
                    stack.extend(
                        induced
                            .into_iter()
                            .rev()
                            .map(|event| Frame::new(event, depth + 1)),
                    );
                }
                Outcome::Skipped(reason) => {
                    report.skipped_actions += 1;
                    debug!(
                        "event=automation_skip module=automation status=skipped automation_id={} action={} reason={}",
                        automation.id,
                        automation.action.kind_str(),
                        reason.as_str()
                    );
                }
            }
        }

        if let Some(limit) = report.truncated {
            warn!(
                "event=automation_cascade module=automation status=truncated events={} actions={} error={}",
                report.events_processed, report.actions_executed, limit
            );
        }
        report
    }
}

fn execute(
    state: &mut StoreState,
    automation: &Automation,
    event: &DomainEvent,
    now: EpochMs,
    sink: &mut dyn NotificationSink,
) -> Outcome {
    let subject = event.subject();
    match &automation.action {
        Action::CreateTask {
            title,
            description,
            priority,
            tags,
        } => {
            let tags = tags.iter().copied().filter(|tag| state.has_tag(*tag)).collect();
            let input = NewTask {
                title: title.clone(),
                description: description.clone(),
                status: Status::Todo,
                priority: priority.unwrap_or(Priority::Medium),
                tags,
                ..NewTask::default()
            };
            match state.insert_task(input, now) {
                Ok(mutation) => Outcome::Applied(mutation.events),
                Err(_) => Outcome::Skipped(SkipReason::Rejected),
            }
        }
        Action::ChangePriority { priority } => {
            if state.task(subject).is_none() {
                return Outcome::Skipped(SkipReason::MissingTask);
            }
            match state.update_task(subject, TaskPatch::priority(*priority), now) {
                Ok(mutation) => Outcome::Applied(mutation.events),
                Err(_) => Outcome::Skipped(SkipReason::Rejected),
            }
        }
        Action::AddTag { tag } => {
            if !state.has_tag(*tag) {
                return Outcome::Skipped(SkipReason::MissingTag);
            }
            let Some(task) = state.task(subject) else {
                return Outcome::Skipped(SkipReason::MissingTask);
            };
            if task.has_tag(*tag) {
                return Outcome::Skipped(SkipReason::AlreadyApplied);
            }
            let mut tags = task.tags.clone();
            tags.push(*tag);
            match state.update_task(subject, TaskPatch::tags(tags), now) {
                Ok(mutation) => Outcome::Applied(mutation.events),
                Err(_) => Outcome::Skipped(SkipReason::Rejected),
            }
        }
        Action::SendNotification { message } => {
            sink.deliver(Notification {
                automation_id: automation.id,
                task_id: subject,
                message: message.clone(),
                sent_at: now,
            });
            Outcome::Applied(Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{days_until, trigger_matches, AutomationEngine, CascadeLimits};
    use crate::automation::event::DomainEvent;
    use crate::automation::notify::NotificationOutbox;
    use crate::model::automation::{Action, NewAutomation, Trigger};
    use crate::model::task::NewTask;
    use crate::model::{Priority, DAY_MS};
    use crate::store::StoreState;
    use uuid::Uuid;

    #[test]
    fn days_until_rounds_up() {
        assert_eq!(days_until(DAY_MS, 0), 1);
        assert_eq!(days_until(DAY_MS + 1, 0), 2);
        assert_eq!(days_until(0, 0), 0);
        assert_eq!(days_until(0, DAY_MS / 2), 0);
        assert_eq!(days_until(0, DAY_MS * 3), -3);
    }

    #[test]
    fn days_until_saturates_at_extreme_dates() {
        let now = 1_700_000_000_000;
        assert_eq!(days_until(i64::MIN, now), i64::MIN / DAY_MS);
        assert_eq!(days_until(i64::MAX, now), (i64::MAX - now) / DAY_MS + 1);
        assert_eq!(days_until(i64::MAX, i64::MIN), i64::MAX / DAY_MS + 1);
    }

    #[test]
    fn priority_trigger_matches_new_value_only() {
        let trigger = Trigger::PriorityChanged {
            priority: Priority::High,
        };
        let task = Uuid::new_v4();
        let to_high = DomainEvent::PriorityChanged {
            task,
            priority: Priority::High,
        };
        let to_urgent = DomainEvent::PriorityChanged {
            task,
            priority: Priority::Urgent,
        };
        assert!(trigger_matches(&trigger, &to_high, None, 0));
        assert!(!trigger_matches(&trigger, &to_urgent, None, 0));
        assert!(!trigger_matches(&trigger, &DomainEvent::TaskCreated { task }, None, 0));
    }

    #[test]
    fn inactive_rules_are_ignored() {
        let mut state = StoreState::new();
        let rule = state
            .insert_automation(
                NewAutomation {
                    active: false,
                    ..NewAutomation::new(
                        "announce",
                        Trigger::TaskCreated,
                        Action::SendNotification {
                            message: "new task".to_string(),
                        },
                    )
                },
                0,
            )
            .unwrap();
        let created = state.insert_task(NewTask::titled("seed"), 1).unwrap();

        let engine = AutomationEngine::default();
        let outbox = NotificationOutbox::new();
        let report = engine.run(&mut state, created.events.clone(), 1, &mut outbox.clone());
        assert_eq!(report.actions_executed, 0);
        assert!(outbox.is_empty());

        state.toggle_automation(rule.id).unwrap();
        let report = engine.run(&mut state, created.events, 2, &mut outbox.clone());
        assert_eq!(report.actions_executed, 1);
        assert_eq!(outbox.drain()[0].message, "new task");
    }

    #[test]
    fn self_feeding_rule_stops_at_depth_limit() {
        let mut state = StoreState::new();
        state
            .insert_automation(
                NewAutomation::new(
                    "spawn",
                    Trigger::TaskCreated,
                    Action::CreateTask {
                        title: "spawned".to_string(),
                        description: None,
                        priority: None,
                        tags: vec![],
                    },
                ),
                0,
            )
            .unwrap();
        let created = state.insert_task(NewTask::titled("seed"), 1).unwrap();

        let engine = AutomationEngine::new(CascadeLimits {
            max_depth: 3,
            max_actions: 100,
        });
        let report = engine.run(&mut state, created.events, 1, &mut NotificationOutbox::new());
        assert!(report.is_truncated());
        // seed + one spawned task per evaluated depth (0..=3)
        assert_eq!(state.tasks().len(), 5);
        assert_eq!(report.actions_executed, 4);
    }

    #[test]
    fn add_tag_on_tagged_task_is_skipped_without_spending_budget() {
        let mut state = StoreState::new();
        let tag = state.insert_tag("Work", "#f97316").unwrap();
        state
            .insert_automation(
                NewAutomation::new("tag work", Trigger::TaskCreated, Action::AddTag { tag: tag.id }),
                0,
            )
            .unwrap();
        let created = state
            .insert_task(
                NewTask {
                    tags: vec![tag.id],
                    ..NewTask::titled("already tagged")
                },
                1,
            )
            .unwrap();

        let engine = AutomationEngine::new(CascadeLimits {
            max_depth: 10,
            max_actions: 1,
        });
        let report = engine.run(&mut state, created.events, 1, &mut NotificationOutbox::new());
        assert_eq!(report.actions_executed, 0);
        assert_eq!(report.skipped_actions, 1);
        assert!(!report.is_truncated());
        assert_eq!(state.tasks()[0].tags, vec![tag.id]);
    }

    #[test]
    fn action_limit_cuts_wide_cascades() {
        let mut state = StoreState::new();
        for name in ["a", "b", "c"] {
            state
                .insert_automation(
                    NewAutomation::new(
                        name,
                        Trigger::TaskCreated,
                        Action::SendNotification {
                            message: name.to_string(),
                        },
                    ),
                    0,
                )
                .unwrap();
        }
        let created = state.insert_task(NewTask::titled("seed"), 1).unwrap();
        let engine = AutomationEngine::new(CascadeLimits {
            max_depth: 10,
            max_actions: 2,
        });
        let outbox = NotificationOutbox::new();
        let report = engine.run(&mut state, created.events, 1, &mut outbox.clone());
        assert_eq!(report.actions_executed, 2);
        assert_eq!(outbox.len(), 2);
        assert!(report.is_truncated());
    }
}
