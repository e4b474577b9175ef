use taskflow_core::model::DAY_MS;
use taskflow_core::{
    Action, CoreConfig, ManualClock, MemorySnapshotStore, NewAutomation, NewTask,
    NotificationOutbox, Priority, Status, TagId, TaskPatch, Trigger, WorkspaceService,
};

type Service = WorkspaceService<MemorySnapshotStore, NotificationOutbox, ManualClock>;

const START: i64 = 1_700_000_000_000;

fn open_service() -> (Service, NotificationOutbox, ManualClock) {
    let outbox = NotificationOutbox::new();
    let clock = ManualClock::new(START);
    let service = WorkspaceService::open(
        MemorySnapshotStore::new(),
        outbox.clone(),
        clock.clone(),
        &CoreConfig::default(),
    )
    .unwrap();
    (service, outbox, clock)
}

fn notify(name: &str, trigger: Trigger, message: &str) -> NewAutomation {
    NewAutomation::new(
        name,
        trigger,
        Action::SendNotification {
            message: message.to_string(),
        },
    )
}

fn follow_up_rule() -> NewAutomation {
    NewAutomation::new(
        "follow up on completion",
        Trigger::TaskCompleted,
        Action::CreateTask {
            title: "Follow up".to_string(),
            description: None,
            priority: None,
            tags: vec![],
        },
    )
}

fn titled(service: &Service, title: &str) -> usize {
    service
        .state()
        .tasks()
        .iter()
        .filter(|task| task.title == title)
        .count()
}

fn messages(outbox: &NotificationOutbox) -> Vec<String> {
    outbox
        .drain()
        .into_iter()
        .map(|notification| notification.message)
        .collect()
}

fn tag_named(service: &Service, name: &str) -> TagId {
    service
        .state()
        .tags()
        .iter()
        .find(|tag| tag.name == name)
        .unwrap()
        .id
}

#[test]
fn completing_task_creates_exactly_one_follow_up() {
    let (mut service, _outbox, _clock) = open_service();
    service.create_automation(follow_up_rule()).unwrap();
    let task_a = service.create_task(NewTask::titled("task A")).unwrap().value;

    let applied = service.complete_task(task_a.id).unwrap();

    assert_eq!(applied.cascade.actions_executed, 1);
    assert!(!applied.cascade.is_truncated());
    assert_eq!(service.state().tasks().len(), 2);
    let follow_up = service
        .state()
        .tasks()
        .iter()
        .find(|task| task.title == "Follow up")
        .unwrap();
    assert_eq!(follow_up.priority, Priority::Medium);
    assert_eq!(follow_up.status, Status::Todo);
    assert!(follow_up.tags.is_empty());
}

#[test]
fn completing_twice_preserves_first_timestamp_and_fires_once() {
    let (mut service, _outbox, clock) = open_service();
    service.create_automation(follow_up_rule()).unwrap();
    let task = service.create_task(NewTask::titled("pay rent")).unwrap().value;

    let first = service.complete_task(task.id).unwrap();
    clock.advance(60_000);
    let second = service.complete_task(task.id).unwrap();

    assert_eq!(first.value.completed_at, Some(START));
    assert_eq!(second.value.status, Status::Completed);
    assert_eq!(second.value.completed_at, Some(START));
    assert_eq!(second.value.updated_at, first.value.updated_at);
    assert_eq!(second.cascade.actions_executed, 0);
    assert_eq!(titled(&service, "Follow up"), 1);
}

#[test]
fn priority_trigger_fires_on_exact_new_value() {
    let (mut service, outbox, _clock) = open_service();
    service
        .create_automation(notify(
            "escalate",
            Trigger::PriorityChanged {
                priority: Priority::High,
            },
            "now high",
        ))
        .unwrap();
    let task = service.create_task(NewTask::titled("review")).unwrap().value;
    assert_eq!(task.priority, Priority::Medium);

    service
        .update_task(task.id, TaskPatch::priority(Priority::High))
        .unwrap();
    assert_eq!(messages(&outbox), vec!["now high"]);

    service
        .update_task(task.id, TaskPatch::priority(Priority::Urgent))
        .unwrap();
    assert!(outbox.is_empty());

    service
        .update_task(
            task.id,
            TaskPatch {
                title: Some("review draft".to_string()),
                ..TaskPatch::default()
            },
        )
        .unwrap();
    assert!(outbox.is_empty());
}

#[test]
fn tag_trigger_fires_once_per_newly_added_tag() {
    let (mut service, outbox, _clock) = open_service();
    let work = tag_named(&service, "Work");
    let home = tag_named(&service, "Home");
    service
        .create_automation(notify("work tagged", Trigger::TagAdded { tag: work }, "work"))
        .unwrap();
    let task = service.create_task(NewTask::titled("plan")).unwrap().value;

    service
        .update_task(task.id, TaskPatch::tags(vec![work]))
        .unwrap();
    assert_eq!(outbox.drain().len(), 1);

    service
        .update_task(
            task.id,
            TaskPatch {
                description: Some(Some("quarterly".to_string())),
                ..TaskPatch::default()
            },
        )
        .unwrap();
    assert!(outbox.is_empty());

    service
        .update_task(task.id, TaskPatch::tags(vec![work, home]))
        .unwrap();
    assert!(outbox.is_empty());
}

#[test]
fn rules_run_in_declaration_order() {
    let (mut service, outbox, _clock) = open_service();
    service
        .create_automation(notify("X", Trigger::TaskCreated, "X"))
        .unwrap();
    service
        .create_automation(notify("Y", Trigger::TaskCreated, "Y"))
        .unwrap();

    let applied = service.create_task(NewTask::titled("anything")).unwrap();

    assert_eq!(applied.cascade.actions_executed, 2);
    assert_eq!(messages(&outbox), vec!["X", "Y"]);
}

#[test]
fn induced_events_settle_before_next_matching_rule() {
    let (mut service, outbox, _clock) = open_service();
    service.create_automation(follow_up_rule()).unwrap();
    service
        .create_automation(notify("after", Trigger::TaskCompleted, "after"))
        .unwrap();
    service
        .create_automation(notify("created", Trigger::TaskCreated, "created"))
        .unwrap();
    let task = service.create_task(NewTask::titled("draft")).unwrap().value;
    outbox.drain();

    service.complete_task(task.id).unwrap();

    assert_eq!(messages(&outbox), vec!["created", "after"]);
}

#[test]
fn inactive_rules_do_not_fire_until_toggled() {
    let (mut service, outbox, _clock) = open_service();
    let rule = service
        .create_automation(NewAutomation {
            active: false,
            ..notify("quiet", Trigger::TaskCreated, "hello")
        })
        .unwrap();

    service.create_task(NewTask::titled("first")).unwrap();
    assert!(outbox.is_empty());

    let toggled = service.toggle_automation(rule.id).unwrap();
    assert!(toggled.active);
    service.create_task(NewTask::titled("second")).unwrap();
    assert_eq!(messages(&outbox), vec!["hello"]);
}

#[test]
fn change_priority_action_updates_subject_task() {
    let (mut service, _outbox, _clock) = open_service();
    let work = tag_named(&service, "Work");
    service
        .create_automation(NewAutomation::new(
            "work is urgent",
            Trigger::TagAdded { tag: work },
            Action::ChangePriority {
                priority: Priority::Urgent,
            },
        ))
        .unwrap();

    let applied = service
        .create_task(NewTask {
            tags: vec![work],
            ..NewTask::titled("deploy")
        })
        .unwrap();

    assert_eq!(applied.value.priority, Priority::Medium);
    let updated = service
        .update_task(applied.value.id, TaskPatch::tags(vec![]))
        .unwrap();
    assert_eq!(updated.value.priority, Priority::Medium);

    let tagged = service
        .update_task(applied.value.id, TaskPatch::tags(vec![work]))
        .unwrap();
    assert_eq!(tagged.value.priority, Priority::Urgent);
}

#[test]
fn add_tag_action_tags_the_subject_task() {
    let (mut service, _outbox, _clock) = open_service();
    let home = tag_named(&service, "Home");
    service
        .create_automation(NewAutomation::new(
            "default home",
            Trigger::TaskCreated,
            Action::AddTag { tag: home },
        ))
        .unwrap();

    let applied = service.create_task(NewTask::titled("laundry")).unwrap();

    assert_eq!(applied.value.tags, vec![home]);
    assert_eq!(applied.cascade.actions_executed, 1);
}

#[test]
fn due_soon_scan_fires_for_tasks_inside_window() {
    let (mut service, outbox, _clock) = open_service();
    service
        .create_automation(notify(
            "due reminder",
            Trigger::TaskDueSoon { days: 3 },
            "due soon",
        ))
        .unwrap();
    let soon = service
        .create_task(NewTask {
            due_date: Some(START + 2 * DAY_MS),
            ..NewTask::titled("soon")
        })
        .unwrap()
        .value;
    service
        .create_task(NewTask {
            due_date: Some(START + 5 * DAY_MS),
            ..NewTask::titled("later")
        })
        .unwrap();
    service
        .create_task(NewTask {
            due_date: Some(START + DAY_MS),
            status: Status::Completed,
            ..NewTask::titled("done")
        })
        .unwrap();
    service.create_task(NewTask::titled("undated")).unwrap();

    let report = service.scan_due_soon().unwrap();

    assert_eq!(report.events_processed, 2);
    assert_eq!(report.actions_executed, 1);
    let delivered = outbox.drain();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].task_id, soon.id);
    assert_eq!(delivered[0].sent_at, START);
}

#[test]
fn due_soon_window_rounds_partial_days_up() {
    let (mut service, outbox, clock) = open_service();
    service
        .create_automation(notify(
            "tomorrow",
            Trigger::TaskDueSoon { days: 1 },
            "tomorrow",
        ))
        .unwrap();
    service
        .create_task(NewTask {
            due_date: Some(START + DAY_MS + 1),
            ..NewTask::titled("edge")
        })
        .unwrap();

    service.scan_due_soon().unwrap();
    assert!(outbox.is_empty());

    clock.advance(1);
    service.scan_due_soon().unwrap();
    assert_eq!(outbox.len(), 1);
}

#[test]
fn engine_stats_accumulate_across_cascades() {
    let (mut service, _outbox, _clock) = open_service();
    service.create_automation(follow_up_rule()).unwrap();
    let first = service.create_task(NewTask::titled("one")).unwrap().value;
    let second = service.create_task(NewTask::titled("two")).unwrap().value;

    service.complete_task(first.id).unwrap();
    service.complete_task(second.id).unwrap();

    let stats = service.stats();
    assert_eq!(stats.actions_executed, 2);
    assert_eq!(stats.truncated_cascades, 0);
    assert_eq!(titled(&service, "Follow up"), 2);
}

#[test]
fn due_soon_scan_handles_extreme_due_dates() {
    let (mut service, outbox, _clock) = open_service();
    service
        .create_automation(notify(
            "due reminder",
            Trigger::TaskDueSoon { days: 3 },
            "due soon",
        ))
        .unwrap();
    let ancient = service.create_task(NewTask::titled("ancient")).unwrap().value;
    let distant = service.create_task(NewTask::titled("distant")).unwrap().value;
    service
        .update_task(
            ancient.id,
            TaskPatch {
                due_date: Some(Some(i64::MIN)),
                ..TaskPatch::default()
            },
        )
        .unwrap();
    service
        .update_task(
            distant.id,
            TaskPatch {
                due_date: Some(Some(i64::MAX)),
                ..TaskPatch::default()
            },
        )
        .unwrap();

    let report = service.scan_due_soon().unwrap();

    assert_eq!(report.events_processed, 2);
    let delivered = outbox.drain();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].task_id, ancient.id);
    let upcoming = service.upcoming();
    assert_eq!(upcoming.overdue.len(), 1);
    assert_eq!(upcoming.later.len(), 1);
}
