use taskflow_core::model::DAY_MS;
use taskflow_core::{
    CoreConfig, EntityKind, ManualClock, MemorySnapshotStore, NewTask, NotificationOutbox,
    Priority, Selection, ServiceError, Status, StoreError, TagId, WorkspaceService,
};

type Service = WorkspaceService<MemorySnapshotStore, NotificationOutbox, ManualClock>;

// 2023-11-14 22:13:20 UTC
const START: i64 = 1_700_000_000_000;

fn open_service() -> Service {
    WorkspaceService::open(
        MemorySnapshotStore::new(),
        NotificationOutbox::new(),
        ManualClock::new(START),
        &CoreConfig::default(),
    )
    .unwrap()
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

fn titles(service: &Service) -> Vec<String> {
    service
        .filtered_tasks()
        .into_iter()
        .map(|task| task.title.clone())
        .collect()
}

fn seed(service: &mut Service) {
    let work = tag_named(service, "Work");
    let home = tag_named(service, "Home");
    let specs = [
        ("Write report", Status::InProgress, Priority::High, vec![work]),
        ("Buy groceries", Status::Todo, Priority::Low, vec![home]),
        ("Fix sink", Status::Completed, Priority::Urgent, vec![home]),
        ("Plan offsite", Status::Todo, Priority::Medium, vec![work, home]),
    ];
    for (title, status, priority, tags) in specs {
        service
            .create_task(NewTask {
                status,
                priority,
                tags,
                ..NewTask::titled(title)
            })
            .unwrap();
    }
}

#[test]
fn default_filter_admits_everything_in_order() {
    let mut service = open_service();
    seed(&mut service);

    assert_eq!(
        titles(&service),
        vec!["Write report", "Buy groceries", "Fix sink", "Plan offsite"]
    );
}

#[test]
fn filters_combine_with_and_semantics() {
    let mut service = open_service();
    seed(&mut service);
    let home = tag_named(&service, "Home");

    service.set_status_filter(Selection::Only(Status::Todo)).unwrap();
    assert_eq!(titles(&service), vec!["Buy groceries", "Plan offsite"]);

    service.toggle_tag_filter(home).unwrap();
    service
        .set_priority_filter(Selection::Only(Priority::Medium))
        .unwrap();
    assert_eq!(titles(&service), vec!["Plan offsite"]);

    service.set_search_query("GROCER").unwrap();
    assert!(titles(&service).is_empty());

    service.reset_filters().unwrap();
    assert_eq!(titles(&service).len(), 4);
}

#[test]
fn tag_filter_matches_any_selected_tag_and_toggles_off() {
    let mut service = open_service();
    seed(&mut service);
    let work = tag_named(&service, "Work");
    let home = tag_named(&service, "Home");

    service.toggle_tag_filter(work).unwrap();
    assert_eq!(titles(&service), vec!["Write report", "Plan offsite"]);

    service.toggle_tag_filter(home).unwrap();
    assert_eq!(titles(&service).len(), 4);

    service.toggle_tag_filter(work).unwrap();
    service.toggle_tag_filter(home).unwrap();
    assert!(service.state().filter().tags.is_empty());
}

#[test]
fn search_is_case_insensitive_substring() {
    let mut service = open_service();
    seed(&mut service);

    service.set_search_query("rEpOrT").unwrap();
    assert_eq!(titles(&service), vec!["Write report"]);
}

#[test]
fn toggling_unknown_tag_filter_is_rejected() {
    let mut service = open_service();
    let missing = uuid::Uuid::new_v4();

    let err = service.toggle_tag_filter(missing).unwrap_err();

    assert!(matches!(
        err,
        ServiceError::Store(StoreError::NotFound { kind: EntityKind::Tag, id }) if id == missing
    ));
    assert!(service.state().filter().tags.is_empty());
}

#[test]
fn overview_counts_by_status_priority_and_tag() {
    let mut service = open_service();
    seed(&mut service);
    service
        .create_task(NewTask {
            due_date: Some(START - DAY_MS),
            ..NewTask::titled("overdue bill")
        })
        .unwrap();
    service
        .create_task(NewTask {
            due_date: Some(START + 3 * DAY_MS),
            ..NewTask::titled("dentist")
        })
        .unwrap();

    let overview = service.overview();

    assert_eq!(overview.total, 6);
    assert_eq!(overview.completed, 1);
    assert_eq!(overview.overdue, 1);
    assert_eq!(overview.due_this_week, 1);
    assert_eq!(
        overview.by_priority,
        vec![
            (Priority::Low, 1),
            (Priority::Medium, 3),
            (Priority::High, 1),
            (Priority::Urgent, 1),
        ]
    );
    let by_tag: Vec<(&str, usize)> = overview
        .by_tag
        .iter()
        .map(|(tag, count)| (tag.name.as_str(), *count))
        .collect();
    assert_eq!(by_tag, vec![("Personal", 0), ("Work", 2), ("Home", 3)]);
}

#[test]
fn upcoming_groups_open_tasks_by_calendar_day() {
    let mut service = open_service();
    let day_start = START - START.rem_euclid(DAY_MS);
    let dated = [
        ("yesterday", day_start - 1),
        ("today", day_start + DAY_MS - 1),
        ("tomorrow", day_start + DAY_MS + 10),
        ("in five days", day_start + 5 * DAY_MS),
        ("next month", day_start + 30 * DAY_MS),
    ];
    for (title, due) in dated {
        service
            .create_task(NewTask {
                due_date: Some(due),
                ..NewTask::titled(title)
            })
            .unwrap();
    }
    service
        .create_task(NewTask {
            due_date: Some(day_start + 10),
            status: Status::Completed,
            ..NewTask::titled("already done")
        })
        .unwrap();

    let upcoming = service.upcoming();
    let names = |tasks: &[taskflow_core::Task]| -> Vec<String> {
        tasks.iter().map(|task| task.title.clone()).collect()
    };

    assert_eq!(names(&upcoming.overdue), vec!["yesterday"]);
    assert_eq!(names(&upcoming.today), vec!["today"]);
    assert_eq!(names(&upcoming.tomorrow), vec!["tomorrow"]);
    assert_eq!(names(&upcoming.this_week), vec!["in five days"]);
    assert_eq!(names(&upcoming.later), vec!["next month"]);
}
