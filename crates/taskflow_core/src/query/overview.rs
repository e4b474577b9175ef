//! Dashboard counters and due-date buckets.

use crate::model::tag::Tag;
use crate::model::task::Task;
use crate::model::{EpochMs, Priority, DAY_MS};

const WEEK_DAYS: i64 = 7;

/// Aggregate counters over a task collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOverview {
    pub total: usize,
    pub completed: usize,
    /// Not completed and due before `now`.
    pub overdue: usize,
    /// Not completed and due within the next seven days.
    pub due_this_week: usize,
    /// Counts in `Priority::ALL` order.
    pub by_priority: Vec<(Priority, usize)>,
    /// Counts per tag in tag collection order.
    pub by_tag: Vec<(Tag, usize)>,
}

pub fn task_overview(tasks: &[Task], tags: &[Tag], now: EpochMs) -> TaskOverview {
    let week_end = now.saturating_add(WEEK_DAYS * DAY_MS);
    let pending_due = || {
        tasks
            .iter()
            .filter(|task| !task.is_completed())
            .filter_map(|task| task.due_date)
    };

    TaskOverview {
        total: tasks.len(),
        completed: tasks.iter().filter(|task| task.is_completed()).count(),
        overdue: pending_due().filter(|due| *due < now).count(),
        due_this_week: pending_due()
            .filter(|due| *due > now && *due < week_end)
            .count(),
        by_priority: Priority::ALL
            .iter()
            .map(|priority| {
                let count = tasks.iter().filter(|task| task.priority == *priority).count();
                (*priority, count)
            })
            .collect(),
        by_tag: tags
            .iter()
            .map(|tag| {
                let count = tasks.iter().filter(|task| task.has_tag(tag.id)).count();
                (tag.clone(), count)
            })
            .collect(),
    }
}

/// Open tasks with a due date, grouped by UTC calendar day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpcomingTasks {
    pub overdue: Vec<Task>,
    pub today: Vec<Task>,
    pub tomorrow: Vec<Task>,
    /// Due two to seven days from today.
    pub this_week: Vec<Task>,
    pub later: Vec<Task>,
}

pub fn upcoming_tasks(tasks: &[Task], now: EpochMs) -> UpcomingTasks {
    let today = now.div_euclid(DAY_MS);
    let mut open: Vec<&Task> = tasks
        .iter()
        .filter(|task| task.status.is_open())
        .filter(|task| task.due_date.is_some())
        .collect();
    open.sort_by_key(|task| task.due_date);

    let mut buckets = UpcomingTasks::default();
    for task in open {
        let Some(due) = task.due_date else {
            continue;
        };
        let day = due.div_euclid(DAY_MS);
        let bucket = if day < today {
            &mut buckets.overdue
        } else if day == today {
            &mut buckets.today
        } else if day == today.saturating_add(1) {
            &mut buckets.tomorrow
        } else if day <= today.saturating_add(WEEK_DAYS) {
            &mut buckets.this_week
        } else {
            &mut buckets.later
        };
        bucket.push(task.clone());
    }
    buckets
}
