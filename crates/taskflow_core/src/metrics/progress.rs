//! Project completion percentage.

use crate::model::project::ProjectId;
use crate::model::task::Task;

/// Returns `100 * completed / total` over tasks referencing `project_id`.
///
/// A project without tasks reports `0.0`, never `NaN`.
pub fn project_progress(project_id: ProjectId, tasks: &[Task]) -> f64 {
    let (total, completed) = tasks
        .iter()
        .filter(|task| task.project_id == Some(project_id))
        .fold((0_u32, 0_u32), |(total, completed), task| {
            (total + 1, completed + u32::from(task.is_completed()))
        });

    if total == 0 {
        return 0.0;
    }
    100.0 * f64::from(completed) / f64::from(total)
}
