//! Goal and milestone mutations.

use super::{EntityKind, StoreError, StoreResult, StoreState};
use crate::model::dedupe_ids;
use crate::model::goal::{Goal, GoalId, GoalPatch, Milestone, MilestoneId, NewGoal};
use crate::model::validation::{require_title, ValidationError};
use crate::model::{EpochMs, Status};
use uuid::Uuid;

fn check_target(target: f64) -> Result<(), ValidationError> {
    if !target.is_finite() || target <= 0.0 {
        return Err(ValidationError::InvalidGoalTarget);
    }
    Ok(())
}

impl StoreState {
    pub fn insert_goal(&mut self, input: NewGoal, now: EpochMs) -> StoreResult<Goal> {
        require_title(&input.title)?;
        check_target(input.target)?;
        for milestone in &input.milestones {
            require_title(&milestone.title)?;
        }
        let mut tags = input.tags;
        dedupe_ids(&mut tags);
        self.check_tags(&tags)?;

        let mut goal = Goal {
            id: Uuid::new_v4(),
            title: input.title.trim().to_string(),
            description: input.description,
            target: input.target,
            current: input.current.max(0.0),
            unit: input.unit,
            status: input.status,
            priority: input.priority,
            tags,
            milestones: input
                .milestones
                .into_iter()
                .map(|milestone| Milestone {
                    id: Uuid::new_v4(),
                    title: milestone.title.trim().to_string(),
                    target: milestone.target,
                    is_completed: false,
                })
                .collect(),
            start_date: input.start_date,
            due_date: input.due_date,
            created_at: now,
            updated_at: now,
            completed_at: None,
        };
        if goal.status == Status::Completed || goal.current >= goal.target {
            goal.mark_completed(now);
        }
        self.goals.push(goal.clone());
        Ok(goal)
    }

    pub fn update_goal(&mut self, id: GoalId, patch: GoalPatch, now: EpochMs) -> StoreResult<Goal> {
        let index = self.goal_index(id)?;
        let mut next = self.goals[index].clone();

        if let Some(title) = patch.title {
            require_title(&title)?;
            next.title = title.trim().to_string();
        }
        if let Some(target) = patch.target {
            check_target(target)?;
            next.target = target;
        }
        if let Some(mut tags) = patch.tags {
            dedupe_ids(&mut tags);
            self.check_tags(&tags)?;
            next.tags = tags;
        }
        if let Some(description) = patch.description {
            next.description = description;
        }
        if let Some(unit) = patch.unit {
            next.unit = unit;
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
        match patch.status {
            Some(Status::Completed) => next.mark_completed(now),
            Some(status) => {
                next.status = status;
                next.completed_at = None;
            }
            None => {}
        }
        next.updated_at = now;

        self.goals[index] = next.clone();
        Ok(next)
    }

    /// Sets the goal's current value; reaching the target completes it.
    pub fn set_goal_progress(&mut self, id: GoalId, current: f64, now: EpochMs) -> StoreResult<Goal> {
        let index = self.goal_index(id)?;
        let goal = &mut self.goals[index];
        goal.current = if current.is_finite() { current.max(0.0) } else { goal.current };
        if goal.current >= goal.target {
            goal.mark_completed(now);
        } else if goal.status == Status::Todo && goal.current > 0.0 {
            goal.status = Status::InProgress;
        }
        goal.updated_at = now;
        Ok(goal.clone())
    }

    /// Completes a goal: `current = target`, `status = Completed`.
    pub fn complete_goal(&mut self, id: GoalId, now: EpochMs) -> StoreResult<Goal> {
        let index = self.goal_index(id)?;
        let goal = &mut self.goals[index];
        goal.mark_completed(now);
        goal.updated_at = now;
        Ok(goal.clone())
    }

    /// Flips one milestone's completion flag.
    pub fn toggle_milestone(
        &mut self,
        goal_id: GoalId,
        milestone_id: MilestoneId,
        now: EpochMs,
    ) -> StoreResult<Goal> {
        let index = self.goal_index(goal_id)?;
        let goal = &mut self.goals[index];
        let milestone = goal
            .milestones
            .iter_mut()
            .find(|milestone| milestone.id == milestone_id)
            .ok_or(StoreError::NotFound {
                kind: EntityKind::Milestone,
                id: milestone_id,
            })?;
        milestone.is_completed = !milestone.is_completed;
        goal.updated_at = now;
        Ok(goal.clone())
    }

    /// Removes a goal and clears `goal_id` on its tasks.
    pub fn remove_goal(&mut self, id: GoalId, now: EpochMs) -> StoreResult<Goal> {
        let index = self.goal_index(id)?;
        let removed = self.goals.remove(index);
        for task in self.tasks.iter_mut().filter(|task| task.goal_id == Some(id)) {
            task.goal_id = None;
            task.updated_at = now;
        }
        Ok(removed)
    }

    fn goal_index(&self, id: GoalId) -> StoreResult<usize> {
        self.goals
            .iter()
            .position(|goal| goal.id == id)
            .ok_or(StoreError::NotFound {
                kind: EntityKind::Goal,
                id,
            })
    }
}

#[cfg(test)]
mod tests {
    use crate::model::goal::{NewGoal, NewMilestone};
    use crate::model::validation::ValidationError;
    use crate::model::Status;
    use crate::store::{StoreError, StoreState};

    #[test]
    fn progress_reaching_target_completes_goal() {
        let mut state = StoreState::new();
        let goal = state.insert_goal(NewGoal::new("run", 100.0, "km"), 1).unwrap();
        let partial = state.set_goal_progress(goal.id, 40.0, 2).unwrap();
        assert_eq!(partial.status, Status::InProgress);

        let done = state.set_goal_progress(goal.id, 120.0, 3).unwrap();
        assert_eq!(done.status, Status::Completed);
        assert_eq!(done.current, 100.0);
        assert_eq!(done.completed_at, Some(3));
    }

    #[test]
    fn rejects_non_positive_target() {
        let mut state = StoreState::new();
        let err = state.insert_goal(NewGoal::new("nothing", 0.0, "x"), 1).unwrap_err();
        assert_eq!(err, StoreError::Validation(ValidationError::InvalidGoalTarget));
    }

    #[test]
    fn toggle_milestone_flips_flag() {
        let mut state = StoreState::new();
        let mut input = NewGoal::new("save", 1000.0, "usd");
        input.milestones.push(NewMilestone {
            title: "first 100".to_string(),
            target: 100.0,
        });
        let goal = state.insert_goal(input, 1).unwrap();
        let milestone = goal.milestones[0].id;

        let toggled = state.toggle_milestone(goal.id, milestone, 2).unwrap();
        assert!(toggled.milestones[0].is_completed);
        let toggled = state.toggle_milestone(goal.id, milestone, 3).unwrap();
        assert!(!toggled.milestones[0].is_completed);
    }
}
