//! Automation rule mutations.
//!
//! Rules are evaluated in collection order, so inserts always append.

use super::{EntityKind, StoreError, StoreResult, StoreState};
use crate::model::automation::{
    validate_rule, Action, Automation, AutomationId, AutomationPatch, NewAutomation, Trigger,
};
use crate::model::EpochMs;
use uuid::Uuid;

impl StoreState {
    pub fn insert_automation(
        &mut self,
        input: NewAutomation,
        now: EpochMs,
    ) -> StoreResult<Automation> {
        self.check_rule(&input.name, &input.trigger, &input.action)?;
        let automation = Automation {
            id: Uuid::new_v4(),
            name: input.name.trim().to_string(),
            active: input.active,
            trigger: input.trigger,
            action: input.action,
            created_at: now,
        };
        self.automations.push(automation.clone());
        Ok(automation)
    }

    pub fn update_automation(
        &mut self,
        id: AutomationId,
        patch: AutomationPatch,
    ) -> StoreResult<Automation> {
        let index = self.automation_index(id)?;
        let mut next = self.automations[index].clone();
        if let Some(name) = patch.name {
            next.name = name.trim().to_string();
        }
        if let Some(active) = patch.active {
            next.active = active;
        }
        if let Some(trigger) = patch.trigger {
            next.trigger = trigger;
        }
        if let Some(action) = patch.action {
            next.action = action;
        }
        self.check_rule(&next.name, &next.trigger, &next.action)?;

        self.automations[index] = next.clone();
        Ok(next)
    }

    /// Flips `active`. No other state changes.
    pub fn toggle_automation(&mut self, id: AutomationId) -> StoreResult<Automation> {
        let index = self.automation_index(id)?;
        let automation = &mut self.automations[index];
        automation.active = !automation.active;
        Ok(automation.clone())
    }

    pub fn remove_automation(&mut self, id: AutomationId) -> StoreResult<Automation> {
        let index = self.automation_index(id)?;
        Ok(self.automations.remove(index))
    }

    fn check_rule(&self, name: &str, trigger: &Trigger, action: &Action) -> StoreResult<()> {
        validate_rule(name, action)?;
        if let Some(tag) = trigger.tag_ref() {
            self.check_tags(&[tag])?;
        }
        self.check_tags(&action.tag_refs())?;
        Ok(())
    }

    fn automation_index(&self, id: AutomationId) -> StoreResult<usize> {
        self.automations
            .iter()
            .position(|automation| automation.id == id)
            .ok_or(StoreError::NotFound {
                kind: EntityKind::Automation,
                id,
            })
    }
}
