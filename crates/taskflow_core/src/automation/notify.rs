//! Notification delivery boundary for `send-notification` actions.
//!
//! The engine hands messages to a sink and never observes delivery outcome.

use crate::model::automation::AutomationId;
use crate::model::task::TaskId;
use crate::model::EpochMs;
use log::info;
use std::cell::RefCell;
use std::rc::Rc;

/// One message produced by an automation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub automation_id: AutomationId,
    pub task_id: TaskId,
    pub message: String,
    pub sent_at: EpochMs,
}

/// External notification collaborator.
pub trait NotificationSink {
    fn deliver(&mut self, notification: Notification);
}

/// Sink that writes notifications to the core log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotificationSink;

impl NotificationSink for LogNotificationSink {
    fn deliver(&mut self, notification: Notification) {
        info!(
            "event=notification module=automation status=ok automation_id={} task_id={} message={}",
            notification.automation_id, notification.task_id, notification.message
        );
    }
}

/// Shared in-process queue a UI layer can drain.
///
/// Clones share one buffer, so a caller can keep a handle while the
/// service owns another.
#[derive(Debug, Clone, Default)]
pub struct NotificationOutbox {
    queue: Rc<RefCell<Vec<Notification>>>,
}

impl NotificationOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    /// Takes every pending notification, oldest first.
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.queue.borrow_mut())
    }
}

impl NotificationSink for NotificationOutbox {
    fn deliver(&mut self, notification: Notification) {
        self.queue.borrow_mut().push(notification);
    }
}
