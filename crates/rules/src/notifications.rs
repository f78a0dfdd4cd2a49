//! Notification hand-off.
//!
//! The engine never sends anything. `send_notification` actions become
//! [`PendingNotification`]s on the evaluation outcome, and callers drain
//! them into a [`NotificationSink`] once evaluation has finished.

use serde::{Deserialize, Serialize};
use tracing::info;

/// A notification a matched rule would fire for one employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingNotification {
    pub rule_id: String,
    pub employee_id: String,
    pub template: String,
}

/// Receiver for queued notifications.
pub trait NotificationSink {
    fn deliver(&self, notification: &PendingNotification);

    fn deliver_all<'a, I>(&self, notifications: I) -> usize
    where
        I: IntoIterator<Item = &'a PendingNotification>,
        Self: Sized,
    {
        let mut count = 0;
        for n in notifications {
            self.deliver(n);
            count += 1;
        }
        count
    }
}

/// Sink that only logs each notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn deliver(&self, notification: &PendingNotification) {
        info!(
            rule_id = %notification.rule_id,
            employee_id = %notification.employee_id,
            template = %notification.template,
            "notification queued"
        );
    }
}
