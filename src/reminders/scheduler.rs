use crate::notifications::NotificationCenter;
use crate::ports;
use crate::types::reminder::Reminder;

use std::time::Duration;
use time::OffsetDateTime;
use tokio::task::JoinHandle;
use tracing::{debug, info};

pub struct ScheduledReminderHandle {
    pub reminder: Reminder,
    pub fire_at: OffsetDateTime,
    pub scheduled_at: OffsetDateTime,
    handle: JoinHandle<()>,
}

impl ScheduledReminderHandle {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub async fn join(self) -> Result<(), tokio::task::JoinError> {
        self.handle.await
    }
}

#[derive(Debug, Clone)]
pub struct ReminderScheduler<T, N, P> {
    time: T,
    center: NotificationCenter<N, P>,
}

impl<T, N, P> ReminderScheduler<T, N, P>
where
    T: ports::TimeProvider,
    N: ports::Notifier,
    P: ports::PermissionPrompt,
{
    pub fn new(time: T, center: NotificationCenter<N, P>) -> Self {
        Self { time, center }
    }

    pub fn now(&self) -> OffsetDateTime {
        self.time.now()
    }

    /// Arms a timer for `fire_at`. A reminder whose fire time has already
    /// passed is dropped, never fired late.
    pub fn schedule(&self, reminder: Reminder) -> Option<ScheduledReminderHandle> {
        let fire_at = reminder.fire_at();
        let Some(delay) = compute_delay(&self.time, fire_at) else {
            debug!(
                event_id = reminder.event_id,
                "reminder time already passed, not scheduling"
            );
            return None;
        };

        let scheduled_at = self.time.now();
        let time = self.time.clone();
        let center = self.center.clone();
        let reminder_for_task = reminder.clone();
        let handle = tokio::spawn(async move {
            time.sleep(delay).await;
            fire_reminder(&center, &reminder_for_task);
        });
        debug!(event_id = reminder.event_id, ?delay, "reminder scheduled");

        Some(ScheduledReminderHandle {
            reminder,
            fire_at,
            scheduled_at,
            handle,
        })
    }
}

fn fire_reminder<N, P>(center: &NotificationCenter<N, P>, reminder: &Reminder)
where
    N: ports::Notifier,
    P: ports::PermissionPrompt,
{
    if center.show(reminder.notification()) {
        info!(event_id = reminder.event_id, "reminder delivered");
    }
}

fn compute_delay<T: ports::TimeProvider>(time: &T, at: OffsetDateTime) -> Option<Duration> {
    let now = time.now();
    let delay = at - now;
    if delay.is_positive() {
        match delay.try_into() {
            Ok(std_delay) => Some(std_delay),
            Err(_) => Some(Duration::MAX),
        }
    } else {
        None
    }
}
