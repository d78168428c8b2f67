//! Page-side notification helper: permission prompt, local notifications,
//! event reminders and the push preference endpoints.

mod center;

pub use center::{ActiveNotifications, NotificationCenter};

use serde_json::Value;
use tracing::{info, warn};

use crate::api::{ApiClient, push_toggle_body};
use crate::error::NotificationError;
use crate::ports;
use crate::reminders::{ReminderScheduler, ScheduledReminderHandle};
use crate::session::HeaderSource;
use crate::types::event::Event;
use crate::types::notification::{Notification, Permission};
use crate::types::preferences::NotificationPreferences;
use crate::types::reminder::Reminder;

pub const LOCAL_TEST_MESSAGE: &str = "Local test notification sent";

#[derive(Debug, Clone, PartialEq)]
pub enum TestNotificationOutcome {
    /// The server accepted the request; carries its JSON reply.
    Server(Value),
    /// The server could not be used and a local notification was shown instead.
    LocalFallback,
}

impl TestNotificationOutcome {
    pub fn message(&self) -> String {
        match self {
            TestNotificationOutcome::Server(reply) => reply
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Test notification sent")
                .to_string(),
            TestNotificationOutcome::LocalFallback => LOCAL_TEST_MESSAGE.to_string(),
        }
    }
}

pub struct NotificationService<T, N, P> {
    api: ApiClient,
    center: NotificationCenter<N, P>,
    scheduler: ReminderScheduler<T, N, P>,
}

impl<T, N, P> NotificationService<T, N, P>
where
    T: ports::TimeProvider,
    N: ports::Notifier,
    P: ports::PermissionPrompt,
{
    pub fn new(api: ApiClient, time: T, center: NotificationCenter<N, P>) -> Self {
        let scheduler = ReminderScheduler::new(time, center.clone());
        Self {
            api,
            center,
            scheduler,
        }
    }

    pub fn center(&self) -> &NotificationCenter<N, P> {
        &self.center
    }

    pub fn is_supported(&self) -> bool {
        self.center.permission().is_supported()
    }

    pub fn permission(&self) -> Permission {
        self.center.permission()
    }

    /// Runs the consent prompt and reports whether permission was granted.
    pub async fn request_permission(&self) -> Result<bool, NotificationError> {
        if !self.is_supported() {
            return Err(NotificationError::Unsupported);
        }
        let permission = self.center.request_permission().await;
        info!(%permission, "notification permission");
        Ok(permission.is_granted())
    }

    pub fn show_local_notification(&self, notification: Notification) -> bool {
        self.center.show(notification)
    }

    /// Arms a reminder one hour before the event. Returns `None` when
    /// notifications are not permitted, the date cannot be read, or the
    /// reminder time has already passed.
    pub fn schedule_event_reminder(&self, event: &Event) -> Option<ScheduledReminderHandle> {
        if !self.permission().is_granted() {
            return None;
        }
        let reminder = match Reminder::from_event(event) {
            Ok(reminder) => reminder,
            Err(err) => {
                warn!(
                    event_id = event.id,
                    "error scheduling event reminder: invalid date '{}' ({err})", event.date
                );
                return None;
            }
        };
        self.scheduler.schedule(reminder)
    }

    pub fn schedule_user_event_reminders(&self, events: &[Event]) -> Vec<ScheduledReminderHandle> {
        events
            .iter()
            .filter_map(|event| self.schedule_event_reminder(event))
            .collect()
    }

    pub async fn enable_push_notifications(
        &self,
        auth: &impl HeaderSource,
    ) -> Result<(), NotificationError> {
        if !self.permission().is_granted() {
            return Err(NotificationError::NotPermitted);
        }
        self.api
            .update_notification_preferences(auth.auth_headers(), &push_toggle_body(true))
            .await
            .map_err(|err| {
                warn!("error enabling push notifications: {err}");
                NotificationError::Preferences(err)
            })
    }

    pub async fn disable_push_notifications(
        &self,
        auth: &impl HeaderSource,
    ) -> Result<(), NotificationError> {
        self.api
            .update_notification_preferences(auth.auth_headers(), &push_toggle_body(false))
            .await
            .map_err(|err| {
                warn!("error disabling push notifications: {err}");
                NotificationError::Preferences(err)
            })
    }

    /// Asks the server for a test push. Any failure is covered by showing a
    /// local notification instead.
    pub async fn send_test_notification(&self, auth: &impl HeaderSource) -> TestNotificationOutcome {
        match self.api.test_notification(auth.auth_headers()).await {
            Ok(reply) => TestNotificationOutcome::Server(reply),
            Err(err) => {
                warn!("test notification via server failed, showing locally: {err}");
                self.show_local_notification(
                    Notification::new("Test Notification")
                        .body("This is a test notification from Eventify!"),
                );
                TestNotificationOutcome::LocalFallback
            }
        }
    }

    /// Falls back to the defaults when the server cannot be reached.
    pub async fn notification_preferences(&self, auth: &impl HeaderSource) -> NotificationPreferences {
        match self.api.notification_preferences(auth.auth_headers()).await {
            Ok(preferences) => preferences,
            Err(err) => {
                warn!("error fetching preferences: {err}");
                NotificationPreferences::default()
            }
        }
    }

    pub async fn save_notification_preferences(
        &self,
        auth: &impl HeaderSource,
        preferences: &NotificationPreferences,
    ) -> Result<(), NotificationError> {
        self.api
            .update_notification_preferences(auth.auth_headers(), preferences)
            .await
            .map_err(NotificationError::Preferences)
    }
}
