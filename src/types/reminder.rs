use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::types::event::{Event, EventId, event_date};
use crate::types::notification::{Notification, NotificationAction, NotificationData};

/// How long before the event start a reminder fires.
pub const REMINDER_LEAD: time::Duration = time::Duration::HOUR;

pub const REMINDER_TITLE: &str = "Event Starting Soon!";
pub const REMINDER_KIND: &str = "event_reminder";
pub const VIBRATE_PATTERN: [u32; 3] = [100, 50, 100];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub event_id: EventId,
    pub event_title: String,
    #[serde(with = "event_date")]
    pub event_date: OffsetDateTime,
    #[serde(default)]
    pub location: Option<String>,
}

impl Reminder {
    pub fn from_event(event: &Event) -> Result<Self, time::error::Parse> {
        Ok(Self {
            event_id: event.id,
            event_title: event.title.clone(),
            event_date: event.starts_at()?,
            location: event.location.clone(),
        })
    }

    pub fn fire_at(&self) -> OffsetDateTime {
        self.event_date - REMINDER_LEAD
    }

    pub fn tag(&self) -> String {
        format!("event-reminder-{}", self.event_id)
    }

    pub fn url(&self) -> String {
        format!("/events/{}", self.event_id)
    }

    pub fn notification(&self) -> Notification {
        let body = match self.location.as_deref().map(str::trim) {
            Some(location) if !location.is_empty() => {
                format!("{} starts in 1 hour at {location}", self.event_title)
            }
            _ => format!("{} starts in 1 hour", self.event_title),
        };
        Notification::new(REMINDER_TITLE)
            .body(body)
            .tag(self.tag())
            .vibrate(&VIBRATE_PATTERN)
            .require_interaction()
            .action(NotificationAction::new("view", "View Event"))
            .data(NotificationData {
                url: Some(self.url()),
                event_id: Some(self.event_id),
                kind: Some(REMINDER_KIND.to_string()),
            })
    }
}

/// A reminder record held by a durable store, keyed by `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingReminder {
    pub id: String,
    #[serde(flatten)]
    pub reminder: Reminder,
}

impl PendingReminder {
    /// Due once the lead time has started and the event has not.
    pub fn is_due(&self, now: OffsetDateTime) -> bool {
        now >= self.reminder.fire_at() && now < self.reminder.event_date
    }
}
