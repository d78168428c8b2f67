use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Server-owned notification preferences. Fields the server omits fall back to
/// the same defaults used when the preferences cannot be fetched at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationPreferences {
    pub event_reminders: bool,
    pub one_hour_before: bool,
    pub one_day_before: bool,
    pub new_events: bool,
    pub registration_updates: bool,
    pub admin_notifications: bool,
    pub push_enabled: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            event_reminders: true,
            one_hour_before: true,
            one_day_before: false,
            new_events: false,
            registration_updates: false,
            admin_notifications: false,
            push_enabled: false,
        }
    }
}

impl NotificationPreferences {
    pub fn get(&self, flag: PreferenceFlag) -> bool {
        match flag {
            PreferenceFlag::EventReminders => self.event_reminders,
            PreferenceFlag::OneHourBefore => self.one_hour_before,
            PreferenceFlag::OneDayBefore => self.one_day_before,
            PreferenceFlag::NewEvents => self.new_events,
            PreferenceFlag::RegistrationUpdates => self.registration_updates,
            PreferenceFlag::AdminNotifications => self.admin_notifications,
            PreferenceFlag::PushEnabled => self.push_enabled,
        }
    }

    pub fn set(&mut self, flag: PreferenceFlag, value: bool) {
        let slot = match flag {
            PreferenceFlag::EventReminders => &mut self.event_reminders,
            PreferenceFlag::OneHourBefore => &mut self.one_hour_before,
            PreferenceFlag::OneDayBefore => &mut self.one_day_before,
            PreferenceFlag::NewEvents => &mut self.new_events,
            PreferenceFlag::RegistrationUpdates => &mut self.registration_updates,
            PreferenceFlag::AdminNotifications => &mut self.admin_notifications,
            PreferenceFlag::PushEnabled => &mut self.push_enabled,
        };
        *slot = value;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceFlag {
    EventReminders,
    OneHourBefore,
    OneDayBefore,
    NewEvents,
    RegistrationUpdates,
    AdminNotifications,
    PushEnabled,
}

impl PreferenceFlag {
    pub const ALL: [PreferenceFlag; 7] = [
        PreferenceFlag::EventReminders,
        PreferenceFlag::OneHourBefore,
        PreferenceFlag::OneDayBefore,
        PreferenceFlag::NewEvents,
        PreferenceFlag::RegistrationUpdates,
        PreferenceFlag::AdminNotifications,
        PreferenceFlag::PushEnabled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PreferenceFlag::EventReminders => "event_reminders",
            PreferenceFlag::OneHourBefore => "one_hour_before",
            PreferenceFlag::OneDayBefore => "one_day_before",
            PreferenceFlag::NewEvents => "new_events",
            PreferenceFlag::RegistrationUpdates => "registration_updates",
            PreferenceFlag::AdminNotifications => "admin_notifications",
            PreferenceFlag::PushEnabled => "push_enabled",
        }
    }
}

impl FromStr for PreferenceFlag {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().replace('-', "_");
        PreferenceFlag::ALL
            .into_iter()
            .find(|flag| flag.as_str() == normalized)
            .ok_or_else(|| format!("unknown preference '{raw}'"))
    }
}
