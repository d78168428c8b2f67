use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::types::event::EventId;

pub const DEFAULT_ICON: &str = "/pwa-192x192.png";
pub const DEFAULT_TAG: &str = "eventify-notification";

/// Platform notification permission. Only the platform moves between states;
/// the client reads it or asks for a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Unsupported,
    Default,
    Granted,
    Denied,
}

impl Permission {
    pub fn is_supported(self) -> bool {
        self != Permission::Unsupported
    }

    pub fn is_granted(self) -> bool {
        self == Permission::Granted
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Permission::Unsupported => "unsupported",
            Permission::Default => "default",
            Permission::Granted => "granted",
            Permission::Denied => "denied",
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "unsupported" => Ok(Permission::Unsupported),
            "default" => Ok(Permission::Default),
            "granted" => Ok(Permission::Granted),
            "denied" => Ok(Permission::Denied),
            other => Err(format!(
                "invalid permission '{other}'; expected unsupported, default, granted or denied"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl NotificationAction {
    pub fn new(action: &str, title: &str) -> Self {
        Self {
            action: action.to_string(),
            title: title.to_string(),
            icon: None,
        }
    }

    pub fn with_icon(mut self, icon: &str) -> Self {
        self.icon = Some(icon.to_string());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "eventId", skip_serializing_if = "Option::is_none")]
    pub event_id: Option<EventId>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// A system notification as handed to the display layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub title: String,
    pub body: Option<String>,
    pub icon: Option<String>,
    pub badge: Option<String>,
    pub tag: String,
    pub require_interaction: bool,
    pub vibrate: Vec<u32>,
    pub actions: Vec<NotificationAction>,
    pub data: NotificationData,
}

impl Notification {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: None,
            icon: Some(DEFAULT_ICON.to_string()),
            badge: Some(DEFAULT_ICON.to_string()),
            tag: DEFAULT_TAG.to_string(),
            require_interaction: false,
            vibrate: Vec::new(),
            actions: Vec::new(),
            data: NotificationData::default(),
        }
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn require_interaction(mut self) -> Self {
        self.require_interaction = true;
        self
    }

    pub fn vibrate(mut self, pattern: &[u32]) -> Self {
        self.vibrate = pattern.to_vec();
        self
    }

    pub fn action(mut self, action: NotificationAction) -> Self {
        self.actions.push(action);
        self
    }

    pub fn data(mut self, data: NotificationData) -> Self {
        self.data = data;
        self
    }
}

/// An entry of the server-side notification history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationRecord {
    pub id: i64,
    pub title: Option<String>,
    pub message: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub created_at: Option<String>,
    pub read: bool,
}
