use serde::Deserialize;
use serde_json::Value;

use crate::types::event::EventId;
use crate::types::notification::{
    DEFAULT_ICON, DEFAULT_TAG, Notification, NotificationAction, NotificationData,
};
use crate::types::reminder::VIBRATE_PATTERN;

pub const PUSH_TITLE: &str = "Eventify";
pub const TEXT_PUSH_TITLE: &str = "Eventify Notification";
pub const TEXT_PUSH_FALLBACK_BODY: &str = "You have a new notification";

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PushPayload {
    title: Option<String>,
    body: Option<String>,
    message: Option<String>,
    url: Option<String>,
    event_id: Option<Value>,
    #[serde(rename = "type")]
    kind: Option<String>,
    tag: Option<String>,
}

/// Turns a push payload into the notification to display. `None` for an
/// empty push.
pub fn push_notification(data: Option<&[u8]>) -> Option<Notification> {
    let data = data.filter(|data| !data.is_empty())?;
    let notification = match serde_json::from_slice::<Value>(data) {
        Ok(value @ Value::Object(_)) => match serde_json::from_value::<PushPayload>(value) {
            Ok(payload) => json_notification(payload),
            Err(_) => text_notification(data),
        },
        _ => text_notification(data),
    };
    Some(notification)
}

fn json_notification(payload: PushPayload) -> Notification {
    let title = present(payload.title).unwrap_or_else(|| PUSH_TITLE.to_string());
    let mut notification = Notification::new(title)
        .tag(present(payload.tag).unwrap_or_else(|| DEFAULT_TAG.to_string()))
        .vibrate(&VIBRATE_PATTERN)
        .require_interaction()
        .action(NotificationAction::new("view", "View Event").with_icon(DEFAULT_ICON))
        .action(NotificationAction::new("dismiss", "Dismiss").with_icon(DEFAULT_ICON))
        .data(NotificationData {
            url: Some(present(payload.url).unwrap_or_else(|| "/".to_string())),
            event_id: payload.event_id.as_ref().and_then(event_id),
            kind: payload.kind,
        });
    if let Some(body) = present(payload.body).or(present(payload.message)) {
        notification = notification.body(body);
    }
    notification
}

/// Empty strings count as missing.
fn present(field: Option<String>) -> Option<String> {
    field.filter(|value| !value.is_empty())
}

fn text_notification(data: &[u8]) -> Notification {
    let text = String::from_utf8_lossy(data);
    let body = match text.trim() {
        "" => TEXT_PUSH_FALLBACK_BODY.to_string(),
        text => text.to_string(),
    };
    Notification::new(TEXT_PUSH_TITLE).body(body)
}

fn event_id(value: &Value) -> Option<EventId> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(raw) => raw.trim().parse().ok(),
        _ => None,
    }
}
