use serde::{Deserialize, Deserializer, Serialize};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

pub type EventId = i64;

/// An event as served by the backend. Every field falls back to a default
/// when the server omits it or sends `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Event {
    #[serde(deserialize_with = "null_as_default")]
    pub id: EventId,
    #[serde(alias = "eventId", skip_serializing_if = "Option::is_none")]
    pub event_id: Option<EventId>,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    pub description: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub date: String,
    pub location: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub capacity: i64,
    pub registrations: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registered_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Event {
    /// Seats taken, read from whichever count field the backend filled in.
    /// Zero counts fall through to the next field.
    pub fn registered(&self) -> i64 {
        [self.registrations, self.registered_count, self.registration_count]
            .into_iter()
            .flatten()
            .find(|count| *count != 0)
            .unwrap_or(0)
    }

    pub fn available_spots(&self) -> i64 {
        (self.capacity - self.registered()).max(0)
    }

    pub fn is_full(&self) -> bool {
        self.available_spots() == 0
    }

    pub fn starts_at(&self) -> Result<OffsetDateTime, time::error::Parse> {
        parse_event_date(&self.date)
    }

    /// Registration listings name the event under `event_id`, `eventId` or
    /// plain `id` depending on the backend version.
    pub fn registration_event_id(&self) -> EventId {
        self.event_id.unwrap_or(self.id)
    }
}

pub fn is_registered_for(registrations: &[Event], event_id: EventId) -> bool {
    registrations
        .iter()
        .any(|registration| registration.registration_event_id() == event_id)
}

/// Payload for creating or updating an event from the admin surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDraft {
    pub title: String,
    pub description: String,
    pub date: String,
    pub location: String,
    pub capacity: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl EventDraft {
    /// Joins a `YYYY-MM-DD` date and an `HH:MM` time the way the admin forms do.
    pub fn combine_date_time(date: &str, time: &str) -> String {
        format!("{}T{}:00", date.trim(), time.trim())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdminStats {
    #[serde(deserialize_with = "null_as_default")]
    pub total_events: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub total_registrations: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub total_users: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub upcoming_events: i64,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parses the date formats the backend is known to emit. Timestamps without
/// an offset are taken as UTC; a bare date means midnight UTC.
pub fn parse_event_date(raw: &str) -> Result<OffsetDateTime, time::error::Parse> {
    let raw = raw.trim();
    let rfc3339_err = match OffsetDateTime::parse(raw, &Rfc3339) {
        Ok(parsed) => return Ok(parsed),
        Err(err) => err,
    };

    let naive_formats = [
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
        format_description!("[year]-[month]-[day]T[hour]:[minute]"),
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    ];
    for format in naive_formats {
        if let Ok(parsed) = PrimitiveDateTime::parse(raw, format) {
            return Ok(parsed.assume_utc());
        }
    }

    if let Ok(date) = Date::parse(raw, format_description!("[year]-[month]-[day]")) {
        return Ok(date.midnight().assume_utc());
    }

    Err(rfc3339_err)
}

pub mod event_date {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::OffsetDateTime;
    use time::format_description::well_known::Rfc3339;

    pub fn serialize<S: Serializer>(value: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        let formatted = value.format(&Rfc3339).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<OffsetDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_event_date(&raw).map_err(serde::de::Error::custom)
    }
}
