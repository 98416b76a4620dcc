use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::utils::error::EventError;

/// Store-assigned event identifier. Never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub i64);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub description: String,
    pub location: String,
    #[serde(with = "iso8601")]
    pub date: DateTime<Utc>,
    pub max_participants: u32,
    /// Advisory only, nothing bounds it against `max_participants`.
    pub current_participants: u32,
    pub category: String,
    pub organizer: String,
    #[serde(with = "iso8601")]
    pub created_at: DateTime<Utc>,
}

/// Values filled in when a creation request omits the optional fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDefaults {
    /// Category used when none is supplied. `"General"`.
    pub category: String,
    /// Organizer used when none is supplied. `"Anonymous"`.
    pub organizer: String,
}

impl Default for EventDefaults {
    fn default() -> Self {
        Self {
            category: "General".to_string(),
            organizer: "Anonymous".to_string(),
        }
    }
}

/// Raw creation request as received from a client.
///
/// Everything is optional so that validation can report every missing field
/// at once instead of failing on the first one during deserialization.
/// `maxParticipants` is kept as a raw JSON value because form clients send it
/// as a string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub date: Option<String>,
    pub max_participants: Option<Value>,
    pub category: Option<String>,
    pub organizer: Option<String>,
}

/// A creation request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedEvent {
    pub title: String,
    pub description: String,
    pub location: String,
    pub date: DateTime<Utc>,
    pub max_participants: u32,
    pub category: String,
    pub organizer: String,
}

impl NewEvent {
    /// Checks required fields, coerces `maxParticipants`, normalizes `date`
    /// and applies `defaults` to the optional fields.
    pub fn validate(self, defaults: &EventDefaults) -> Result<ValidatedEvent, EventError> {
        let mut missing = Vec::new();

        let title = required(self.title, "title", &mut missing);
        let description = required(self.description, "description", &mut missing);
        let location = required(self.location, "location", &mut missing);
        let date = required(self.date, "date", &mut missing);
        let max_participants = match self.max_participants {
            Some(value) if !is_blank_value(&value) => Some(value),
            _ => {
                missing.push("maxParticipants");
                None
            }
        };

        let (Some(title), Some(description), Some(location), Some(date), Some(max)) =
            (title, description, location, date, max_participants)
        else {
            return Err(EventError::MissingFields(missing));
        };

        Ok(ValidatedEvent {
            title,
            description,
            location,
            date: parse_event_date(&date)?,
            max_participants: coerce_participants(&max)?,
            category: or_default(self.category, &defaults.category),
            organizer: or_default(self.organizer, &defaults.organizer),
        })
    }
}

fn required(
    value: Option<String>,
    name: &'static str,
    missing: &mut Vec<&'static str>,
) -> Option<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Some(v),
        _ => {
            missing.push(name);
            None
        }
    }
}

fn or_default(value: Option<String>, default: &str) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn is_blank_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn coerce_participants(value: &Value) -> Result<u32, EventError> {
    let parsed = match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };

    parsed
        .filter(|n| *n > 0)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| EventError::InvalidMaxParticipants(value_text(value)))
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parses the date formats clients send and normalizes them to UTC.
///
/// Offsets are honoured; naive date-times (as produced by `datetime-local`
/// inputs) and bare dates are taken as UTC.
pub fn parse_event_date(input: &str) -> Result<DateTime<Utc>, EventError> {
    let s = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| EventError::InvalidDate(input.to_string()))
}

/// Canonical ISO-8601 UTC rendering, e.g. `2024-11-15T18:00:00.000Z`.
pub fn to_iso8601(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

mod iso8601 {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::to_iso8601(dt))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(de::Error::custom)
    }
}
