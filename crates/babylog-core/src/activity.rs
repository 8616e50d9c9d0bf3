// Activity record types
//
// ActivityRecord is the canonical, validated form of one logged event.
// ActivityCandidate is the raw three-string shape the interpreter is asked to
// produce; it only becomes a record after validation.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use uuid::Uuid;

/// Event type used when raw text is stored without interpretation
pub const NOTE_EVENT_TYPE: &str = "note";

/// A structured activity log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ActivityRecord {
    /// Identifier assigned by the store; absent until persisted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,

    /// Absolute point in time (ISO-8601 with offset)
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = DateTime, example = "2026-10-17T20:00:00+01:00"))]
    pub timestamp: DateTime<FixedOffset>,

    /// Short label categorizing the activity
    #[cfg_attr(feature = "openapi", schema(example = "feed_ml"))]
    pub event_type: String,

    /// Quantity, duration, or notes; empty when there is no detail
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(example = "190"))]
    pub value: String,

    /// Raw text that produced this record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_input: Option<String>,
}

impl ActivityRecord {
    /// Create an unsaved record
    pub fn new(
        timestamp: DateTime<FixedOffset>,
        event_type: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            timestamp,
            event_type: event_type.into(),
            value: value.into(),
            original_input: None,
        }
    }

    /// Record raw text verbatim as a note
    pub fn note(timestamp: DateTime<FixedOffset>, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            id: None,
            timestamp,
            event_type: NOTE_EVENT_TYPE.to_string(),
            value: text.clone(),
            original_input: Some(text),
        }
    }

    /// Attach the text the record was produced from
    pub fn with_original_input(mut self, input: impl Into<String>) -> Self {
        self.original_input = Some(input.into());
        self
    }

    /// Attach a store identifier
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    /// Check the invariants that the type system does not already enforce
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.event_type.trim().is_empty() {
            return Err("Activity event type must be a non-empty string".to_string());
        }
        Ok(())
    }
}

/// Unvalidated activity as produced by the interpreter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ActivityCandidate {
    pub timestamp: String,
    pub event_type: String,
    pub value: String,
}

impl From<&ActivityRecord> for ActivityCandidate {
    fn from(record: &ActivityRecord) -> Self {
        Self {
            timestamp: record.timestamp.to_rfc3339(),
            event_type: record.event_type.clone(),
            value: record.value.clone(),
        }
    }
}

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse an ISO-8601 timestamp produced by the interpreter
///
/// Timestamps with an offset are taken as is. Naive timestamps are resolved
/// in `local_offset`.
pub fn parse_timestamp(
    raw: &str,
    local_offset: FixedOffset,
) -> std::result::Result<DateTime<FixedOffset>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("timestamp is empty".to_string());
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(ts);
    }
    if let Ok(ts) = DateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Ok(ts);
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            if let Some(ts) = local_offset.from_local_datetime(&naive).single() {
                return Ok(ts);
            }
        }
    }

    Err(format!("'{}' is not a valid ISO-8601 timestamp", trimmed))
}

fn measured_feed_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(?:^|[^a-z])ml(?:[^a-z]|$)").expect("valid regex"))
}

fn millilitre_amount_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(\d+(?:\.\d+)?)\s*(?:ml|mls|millilitres?|milliliters?)?$")
            .expect("valid regex")
    })
}

/// Whether an event type records an amount in millilitres (e.g. "feed_ml", "Feed (ml)")
pub fn is_measured_feed(event_type: &str) -> bool {
    measured_feed_regex().is_match(event_type)
}

/// Whether an event type counts towards the daily milk total
///
/// Covers measured feeds plus anything naming a feed, bottle, milk or formula.
pub fn is_milk_feed(event_type: &str) -> bool {
    let lower = event_type.to_lowercase();
    is_measured_feed(event_type)
        || ["feed", "bottle", "milk", "formula"]
            .iter()
            .any(|word| lower.contains(word))
}

/// Reduce a measured-feed value to its bare number
///
/// Values of other event types are returned unchanged.
pub fn normalize_value(event_type: &str, value: &str) -> std::result::Result<String, String> {
    if !is_measured_feed(event_type) {
        return Ok(value.to_string());
    }
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(String::new());
    }

    millilitre_amount_regex()
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map(|amount| amount.as_str().to_string())
        .ok_or_else(|| {
            format!(
                "value '{}' for '{}' must be a bare number of millilitres",
                trimmed, event_type
            )
        })
}

/// Parse the numeric amount of a measured-feed value
pub fn feed_amount_ml(value: &str) -> Option<f64> {
    millilitre_amount_regex()
        .captures(value.trim())
        .and_then(|caps| caps.get(1))
        .and_then(|amount| amount.as_str().parse().ok())
}
