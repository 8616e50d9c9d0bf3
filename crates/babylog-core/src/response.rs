// Response validation
//
// Turns raw interpreter text into validated records. The payload is
// untrusted: every field is checked for presence and type, nothing is coerced,
// and one bad item rejects the whole response.

use crate::activity::{normalize_value, parse_timestamp, ActivityCandidate, ActivityRecord};
use crate::error::{InterpretError, Result, DEFAULT_AMBIGUOUS_MESSAGE, DEFAULT_NO_ACTIVITIES_MESSAGE};
use crate::extract::extract_json;
use crate::known_types::KnownTypes;
use chrono::FixedOffset;
use serde_json::{Map, Value};

/// Shared inputs for turning candidates into records
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    pub known_types: &'a KnownTypes,
    /// Offset applied to timestamps without zone information
    pub local_offset: FixedOffset,
}

/// Validate an add-flow response into one or more records
pub fn parse_add_response(
    raw: &str,
    ctx: ValidationContext<'_>,
    original_input: &str,
) -> Result<Vec<ActivityRecord>> {
    let payload = parse_payload(raw)?;
    let error_message = optional_error(&payload)?;

    let items = match payload.get("activities") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.clone(),
        Some(_) => return Err(InterpretError::schema("'activities' must be a list")),
    };

    if items.is_empty() {
        return Err(InterpretError::NoActivitiesRecognized(
            error_message.unwrap_or_else(|| DEFAULT_NO_ACTIVITIES_MESSAGE.to_string()),
        ));
    }

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let candidate = candidate_from_value(item)
                .map_err(|e| InterpretError::schema(format!("activity {}: {}", index, e)))?;
            let record = record_from_candidate(&candidate, ctx)
                .map_err(|e| InterpretError::schema(format!("activity {}: {}", index, e)))?;
            Ok(record.with_original_input(original_input))
        })
        .collect()
}

/// Validate an update-flow response into a replacement for `existing`
///
/// The replacement keeps the identifier and original input of `existing`.
pub fn parse_update_response(
    raw: &str,
    ctx: ValidationContext<'_>,
    existing: &ActivityRecord,
) -> Result<ActivityRecord> {
    let payload = parse_payload(raw)?;
    let error_message = optional_error(&payload)?;

    let item = match payload.get("activity") {
        None | Some(Value::Null) => {
            return Err(InterpretError::AmbiguousInstruction(
                error_message.unwrap_or_else(|| DEFAULT_AMBIGUOUS_MESSAGE.to_string()),
            ))
        }
        Some(item) => item,
    };

    let candidate =
        candidate_from_value(item).map_err(|e| InterpretError::schema(format!("activity: {}", e)))?;
    let mut record = record_from_candidate(&candidate, ctx)
        .map_err(|e| InterpretError::schema(format!("activity: {}", e)))?;
    record.id = existing.id;
    record.original_input = existing.original_input.clone();
    Ok(record)
}

/// Extract and parse the JSON object, which must be a JSON object at top level
fn parse_payload(raw: &str) -> Result<Map<String, Value>> {
    if raw.trim().is_empty() {
        return Err(InterpretError::EmptyModelResponse);
    }

    let json = extract_json(raw)
        .ok_or_else(|| InterpretError::unparsable("no JSON object found in response"))?;

    match serde_json::from_str::<Value>(json) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(InterpretError::schema("response is not a JSON object")),
        Err(e) => Err(InterpretError::unparsable(e.to_string())),
    }
}

/// The optional `error` field; blank strings count as absent
fn optional_error(payload: &Map<String, Value>) -> Result<Option<String>> {
    match payload.get("error") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(msg)) if msg.trim().is_empty() => Ok(None),
        Some(Value::String(msg)) => Ok(Some(msg.trim().to_string())),
        Some(_) => Err(InterpretError::schema("'error' must be a string")),
    }
}

fn candidate_from_value(item: &Value) -> std::result::Result<ActivityCandidate, String> {
    let object = item
        .as_object()
        .ok_or_else(|| "expected an object".to_string())?;

    let field = |name: &str| -> std::result::Result<String, String> {
        match object.get(name) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(other) => Err(format!("'{}' must be a string, got {}", name, type_name(other))),
            None => Err(format!("missing required field '{}'", name)),
        }
    };

    Ok(ActivityCandidate {
        timestamp: field("timestamp")?,
        event_type: field("event_type")?,
        value: field("value")?,
    })
}

fn record_from_candidate(
    candidate: &ActivityCandidate,
    ctx: ValidationContext<'_>,
) -> std::result::Result<ActivityRecord, String> {
    let timestamp = parse_timestamp(&candidate.timestamp, ctx.local_offset)?;

    let event_type = candidate.event_type.trim();
    if event_type.is_empty() {
        return Err("'event_type' must be a non-empty string".to_string());
    }
    let event_type = ctx.known_types.reconcile(event_type);
    let value = normalize_value(&event_type, &candidate.value)?;

    Ok(ActivityRecord::new(timestamp, event_type, value))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn known() -> KnownTypes {
        ["feed_ml", "sleep", "Poo"].into_iter().collect()
    }

    fn ctx(known: &KnownTypes) -> ValidationContext<'_> {
        ValidationContext {
            known_types: known,
            local_offset: FixedOffset::east_opt(3600).unwrap(),
        }
    }

    fn existing() -> ActivityRecord {
        let ts = DateTime::parse_from_rfc3339("2026-10-16T14:00:00+01:00").unwrap();
        ActivityRecord::new(ts, "sleep", "")
            .with_id(uuid::Uuid::now_v7())
            .with_original_input("14:00 sleep")
    }

    #[test]
    fn test_add_single_activity() {
        let known = known();
        let raw = r#"{"activities":[{"timestamp":"2026-10-17T20:00:00+01:00","event_type":"feed_ml","value":"190"}]}"#;
        let records = parse_add_response(raw, ctx(&known), "20:00 190ml").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].event_type, "feed_ml");
        assert_eq!(records[0].value, "190");
        assert_eq!(records[0].original_input.as_deref(), Some("20:00 190ml"));
        assert!(records[0].id.is_none());
    }

    #[test]
    fn test_add_preserves_order() {
        let known = known();
        let raw = r#"{"activities":[
            {"timestamp":"2026-10-17T08:00:00+01:00","event_type":"sleep","value":""},
            {"timestamp":"2026-10-17T07:00:00+01:00","event_type":"Poo","value":""}
        ]}"#;
        let records = parse_add_response(raw, ctx(&known), "x").unwrap();
        let types: Vec<_> = records.iter().map(|r| r.event_type.as_str()).collect();
        assert_eq!(types, vec!["sleep", "Poo"]);
    }

    #[test]
    fn test_add_reconciles_case_and_strips_units() {
        let known = known();
        let raw = r#"{"activities":[{"timestamp":"2026-10-17T20:00:00+01:00","event_type":"FEED_ML","value":"190ml"},{"timestamp":"2026-10-17T20:05:00+01:00","event_type":"poo","value":""}]}"#;
        let records = parse_add_response(raw, ctx(&known), "x").unwrap();
        assert_eq!(records[0].event_type, "feed_ml");
        assert_eq!(records[0].value, "190");
        assert_eq!(records[1].event_type, "Poo");
    }

    #[test]
    fn test_add_missing_value_is_schema_violation() {
        let known = known();
        let raw = r#"{"activities":[{"timestamp":"2026-10-17T20:00:00+01:00","event_type":"poo"}]}"#;
        let err = parse_add_response(raw, ctx(&known), "poo").unwrap_err();
        assert!(matches!(err, InterpretError::SchemaViolation(_)));
        assert!(err.to_string().contains("value"));
    }

    #[test]
    fn test_add_rejects_whole_response_on_one_bad_item() {
        let known = known();
        let raw = r#"{"activities":[
            {"timestamp":"2026-10-17T20:00:00+01:00","event_type":"sleep","value":""},
            {"timestamp":"2026-10-17T20:00:00+01:00","event_type":"feed_ml","value":190}
        ]}"#;
        let err = parse_add_response(raw, ctx(&known), "x").unwrap_err();
        assert!(matches!(err, InterpretError::SchemaViolation(ref msg) if msg.contains("activity 1")));
    }

    #[test]
    fn test_add_rejects_relative_timestamp() {
        let known = known();
        let raw = r#"{"activities":[{"timestamp":"today at 8pm","event_type":"sleep","value":""}]}"#;
        let err = parse_add_response(raw, ctx(&known), "x").unwrap_err();
        assert!(matches!(err, InterpretError::SchemaViolation(_)));
    }

    #[test]
    fn test_add_rejects_blank_event_type() {
        let known = known();
        let raw = r#"{"activities":[{"timestamp":"2026-10-17T20:00:00+01:00","event_type":"  ","value":""}]}"#;
        let err = parse_add_response(raw, ctx(&known), "x").unwrap_err();
        assert!(matches!(err, InterpretError::SchemaViolation(_)));
    }

    #[test]
    fn test_add_empty_list_uses_model_message() {
        let known = known();
        let raw = r#"{"activities":[],"error":"Input is not a baby activity"}"#;
        let err = parse_add_response(raw, ctx(&known), "hello").unwrap_err();
        assert_eq!(
            err,
            InterpretError::NoActivitiesRecognized("Input is not a baby activity".into())
        );
    }

    #[test]
    fn test_add_missing_list_uses_default_message() {
        let known = known();
        let err = parse_add_response("{}", ctx(&known), "hello").unwrap_err();
        assert_eq!(
            err,
            InterpretError::NoActivitiesRecognized(DEFAULT_NO_ACTIVITIES_MESSAGE.into())
        );
    }

    #[test]
    fn test_add_non_list_is_schema_violation() {
        let known = known();
        let err = parse_add_response(r#"{"activities":{}}"#, ctx(&known), "x").unwrap_err();
        assert!(matches!(err, InterpretError::SchemaViolation(_)));
    }

    #[test]
    fn test_non_string_error_is_schema_violation() {
        let known = known();
        let err =
            parse_add_response(r#"{"activities":[],"error":42}"#, ctx(&known), "x").unwrap_err();
        assert!(matches!(err, InterpretError::SchemaViolation(_)));
    }

    #[test]
    fn test_unparsable_and_empty() {
        let known = known();
        assert!(matches!(
            parse_add_response("not json at all", ctx(&known), "x").unwrap_err(),
            InterpretError::UnparsableResponse(_)
        ));
        assert!(matches!(
            parse_add_response(r#"{"activities": [,]}"#, ctx(&known), "x").unwrap_err(),
            InterpretError::UnparsableResponse(_)
        ));
        assert_eq!(
            parse_add_response("  \n", ctx(&known), "x").unwrap_err(),
            InterpretError::EmptyModelResponse
        );
    }

    #[test]
    fn test_fenced_response() {
        let known = known();
        let raw = "```json\n{\"activities\":[{\"timestamp\":\"2026-10-17T20:00:00+01:00\",\"event_type\":\"sleep\",\"value\":\"\"}]}\n```";
        let records = parse_add_response(raw, ctx(&known), "sleep").unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_update_copies_bookkeeping_fields() {
        let known = known();
        let existing = existing();
        let raw = r#"{"activity":{"timestamp":"2026-10-16T16:30:00+01:00","event_type":"sleep","value":""}}"#;
        let record = parse_update_response(raw, ctx(&known), &existing).unwrap();
        assert_eq!(record.id, existing.id);
        assert_eq!(record.original_input, existing.original_input);
        assert_eq!(record.timestamp.to_rfc3339(), "2026-10-16T16:30:00+01:00");
    }

    #[test]
    fn test_update_without_activity_is_ambiguous() {
        let known = known();
        let existing = existing();

        let err = parse_update_response(r#"{"activity":null}"#, ctx(&known), &existing).unwrap_err();
        assert_eq!(
            err,
            InterpretError::AmbiguousInstruction(DEFAULT_AMBIGUOUS_MESSAGE.into())
        );

        let err = parse_update_response(r#"{"error":"Which feed?"}"#, ctx(&known), &existing)
            .unwrap_err();
        assert_eq!(err, InterpretError::AmbiguousInstruction("Which feed?".into()));
    }

    #[test]
    fn test_update_partial_activity_is_schema_violation() {
        let known = known();
        let raw = r#"{"activity":{"timestamp":"2026-10-16T16:30:00+01:00"}}"#;
        let err = parse_update_response(raw, ctx(&known), &existing()).unwrap_err();
        assert!(matches!(err, InterpretError::SchemaViolation(_)));
    }

    #[test]
    fn test_update_non_object_activity_is_schema_violation() {
        let known = known();
        let err =
            parse_update_response(r#"{"activity":"sleep"}"#, ctx(&known), &existing()).unwrap_err();
        assert!(matches!(err, InterpretError::SchemaViolation(_)));
    }

    #[test]
    fn test_top_level_array_uses_first_object() {
        let known = known();
        // Brace matching finds the inner object, which has no activities key
        let err = parse_add_response(r#"[{"a":1}]"#, ctx(&known), "x").unwrap_err();
        assert!(matches!(err, InterpretError::NoActivitiesRecognized(_)));
    }
}
