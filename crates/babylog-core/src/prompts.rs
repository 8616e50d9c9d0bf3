// Prompt templates and response schemas
//
// Both flows send a single prompt carrying the current time and the known
// event types. Casing policy: labels keep the casing of the user's text or of
// the reused known type; prompts never ask for lowercase labels.

use crate::activity::ActivityCandidate;
use crate::known_types::KnownTypes;
use crate::llm_drivers::ResponseFormat;
use chrono::{DateTime, FixedOffset};
use serde_json::{json, Value};

/// Schema name for the add flow response
pub const ADD_SCHEMA_NAME: &str = "activity_log_entries";

/// Schema name for the update flow response
pub const UPDATE_SCHEMA_NAME: &str = "activity_log_update";

fn activity_item_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "timestamp": { "type": "string", "description": "ISO 8601 timestamp" },
            "event_type": { "type": "string", "description": "Category of the event" },
            "value": { "type": "string", "description": "Quantity, duration, or notes" }
        },
        "required": ["timestamp", "event_type", "value"]
    })
}

/// `{activities: [{timestamp, event_type, value}], error?}`
pub fn add_response_format() -> ResponseFormat {
    ResponseFormat::new(
        ADD_SCHEMA_NAME,
        json!({
            "type": "object",
            "properties": {
                "activities": {
                    "type": "array",
                    "description": "Parsed activity entries",
                    "items": activity_item_schema()
                },
                "error": { "type": "string", "description": "Error message when input is invalid" }
            },
            "required": ["activities"]
        }),
    )
}

/// `{activity: {timestamp, event_type, value}, error?}`
pub fn update_response_format() -> ResponseFormat {
    ResponseFormat::new(
        UPDATE_SCHEMA_NAME,
        json!({
            "type": "object",
            "properties": {
                "activity": activity_item_schema(),
                "error": { "type": "string", "description": "Error message when input is invalid" }
            },
            "required": []
        }),
    )
}

/// Render a value for inclusion inside a double-quoted prompt line
fn quoted(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{}\"", text.replace('"', "'")))
}

/// Prompt for turning free text into one or more new activities
pub fn add_prompt(text: &str, known_types: &KnownTypes, now: DateTime<FixedOffset>) -> String {
    format!(
        r#"Current System Time: {now}
Known Event Types: {known}

Task: Parse the User Input into one or more structured baby activity log entries.

Rules:
1. Timestamp:
   - If a time of day is provided in the input (e.g., "15:00"), combine it with the Current System Date.
   - If no time is provided, use the Current System Time exactly.
   - Always return an absolute ISO 8601 string including the UTC offset. Never return relative text.
2. Event Type:
   - ALWAYS try to reuse one of the Known Event Types, spelled exactly as listed, if it is semantically similar (e.g., "fed" -> a known "feed" type).
   - If the input includes an amount in ml (e.g., "190ml"), use the known feed/milk event type if available.
   - If it is a new type of activity and no known type matches, create a concise label based on the input.
   - Keep the casing of the known type or of the user's words; do not change letter case.
3. Value:
   - Extract details like amount, duration, or notes.
   - For feed/milk entries measured in ml, store only the numeric amount without units (e.g., "160").
   - If the input is just the event type (e.g., "poo"), leave value as an empty string.
4. Output scope:
   - Only output JSON for the entries to insert.
5. Multiple entries:
   - If the input describes multiple activities, return one item per activity.
   - Preserve the order the user provided.
6. Invalid input:
   - If the input cannot be parsed into any activity, return an error message and an empty activities array.

Examples:
- Input: "20:00 190ml" -> {{"activities": [{{"timestamp": "<today>T20:00:00<offset>", "event_type": "feed_ml", "value": "190"}}]}}
- Input: "18:30 antibiotic cream both ears" -> {{"activities": [{{"timestamp": "<today>T18:30:00<offset>", "event_type": "Antibiotic cream", "value": "both ears"}}]}}

User Input: {input}
"#,
        now = now.to_rfc3339(),
        known = known_types.joined(),
        input = quoted(text),
    )
}

/// Prompt for producing a full replacement of an existing activity
pub fn update_prompt(
    instruction: &str,
    existing: &ActivityCandidate,
    known_types: &KnownTypes,
    now: DateTime<FixedOffset>,
) -> String {
    let existing_json = serde_json::to_string(existing).unwrap_or_default();
    format!(
        r#"Current System Time: {now}
Known Event Types: {known}

Existing Activity (do not lose details unless the instruction says to change them):
{existing}

Update Instruction: {instruction}

Task: Update the existing activity using the instruction, returning a single complete activity object.

Rules:
1. Only change fields implied by the instruction. Copy every other field from the existing activity unchanged.
2. Output scope:
   - Only output JSON for the updated entry, with all three fields present.
3. Timestamp:
   - If the instruction includes a time of day (e.g., "16:30"), keep the date of the existing timestamp and replace only the time of day.
   - If no time is provided, keep the existing timestamp.
   - Always return an absolute ISO 8601 string including the UTC offset.
4. Event Type:
   - Try to reuse one of the Known Event Types, spelled exactly as listed, if semantically similar.
   - Otherwise keep the existing label or create a concise one; do not change letter case.
5. Value:
   - Extract updated details like amount, duration, or notes.
   - For feed/milk entries measured in ml, store only the numeric amount without units (e.g., "160").
6. Ambiguity:
   - If the instruction is too vague to determine a concrete change, return an error message and no activity.
"#,
        now = now.to_rfc3339(),
        known = known_types.joined(),
        existing = existing_json,
        instruction = quoted(instruction),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2026-10-17T09:15:00+01:00").unwrap()
    }

    #[test]
    fn test_add_prompt_carries_context() {
        let known: KnownTypes = ["feed_ml", "sleep"].into_iter().collect();
        let prompt = add_prompt("20:00 190ml", &known, now());
        assert!(prompt.contains("Current System Time: 2026-10-17T09:15:00+01:00"));
        assert!(prompt.contains("Known Event Types: feed_ml, sleep"));
        assert!(prompt.contains(r#"User Input: "20:00 190ml""#));
    }

    #[test]
    fn test_add_prompt_escapes_quotes() {
        let prompt = add_prompt(r#"said "hi""#, &KnownTypes::new(), now());
        assert!(prompt.contains(r#"User Input: "said \"hi\"""#));
    }

    #[test]
    fn test_prompts_do_not_request_lowercase() {
        let known = KnownTypes::new();
        let existing = ActivityCandidate {
            timestamp: "2026-10-16T14:00:00+01:00".into(),
            event_type: "sleep".into(),
            value: String::new(),
        };
        for prompt in [
            add_prompt("poo", &known, now()),
            update_prompt("change to 16:30", &existing, &known, now()),
        ] {
            assert!(!prompt.to_lowercase().contains("lowercase label"));
        }
    }

    #[test]
    fn test_update_prompt_embeds_existing_record() {
        let existing = ActivityCandidate {
            timestamp: "2026-10-16T14:00:00+01:00".into(),
            event_type: "sleep".into(),
            value: String::new(),
        };
        let prompt = update_prompt("change to 16:30", &existing, &KnownTypes::new(), now());
        assert!(prompt.contains(r#""event_type":"sleep""#));
        assert!(prompt.contains(r#"Update Instruction: "change to 16:30""#));
    }

    #[test]
    fn test_schemas_require_all_fields() {
        let add = add_response_format();
        assert_eq!(add.name, ADD_SCHEMA_NAME);
        assert_eq!(
            add.schema["properties"]["activities"]["items"]["required"],
            json!(["timestamp", "event_type", "value"])
        );

        let update = update_response_format();
        assert_eq!(
            update.schema["properties"]["activity"]["required"],
            json!(["timestamp", "event_type", "value"])
        );
    }
}
