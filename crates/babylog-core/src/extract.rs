// JSON extraction from model output
//
// Models wrap JSON in Markdown fences or surround it with prose. Extraction
// finds the candidate object text; parsing and validation happen elsewhere.

/// Locate the JSON object inside raw model output
///
/// A fenced block (```json ... ``` or ``` ... ```) wins when present.
/// Otherwise the first top-level `{...}` object is returned, matched by brace
/// depth while skipping braces inside string literals.
pub fn extract_json(text: &str) -> Option<&str> {
    if let Some(fenced) = fenced_block(text) {
        let fenced = fenced.trim();
        if !fenced.is_empty() {
            return Some(fenced);
        }
    }

    first_object(text)
}

/// Contents of the first Markdown code fence, if any
fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after_ticks = &text[open + 3..];
    // Skip an optional language tag on the opening line
    let body_start = match after_ticks.find('\n') {
        Some(newline) if is_language_tag(&after_ticks[..newline]) => newline + 1,
        _ => 0,
    };
    let body = &after_ticks[body_start..];
    let close = body.find("```")?;
    let block = &body[..close];
    if body_start > 0 {
        return Some(block);
    }
    // Tag on the same line as the payload: ```json {...}```
    let trimmed = block.trim_start();
    match trimmed.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => Some(&trimmed[4..]),
        _ => Some(trimmed),
    }
}

fn is_language_tag(line: &str) -> bool {
    line.trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// First balanced top-level object, string and escape aware
fn first_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Shorten long text for debug logs
pub(crate) fn truncate_for_log(input: &str, max_chars: usize) -> String {
    let char_count = input.chars().count();
    if char_count <= max_chars {
        return input.to_string();
    }
    let mut preview: String = input.chars().take(max_chars).collect();
    preview.push_str(&format!("... [truncated, total_chars={}]", char_count));
    preview
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_object() {
        assert_eq!(extract_json(r#"{"a":1}"#), Some(r#"{"a":1}"#));
    }

    #[test]
    fn test_json_fence() {
        let text = "Here you go:\n```json\n{\"activities\": []}\n```\nThanks";
        assert_eq!(extract_json(text), Some(r#"{"activities": []}"#));
    }

    #[test]
    fn test_plain_fence() {
        let text = "```\n{\"activity\": null}\n```";
        assert_eq!(extract_json(text), Some(r#"{"activity": null}"#));
    }

    #[test]
    fn test_single_line_fence() {
        let text = "```{\"a\": 1}```";
        assert_eq!(extract_json(text), Some(r#"{"a": 1}"#));
    }

    #[test]
    fn test_single_line_fence_with_tag() {
        let text = "```json {\"activities\": []}```";
        assert_eq!(extract_json(text), Some(r#"{"activities": []}"#));

        let text = "Here you go: ```JSON{\"a\": 1}``` done";
        assert_eq!(extract_json(text), Some(r#"{"a": 1}"#));
    }

    #[test]
    fn test_prose_around_object() {
        let text = "Sure! {\"a\": {\"b\": 2}} and then {\"c\": 3}";
        assert_eq!(extract_json(text), Some(r#"{"a": {"b": 2}}"#));
    }

    #[test]
    fn test_braces_inside_strings_are_ignored() {
        let text = r#"note: {"value": "a } tricky { one", "quote": "say \"}\""} trailing }"#;
        assert_eq!(
            extract_json(text),
            Some(r#"{"value": "a } tricky { one", "quote": "say \"}\""}"#)
        );
    }

    #[test]
    fn test_no_object() {
        assert_eq!(extract_json("not json at all"), None);
        assert_eq!(extract_json(""), None);
    }

    #[test]
    fn test_unbalanced_object() {
        assert_eq!(extract_json(r#"{"activities": ["#), None);
    }

    #[test]
    fn test_truncate_for_log() {
        assert_eq!(truncate_for_log("short", 10), "short");
        let long = "x".repeat(20);
        assert_eq!(
            truncate_for_log(&long, 5),
            "xxxxx... [truncated, total_chars=20]"
        );
    }
}
