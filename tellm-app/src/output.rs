//! Post-processing of the model's text: code-fence stripping, single-key
//! extraction, and error-field gating.

use serde_json::Value;

/// Strip one wrapping markdown code fence so fenced JSON can be decoded.
///
/// Only a fence that opens on the first line and closes on the last non-blank
/// line is removed; anything else comes back unchanged apart from trailing
/// whitespace.
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim_end();
    let lines: Vec<&str> = trimmed.lines().collect();
    if lines.len() >= 2
        && lines[0].starts_with("```")
        && lines[lines.len() - 1].trim() == "```"
    {
        return lines[1..lines.len() - 1].join("\n");
    }
    trimmed.to_string()
}

/// Extract one top-level key from structured JSON output. String values come
/// back verbatim; everything else is re-serialized compactly.
pub fn extract_key(text: &str, key: &str) -> anyhow::Result<String> {
    let stripped = strip_code_fences(text);
    let value: Value = serde_json::from_str(&stripped).map_err(|e| {
        anyhow::anyhow!("--only requires structured JSON output; failed to parse JSON: {e}")
    })?;
    let obj = value
        .as_object()
        .ok_or_else(|| anyhow::anyhow!("--only requires a JSON object response"))?;
    let field = obj
        .get(key)
        .ok_or_else(|| anyhow::anyhow!("key not found: {key}"))?;

    match field {
        Value::String(s) => Ok(s.clone()),
        other => Ok(serde_json::to_string(other)?),
    }
}

/// Check a structured response for an application-level error signal: a
/// non-empty string under `key`, other than the literal `"null"`. Responses
/// that are not JSON objects pass through unflagged.
pub fn error_field(text: &str, key: &str) -> Option<String> {
    let stripped = strip_code_fences(text);
    let value: Value = serde_json::from_str(&stripped).ok()?;
    let message = value.as_object()?.get(key)?.as_str()?.trim();
    if message.is_empty() || message == "null" {
        None
    } else {
        Some(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fence_with_language_tag() {
        assert_eq!(
            strip_code_fences("```json\n{\n  \"a\": 1\n}\n```\n"),
            "{\n  \"a\": 1\n}"
        );
    }

    #[test]
    fn strips_plain_fence_without_language() {
        assert_eq!(
            strip_code_fences("```\n{\n  \"a\": 1\n}\n```\n"),
            "{\n  \"a\": 1\n}"
        );
    }

    #[test]
    fn leaves_unclosed_fence_alone() {
        assert_eq!(
            strip_code_fences("```json\n{\n  \"a\": 1\n}"),
            "```json\n{\n  \"a\": 1\n}"
        );
    }

    #[test]
    fn ignores_incidental_fence_inside_body() {
        assert_eq!(
            strip_code_fences("prefix\n```something\nbody\n"),
            "prefix\n```something\nbody"
        );
    }

    #[test]
    fn keeps_fence_when_closing_line_is_not_last() {
        assert_eq!(
            strip_code_fences("```json\n{\n  \"a\": 1\n}\n```\ntrailer\n"),
            "```json\n{\n  \"a\": 1\n}\n```\ntrailer"
        );
    }

    #[test]
    fn trailing_blank_lines_after_closing_fence_are_ok() {
        assert_eq!(
            strip_code_fences("```json\n{\n  \"a\": 1\n}\n```\n\n\n"),
            "{\n  \"a\": 1\n}"
        );
    }

    #[test]
    fn extracts_string_value_verbatim_without_quoting() {
        let text = r#"{"command":"find . -name \"*.go\"","explanation":"..."}"#;
        assert_eq!(
            extract_key(text, "command").expect("extracts"),
            r#"find . -name "*.go""#
        );
    }

    #[test]
    fn extracts_non_string_values_as_compact_json() {
        let text = r#"{"count": 3, "tags": ["a", "b"], "flag": true, "none": null}"#;
        assert_eq!(extract_key(text, "count").expect("extracts"), "3");
        assert_eq!(extract_key(text, "tags").expect("extracts"), r#"["a","b"]"#);
        assert_eq!(extract_key(text, "flag").expect("extracts"), "true");
        assert_eq!(extract_key(text, "none").expect("extracts"), "null");
    }

    #[test]
    fn extraction_from_fenced_json_works() {
        let text = "```json\n{\"command\": \"ls\"}\n```\n";
        assert_eq!(extract_key(text, "command").expect("extracts"), "ls");
    }

    #[test]
    fn extraction_requires_valid_json() {
        let err = extract_key("plain prose", "command").expect_err("must fail");
        assert!(err.to_string().contains("structured JSON output"));
    }

    #[test]
    fn extraction_names_the_missing_key() {
        let err = extract_key(r#"{"a": 1}"#, "command").expect_err("must fail");
        assert!(err.to_string().contains("key not found: command"));
    }

    #[test]
    fn error_field_flags_non_empty_strings() {
        let text = r#"{"message":"","error":"rate limited"}"#;
        assert_eq!(error_field(text, "error").as_deref(), Some("rate limited"));
    }

    #[test]
    fn error_field_ignores_empty_null_and_missing() {
        assert_eq!(error_field(r#"{"error":""}"#, "error"), None);
        assert_eq!(error_field(r#"{"error":"null"}"#, "error"), None);
        assert_eq!(error_field(r#"{"error":null}"#, "error"), None);
        assert_eq!(error_field(r#"{"message":"ok"}"#, "error"), None);
        assert_eq!(error_field("not json at all", "error"), None);
        assert_eq!(error_field(r#"{"error": 42}"#, "error"), None);
    }
}
