//! Google Gemini generateContent backend with JSON response mode.

use crate::error::{LlmError, Result};
use crate::format::{FieldKind, FormatField};
use crate::provider::{Provider, resolve_base_url};
use crate::types::{ApiRequest, Options, resolve_api_key};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

const GEMINI_DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const GEMINI_DEFAULT_MODEL: &str = "gemini-2.0-flash";
const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

pub struct GeminiProvider;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    // Consumed by build_request for the URL path and stripped from the body.
    model: String,
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<GeminiSchema>,
}

#[derive(Debug, Serialize)]
struct GeminiSchema {
    #[serde(rename = "type")]
    kind: &'static str,
    properties: Map<String, Value>,
    required: Vec<String>,
}

fn text_content(text: &str) -> GeminiContent {
    GeminiContent {
        parts: vec![GeminiPart {
            text: text.to_string(),
        }],
    }
}

/// Map a shorthand type name onto Gemini's upper-cased schema type tag.
fn gemini_type(t: &str) -> String {
    match t.trim().to_ascii_lowercase().as_str() {
        "string" => "STRING".to_string(),
        "integer" => "INTEGER".to_string(),
        "number" => "NUMBER".to_string(),
        "boolean" => "BOOLEAN".to_string(),
        "object" => "OBJECT".to_string(),
        "array" => "ARRAY".to_string(),
        "" => "STRING".to_string(),
        other => other.to_ascii_uppercase(),
    }
}

fn response_schema(fields: &[FormatField]) -> GeminiSchema {
    let mut properties = Map::new();
    let mut required = Vec::with_capacity(fields.len());
    for field in fields {
        let value = match &field.kind {
            FieldKind::Scalar(t) => json!({ "type": gemini_type(t) }),
            FieldKind::Array(elem) => json!({
                "type": "ARRAY",
                "items": { "type": gemini_type(elem) },
            }),
        };
        properties.insert(field.name.clone(), value);
        required.push(field.name.clone());
    }
    GeminiSchema {
        kind: "OBJECT",
        properties,
        required,
    }
}

impl Provider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn default_options(&self) -> Options {
        Options {
            model: GEMINI_DEFAULT_MODEL.to_string(),
            // max_tokens stays 0 (unspecified) unless the caller sets it.
            ..Options::default()
        }
    }

    fn build_payload(&self, opts: &Options) -> Result<Value> {
        let generation_config = if opts.max_tokens > 0 || !opts.fields.is_empty() {
            Some(GeminiGenerationConfig {
                max_output_tokens: (opts.max_tokens > 0).then_some(opts.max_tokens),
                response_mime_type: (!opts.fields.is_empty()).then_some("application/json"),
                response_schema: (!opts.fields.is_empty())
                    .then(|| response_schema(&opts.fields)),
            })
        } else {
            None
        };

        let req = GeminiRequest {
            model: opts.model.clone(),
            contents: vec![text_content(&opts.message)],
            system_instruction: if opts.instructions.trim().is_empty() {
                None
            } else {
                Some(text_content(&opts.instructions))
            },
            generation_config,
        };

        Ok(serde_json::to_value(req)?)
    }

    #[tracing::instrument(level = "debug", skip_all)]
    fn build_request(
        &self,
        payload: Value,
        base_url: Option<&str>,
        api_key: Option<&str>,
    ) -> Result<ApiRequest> {
        let mut payload = payload;
        // The model rides in the URL path, not the body.
        let model = payload
            .as_object_mut()
            .and_then(|obj| obj.remove("model"))
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        if model.trim().is_empty() {
            return Err(LlmError::InvalidInput("gemini: model is required".to_string()));
        }

        let api_key = resolve_api_key(api_key, GEMINI_API_KEY_ENV, "gemini")?;
        let base = resolve_base_url(base_url, GEMINI_DEFAULT_BASE_URL);

        let mut url =
            reqwest::Url::parse(&format!("{base}/v1beta/models/{model}:generateContent"))
                .map_err(|e| LlmError::InvalidInput(format!("gemini: invalid url: {e}")))?;
        url.query_pairs_mut().append_pair("key", &api_key);

        Ok(ApiRequest {
            method: reqwest::Method::POST,
            url: url.to_string(),
            headers: vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                ("Accept".to_string(), "application/json".to_string()),
            ],
            body: serde_json::to_vec(&payload)?,
        })
    }

    fn parse_response(&self, body: &[u8]) -> Result<String> {
        let parsed: GeminiResponse = serde_json::from_slice(body)?;

        // Only the first candidate counts; additional candidates are ignored.
        let mut out = String::new();
        if let Some(candidate) = parsed.candidates.first() {
            for part in &candidate.content.parts {
                out.push_str(&part.text);
            }
        }
        Ok(out)
    }
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: GeminiCandidateContent,
}

#[derive(Debug, Default, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::compile_format;

    fn options(format: &str) -> Options {
        Options {
            model: "gemini-2.0-flash".to_string(),
            message: "Hello".to_string(),
            fields: compile_format(format).expect("valid format"),
            ..Options::default()
        }
    }

    #[test]
    fn payload_wraps_message_and_optional_system_instruction() {
        let mut opts = options("");
        opts.instructions = "be concise".to_string();
        let payload = GeminiProvider.build_payload(&opts).expect("builds");

        assert_eq!(payload["contents"][0]["parts"][0]["text"], "Hello");
        assert_eq!(
            payload["systemInstruction"]["parts"][0]["text"],
            "be concise"
        );
        assert!(payload.get("generationConfig").is_none());
    }

    #[test]
    fn fields_enable_json_mode_with_uppercased_schema() {
        let payload = GeminiProvider
            .build_payload(&options("tags:string[],count:integer"))
            .expect("builds");

        let config = &payload["generationConfig"];
        assert_eq!(config["responseMimeType"], "application/json");

        let schema = &config["responseSchema"];
        assert_eq!(schema["type"], "OBJECT");
        assert_eq!(schema["properties"]["tags"]["type"], "ARRAY");
        assert_eq!(schema["properties"]["tags"]["items"]["type"], "STRING");
        assert_eq!(schema["properties"]["count"]["type"], "INTEGER");

        let required: Vec<&str> = schema["required"]
            .as_array()
            .expect("required")
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert!(required.contains(&"tags"));
        assert!(required.contains(&"count"));
    }

    #[test]
    fn max_tokens_alone_still_creates_generation_config() {
        let mut opts = options("");
        opts.max_tokens = 321;
        let payload = GeminiProvider.build_payload(&opts).expect("builds");

        let config = &payload["generationConfig"];
        assert_eq!(config["maxOutputTokens"], 321);
        assert!(config.get("responseMimeType").is_none());
        assert!(config.get("responseSchema").is_none());
    }

    #[test]
    fn type_tags_are_uppercased_with_string_fallback() {
        assert_eq!(gemini_type("string"), "STRING");
        assert_eq!(gemini_type("Boolean"), "BOOLEAN");
        assert_eq!(gemini_type(""), "STRING");
        assert_eq!(gemini_type("custom"), "CUSTOM");
    }

    #[test]
    fn request_moves_model_into_path_and_key_into_query() {
        let payload = GeminiProvider
            .build_payload(&options(""))
            .expect("builds");
        let req = GeminiProvider
            .build_request(payload, None, Some("g-test-key"))
            .expect("builds");

        assert!(req.url.starts_with(
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        ));
        assert!(req.url.contains("key=g-test-key"));
        assert!(!req.headers.iter().any(|(k, _)| k == "Authorization"));

        let body: Value = serde_json::from_slice(&req.body).expect("body is json");
        assert!(body.get("model").is_none(), "model must be stripped");
    }

    #[test]
    fn request_without_model_is_invalid() {
        let err = GeminiProvider
            .build_request(serde_json::json!({"contents": []}), None, Some("k"))
            .expect_err("must fail");
        assert!(err.to_string().contains("model is required"));
    }

    #[test]
    fn parse_concatenates_parts_of_first_candidate_only() {
        let body = br#"{"candidates":[
            {"content":{"parts":[{"text":"Hello "},{"text":"Gemini"}]}},
            {"content":{"parts":[{"text":"Second"}]}}
        ]}"#;
        assert_eq!(
            GeminiProvider.parse_response(body).expect("parses"),
            "Hello Gemini"
        );
    }

    #[test]
    fn parse_without_candidates_is_empty_text() {
        assert_eq!(
            GeminiProvider
                .parse_response(br#"{"candidates":[]}"#)
                .expect("parses"),
            ""
        );
        assert_eq!(GeminiProvider.parse_response(b"{}").expect("parses"), "");
    }

    #[test]
    fn parse_rejects_invalid_json() {
        assert!(GeminiProvider.parse_response(b"invalid").is_err());
    }
}
