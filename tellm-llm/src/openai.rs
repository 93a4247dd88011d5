//! OpenAI Responses API backend with strict JSON Schema structured output.

use crate::error::Result;
use crate::format::{FieldKind, FormatField};
use crate::provider::{Provider, resolve_base_url};
use crate::types::{ApiRequest, Options, non_empty, resolve_api_key};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

const OPENAI_DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const OPENAI_DEFAULT_MODEL: &str = "gpt-5-nano";
const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

pub struct OpenAiProvider;

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    instructions: String,
    input: String,
    store: bool,
    text: OpenAiText,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning: Option<OpenAiReasoning>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct OpenAiText {
    #[serde(skip_serializing_if = "Option::is_none")]
    verbosity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<OpenAiTextFormat>,
}

#[derive(Debug, Serialize)]
struct OpenAiTextFormat {
    #[serde(rename = "type")]
    kind: &'static str,
    name: &'static str,
    strict: bool,
    schema: OpenAiSchema,
}

#[derive(Debug, Serialize)]
struct OpenAiSchema {
    #[serde(rename = "type")]
    kind: &'static str,
    properties: Map<String, Value>,
    required: Vec<String>,
    #[serde(rename = "additionalProperties")]
    additional_properties: bool,
}

#[derive(Debug, Serialize)]
struct OpenAiReasoning {
    effort: String,
}

/// Render declared fields as JSON Schema property definitions.
fn json_schema_properties(fields: &[FormatField]) -> Map<String, Value> {
    let mut props = Map::new();
    for field in fields {
        let value = match &field.kind {
            FieldKind::Scalar(t) => json!({ "type": t }),
            FieldKind::Array(elem) => json!({ "type": "array", "items": { "type": elem } }),
        };
        props.insert(field.name.clone(), value);
    }
    props
}

impl Provider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn default_options(&self) -> Options {
        Options {
            model: OPENAI_DEFAULT_MODEL.to_string(),
            ..Options::default()
        }
    }

    fn build_payload(&self, opts: &Options) -> Result<Value> {
        // No declared fields means free-form text, no schema enforcement.
        let format = if opts.fields.is_empty() {
            None
        } else {
            Some(OpenAiTextFormat {
                kind: "json_schema",
                name: "response",
                strict: true,
                schema: OpenAiSchema {
                    kind: "object",
                    properties: json_schema_properties(&opts.fields),
                    required: opts.fields.iter().map(|f| f.name.clone()).collect(),
                    additional_properties: false,
                },
            })
        };

        let req = OpenAiRequest {
            model: opts.model.clone(),
            instructions: opts.instructions.clone(),
            input: opts.message.clone(),
            store: false,
            text: OpenAiText {
                verbosity: non_empty(&opts.verbosity),
                format,
            },
            reasoning: non_empty(&opts.reasoning_effort).map(|effort| OpenAiReasoning { effort }),
            max_output_tokens: (opts.max_tokens > 0).then_some(opts.max_tokens),
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
        let api_key = resolve_api_key(api_key, OPENAI_API_KEY_ENV, "openai")?;
        let base = resolve_base_url(base_url, OPENAI_DEFAULT_BASE_URL);

        Ok(ApiRequest {
            method: reqwest::Method::POST,
            url: format!("{base}/responses"),
            headers: vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                ("Accept".to_string(), "application/json".to_string()),
                ("Authorization".to_string(), format!("Bearer {api_key}")),
            ],
            body: serde_json::to_vec(&payload)?,
        })
    }

    fn parse_response(&self, body: &[u8]) -> Result<String> {
        let parsed: OpenAiResponse = serde_json::from_slice(body)?;

        // Prefer the convenience field, then the first textual output block.
        if !parsed.output_text.is_empty() {
            return Ok(parsed.output_text);
        }
        for item in &parsed.output {
            for block in &item.content {
                if block.kind == "output_text" && !block.text.is_empty() {
                    return Ok(block.text.clone());
                }
            }
        }
        Ok(String::new())
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    output_text: String,
    #[serde(default)]
    output: Vec<OpenAiOutputItem>,
}

#[derive(Debug, Deserialize)]
struct OpenAiOutputItem {
    #[serde(default)]
    content: Vec<OpenAiContentBlock>,
}

#[derive(Debug, Deserialize)]
struct OpenAiContentBlock {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: String,
}
