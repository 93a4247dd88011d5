//! Anthropic Messages API backend.
//!
//! Anthropic has no mechanical structured-output mode here, so declared
//! fields are rendered into the system prompt as a strict-JSON instruction
//! block. The contract is best effort, not guaranteed.

use crate::error::Result;
use crate::provider::{Provider, resolve_base_url};
use crate::schema::strict_json_system;
use crate::types::{ApiRequest, Options, non_empty, resolve_api_key};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const ANTHROPIC_DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_DEFAULT_MODEL: &str = "claude-3-5-haiku-latest";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const ANTHROPIC_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

pub struct AnthropicProvider;

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<AnthropicMessage>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: &'static str,
    content: String,
}

/// Default max output tokens per model family, from Anthropic's model
/// overview. Unrecognized models get a conservative lower bound.
fn default_max_tokens(model: &str) -> u32 {
    let m = model.to_ascii_lowercase();
    if m.contains("opus-4") {
        32_000
    } else if m.contains("sonnet-4") || m.contains("3-7-sonnet") {
        64_000
    } else if m.contains("3-5-sonnet") || m.contains("3-5-haiku") || m.contains("haiku-latest") {
        8_192
    } else {
        4_096
    }
}

impl Provider for AnthropicProvider {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    fn default_options(&self) -> Options {
        Options {
            model: ANTHROPIC_DEFAULT_MODEL.to_string(),
            max_tokens: default_max_tokens(ANTHROPIC_DEFAULT_MODEL),
            ..Options::default()
        }
    }

    fn build_payload(&self, opts: &Options) -> Result<Value> {
        let max_tokens = if opts.max_tokens > 0 {
            opts.max_tokens
        } else {
            default_max_tokens(&opts.model)
        };

        let req = AnthropicRequest {
            model: opts.model.clone(),
            max_tokens,
            system: non_empty(&strict_json_system(&opts.fields, &opts.instructions)),
            messages: vec![AnthropicMessage {
                role: "user",
                content: opts.message.clone(),
            }],
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
        let api_key = resolve_api_key(api_key, ANTHROPIC_API_KEY_ENV, "anthropic")?;
        let base = resolve_base_url(base_url, ANTHROPIC_DEFAULT_BASE_URL);

        Ok(ApiRequest {
            method: reqwest::Method::POST,
            url: format!("{base}/messages"),
            headers: vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                ("Accept".to_string(), "application/json".to_string()),
                ("anthropic-version".to_string(), ANTHROPIC_VERSION.to_string()),
                ("x-api-key".to_string(), api_key),
            ],
            body: serde_json::to_vec(&payload)?,
        })
    }

    fn parse_response(&self, body: &[u8]) -> Result<String> {
        let parsed: AnthropicResponse = serde_json::from_slice(body)?;

        // Concatenate text blocks in order; other block kinds are skipped.
        let mut out = String::new();
        for block in &parsed.content {
            if block.kind == "text" && !block.text.is_empty() {
                out.push_str(&block.text);
            }
        }
        Ok(out)
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<AnthropicContentBlock>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContentBlock {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: String,
}
