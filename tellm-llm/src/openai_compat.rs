//! OpenAI-compatible Chat Completions backend.
//!
//! Covers self-hosted and third-party endpoints that speak the Chat
//! Completions dialect. Structured output rides on the same strict-JSON
//! system instruction as the Anthropic backend.

use crate::error::{LlmError, Result};
use crate::provider::{Provider, resolve_base_url};
use crate::schema::strict_json_system;
use crate::types::{ApiRequest, Options, resolve_api_key};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const COMPAT_DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const COMPAT_DEFAULT_MODEL: &str = "gpt-4o-mini";
const COMPAT_API_KEY_ENV: &str = "OPENAI_API_KEY";

pub struct OpenAiCompatProvider;

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatRequestMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatRequestMessage {
    role: &'static str,
    content: String,
}

impl Provider for OpenAiCompatProvider {
    fn name(&self) -> &'static str {
        "openai-compat"
    }

    fn default_options(&self) -> Options {
        Options {
            model: COMPAT_DEFAULT_MODEL.to_string(),
            ..Options::default()
        }
    }

    fn build_payload(&self, opts: &Options) -> Result<Value> {
        let mut messages = Vec::with_capacity(2);
        let system = strict_json_system(&opts.fields, &opts.instructions);
        if !system.is_empty() {
            messages.push(ChatRequestMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatRequestMessage {
            role: "user",
            content: opts.message.clone(),
        });

        let req = ChatRequest {
            model: opts.model.clone(),
            messages,
            max_tokens: (opts.max_tokens > 0).then_some(opts.max_tokens),
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
        let api_key = resolve_api_key(api_key, COMPAT_API_KEY_ENV, "openai-compat")?;
        let base = resolve_base_url(base_url, COMPAT_DEFAULT_BASE_URL);

        Ok(ApiRequest {
            method: reqwest::Method::POST,
            url: format!("{base}/chat/completions"),
            headers: vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                ("Accept".to_string(), "application/json".to_string()),
                ("Authorization".to_string(), format!("Bearer {api_key}")),
            ],
            body: serde_json::to_vec(&payload)?,
        })
    }

    fn parse_response(&self, body: &[u8]) -> Result<String> {
        let parsed: ChatResponse = serde_json::from_slice(body)?;
        let Some(choice) = parsed.choices.first() else {
            return Err(LlmError::ResponseFormat("no choices in response".to_string()));
        };
        Ok(choice.message.content.clone())
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: ChatChoiceMessage,
}

#[derive(Debug, Default, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: String,
}
