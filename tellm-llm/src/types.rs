use crate::error::{LlmError, Result};
use crate::format::FormatField;

/// Provider-agnostic settings for one API call.
///
/// Built once by the caller from merged flag/profile/default values and not
/// mutated afterwards; providers only ever see a shared reference.
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub model: String,
    pub instructions: String,
    pub message: String,
    pub verbosity: String,
    pub reasoning_effort: String,
    /// Maximum output tokens; 0 means the provider default.
    pub max_tokens: u32,
    pub fields: Vec<FormatField>,
}

/// A fully built wire-level request, ready to hand to an HTTP transport.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: reqwest::Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

const SECRET_HEADERS: [&str; 2] = ["authorization", "x-api-key"];
const SECRET_QUERY_PARAMS: [&str; 1] = ["key"];

impl ApiRequest {
    /// URL with credential-bearing query parameters masked, safe to log.
    pub fn redacted_url(&self) -> String {
        let Some((base, query)) = self.url.split_once('?') else {
            return self.url.clone();
        };
        let masked: Vec<String> = query
            .split('&')
            .map(|kv| match kv.split_once('=') {
                Some((k, _)) if SECRET_QUERY_PARAMS.contains(&k) => format!("{k}=***"),
                _ => kv.to_string(),
            })
            .collect();
        format!("{base}?{}", masked.join("&"))
    }

    /// Header list with credential-bearing values masked, safe to log.
    pub fn redacted_headers(&self) -> Vec<(String, String)> {
        self.headers
            .iter()
            .map(|(k, v)| {
                if SECRET_HEADERS.iter().any(|h| k.eq_ignore_ascii_case(h)) {
                    (k.clone(), "***".to_string())
                } else {
                    (k.clone(), v.clone())
                }
            })
            .collect()
    }
}

/// Resolve the API key from an explicit value or the named environment
/// variable. The error names the variable so the failure is actionable, and
/// never includes any part of a secret.
pub fn resolve_api_key(
    explicit: Option<&str>,
    env_var: &'static str,
    provider: &'static str,
) -> Result<String> {
    if let Some(key) = explicit {
        if !key.is_empty() {
            return Ok(key.to_string());
        }
    }
    match std::env::var(env_var) {
        Ok(v) if !v.is_empty() => Ok(v),
        _ => Err(LlmError::MissingApiKey { provider, env_var }),
    }
}

pub(crate) fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() { None } else { Some(s.to_string()) }
}
