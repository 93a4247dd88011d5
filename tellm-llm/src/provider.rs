use crate::anthropic::AnthropicProvider;
use crate::error::{LlmError, Result};
use crate::gemini::GeminiProvider;
use crate::openai::OpenAiProvider;
use crate::openai_compat::OpenAiCompatProvider;
use crate::types::{ApiRequest, Options};

/// The capability set every backend implements.
///
/// All operations are pure request building and response parsing; the actual
/// HTTP round-trip is the caller's job, so new backends can be added without
/// touching the orchestration code.
pub trait Provider {
    fn name(&self) -> &'static str;

    /// Provider defaults (model, and where applicable max output tokens) used
    /// to fill in whatever the caller left blank.
    fn default_options(&self) -> Options;

    /// Build the provider-native request body. Must not mutate `opts`.
    fn build_payload(&self, opts: &Options) -> Result<serde_json::Value>;

    /// Build the wire-level request. `base_url` falls back to the provider
    /// default; the credential falls back to the provider's environment
    /// variable and its absence is a distinguishable `MissingApiKey` error.
    fn build_request(
        &self,
        payload: serde_json::Value,
        base_url: Option<&str>,
        api_key: Option<&str>,
    ) -> Result<ApiRequest>;

    /// Extract plain text from raw response bytes. A structurally valid but
    /// empty response is an empty string, not an error.
    fn parse_response(&self, body: &[u8]) -> Result<String>;
}

impl std::fmt::Debug for dyn Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider").field("name", &self.name()).finish()
    }
}

pub const KNOWN_PROVIDERS: [&str; 4] = ["openai", "anthropic", "gemini", "openai-compat"];

/// Look up a provider implementation by name or alias. The empty name selects
/// the default (OpenAI) backend.
pub fn by_name(name: &str) -> Result<Box<dyn Provider>> {
    match name {
        "openai" | "oa" | "default" | "" => Ok(Box::new(OpenAiProvider)),
        "anthropic" | "claude" | "anth" => Ok(Box::new(AnthropicProvider)),
        "gemini" | "google" | "gai" => Ok(Box::new(GeminiProvider)),
        "openai-compat" | "compat" | "chat" => Ok(Box::new(OpenAiCompatProvider)),
        other => Err(LlmError::UnknownProvider {
            name: other.to_string(),
            known: KNOWN_PROVIDERS.join(", "),
        }),
    }
}

pub(crate) fn resolve_base_url<'a>(base_url: Option<&'a str>, default: &'a str) -> &'a str {
    base_url
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default)
        .trim_end_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_resolves_names_and_aliases() {
        let cases = [
            ("openai", "openai"),
            ("oa", "openai"),
            ("default", "openai"),
            ("", "openai"),
            ("anthropic", "anthropic"),
            ("claude", "anthropic"),
            ("anth", "anthropic"),
            ("gemini", "gemini"),
            ("google", "gemini"),
            ("gai", "gemini"),
            ("openai-compat", "openai-compat"),
            ("compat", "openai-compat"),
            ("chat", "openai-compat"),
        ];
        for (alias, want) in cases {
            let provider = by_name(alias).expect("known alias");
            assert_eq!(provider.name(), want, "alias {alias:?}");
        }
    }

    #[test]
    fn lookup_is_case_sensitive() {
        assert!(by_name("OpenAI").is_err());
        assert!(by_name("Claude").is_err());
    }

    #[test]
    fn unknown_provider_enumerates_known_names() {
        let err = by_name("mistral").expect_err("unknown name");
        let msg = err.to_string();
        assert!(msg.contains("mistral"));
        for name in KNOWN_PROVIDERS {
            assert!(msg.contains(name), "missing {name} in {msg}");
        }
    }

    #[test]
    fn base_url_falls_back_and_trims_trailing_slash() {
        assert_eq!(
            resolve_base_url(None, "https://api.openai.com/v1"),
            "https://api.openai.com/v1"
        );
        assert_eq!(
            resolve_base_url(Some(""), "https://api.openai.com/v1"),
            "https://api.openai.com/v1"
        );
        assert_eq!(
            resolve_base_url(Some("https://proxy.local/v1/"), "unused"),
            "https://proxy.local/v1"
        );
    }
}
