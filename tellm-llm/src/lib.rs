//! Single-shot LLM API clients for tellm.
//!
//! Pure request builders and response parsers behind one [`Provider`] trait;
//! the binary crate performs the actual HTTP round-trip.

mod anthropic;
mod error;
mod format;
mod gemini;
mod openai;
mod openai_compat;
mod provider;
mod schema;
mod types;

pub use anthropic::AnthropicProvider;
pub use error::{LlmError, Result};
pub use format::{FieldKind, FormatField, compile_format};
pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;
pub use openai_compat::OpenAiCompatProvider;
pub use provider::{KNOWN_PROVIDERS, Provider, by_name};
pub use types::{ApiRequest, Options, resolve_api_key};
