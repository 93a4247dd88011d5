//! Single-shot orchestration: merge options, build the provider request,
//! perform the one HTTP round-trip, post-process, print.

use crate::{Cli, config, output};
use std::io::IsTerminal;
use tellm_llm::{ApiRequest, LlmError, Options, compile_format};
use tokio::io::AsyncReadExt;

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let Some(message) = read_message(cli.message.as_deref()).await? else {
        // No argument and nothing piped in: behave like `tellm -h`.
        use clap::CommandFactory;
        let mut cmd = Cli::command();
        cmd.print_help()?;
        return Ok(());
    };

    let profile = config::load(cli.config.clone(), cli.profile.as_deref()).await?;

    let provider_name = pick(cli.provider, profile.provider, String::new());
    let provider = tellm_llm::by_name(&provider_name)?;
    let defaults = provider.default_options();

    let format = pick(cli.format, profile.format, String::new());
    let opts = Options {
        model: pick(cli.model, profile.model, defaults.model),
        instructions: pick(cli.instructions, profile.instructions, defaults.instructions),
        message,
        verbosity: pick(cli.verbosity, profile.verbosity, defaults.verbosity),
        reasoning_effort: pick(
            cli.reasoning_effort,
            profile.reasoning_effort,
            defaults.reasoning_effort,
        ),
        max_tokens: cli
            .max_tokens
            .or(profile.max_tokens)
            .unwrap_or(defaults.max_tokens),
        fields: compile_format(&format)?,
    };

    let base_url = cli.base_url.or(profile.base_url);
    let only = cli
        .only
        .or(profile.only)
        .filter(|k| !k.trim().is_empty());
    let error_key = cli
        .error_key
        .or(profile.error_key)
        .filter(|k| !k.trim().is_empty());

    let payload = provider.build_payload(&opts)?;
    let request = provider.build_request(payload, base_url.as_deref(), None)?;

    tracing::debug!(
        provider = provider.name(),
        model = %opts.model,
        url = %request.redacted_url(),
        headers = ?request.redacted_headers(),
        "sending request"
    );

    let raw = execute(&request).await?;
    let mut text = provider.parse_response(&raw)?;

    // Application-level failure signal inside an otherwise successful reply.
    if let Some(key) = &error_key {
        if let Some(message) = output::error_field(&text, key) {
            return Err(anyhow::anyhow!("model reported an error: {message}"));
        }
    }
    if let Some(key) = &only {
        text = output::extract_key(&text, key)?;
    }

    if !text.ends_with('\n') {
        text.push('\n');
    }
    print!("{text}");
    Ok(())
}

/// Resolve the message: an explicit argument wins, `-` forces stdin, and with
/// no argument piped input is read when present. `None` means "show help".
async fn read_message(arg: Option<&str>) -> anyhow::Result<Option<String>> {
    match arg {
        Some("-") => Ok(Some(read_stdin().await?)),
        Some(message) => Ok(Some(message.to_string())),
        None if std::io::stdin().is_terminal() => Ok(None),
        None => Ok(Some(read_stdin().await?)),
    }
}

async fn read_stdin() -> anyhow::Result<String> {
    let mut buf = String::new();
    tokio::io::stdin()
        .read_to_string(&mut buf)
        .await
        .map_err(|e| anyhow::anyhow!("failed to read from stdin: {e}"))?;
    Ok(buf)
}

fn pick(flag: Option<String>, profile: Option<String>, default: String) -> String {
    flag.filter(|s| !s.is_empty())
        .or(profile.filter(|s| !s.is_empty()))
        .unwrap_or(default)
}

#[tracing::instrument(level = "debug", skip_all, fields(url = %request.redacted_url()))]
async fn execute(request: &ApiRequest) -> anyhow::Result<Vec<u8>> {
    let client = http_client();

    let mut req = client.request(request.method.clone(), &request.url);
    for (name, value) in &request.headers {
        req = req.header(name.as_str(), value.as_str());
    }
    let response = req
        .body(request.body.clone())
        .send()
        .await
        .map_err(LlmError::from)?;

    let status = response.status();
    let body = response.bytes().await.map_err(LlmError::from)?;
    if !status.is_success() {
        return Err(LlmError::Status {
            status: status.as_u16(),
            body: String::from_utf8_lossy(&body).into_owned(),
        }
        .into());
    }
    Ok(body.to_vec())
}

fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(60))
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(%e, "reqwest client build failed; falling back to default client");
            reqwest::Client::new()
        })
}
