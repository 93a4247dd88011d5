//! tellm main binary: send a single prompt to an LLM API and print the
//! extracted answer.

mod config;
mod output;
mod run;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "tellm",
    version,
    about = "Send a single prompt to an LLM API",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Message to send; use "-" to force reading from stdin.
    pub message: Option<String>,

    /// Backend provider: openai, anthropic, gemini, or openai-compat.
    #[arg(long)]
    pub provider: Option<String>,

    /// Model name (defaults to the provider's default model).
    #[arg(long)]
    pub model: Option<String>,

    /// Instructions to guide the model.
    #[arg(long)]
    pub instructions: Option<String>,

    /// Output format shorthand, e.g. "name:string,age:integer,tags:string[]".
    #[arg(long)]
    pub format: Option<String>,

    /// Base URL override for the provider API.
    #[arg(long = "base-url")]
    pub base_url: Option<String>,

    /// Maximum output tokens (unset means the provider default).
    #[arg(long = "max-tokens")]
    pub max_tokens: Option<u32>,

    /// Verbosity (low/medium/high), where the provider supports it.
    #[arg(long)]
    pub verbosity: Option<String>,

    /// Reasoning effort (minimal/low/medium/high), where supported.
    #[arg(long = "reasoning-effort")]
    pub reasoning_effort: Option<String>,

    /// Print only this top-level key from structured JSON output.
    #[arg(long)]
    pub only: Option<String>,

    /// Fail when structured output carries a non-empty string at this key.
    #[arg(long = "error-key")]
    pub error_key: Option<String>,

    /// Path to the config file (defaults to ~/.config/tellm/config.toml).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Profile name to load from the config file.
    #[arg(long)]
    pub profile: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Manage tellm profiles.
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
}

#[derive(Debug, Subcommand)]
enum ProfileAction {
    /// Open the profiles config in $EDITOR.
    Edit {
        /// Path to the config file (defaults to ~/.config/tellm/config.toml).
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing()?;

    let mut cli = Cli::parse();
    match cli.command.take() {
        Some(Command::Profile {
            action: ProfileAction::Edit { config },
        }) => config::edit(config).await,
        None => run::run(cli).await,
    }
}

fn init_tracing() -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let log_format = std::env::var("TELLM_LOG_FORMAT")
        .unwrap_or_else(|_| "compact".to_string())
        .to_ascii_lowercase();

    // Logs go to stderr; stdout carries only the model's answer.
    match log_format.as_str() {
        "compact" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .compact()
                .init();
        }
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .json()
                .init();
        }
        "pretty" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .pretty()
                .init();
        }
        other => {
            return Err(anyhow::anyhow!(
                "unsupported TELLM_LOG_FORMAT={other:?}; expected one of: compact, json, pretty"
            ));
        }
    }
    Ok(())
}
