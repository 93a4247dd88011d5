//! Profile configuration for tellm.
//!
//! Profiles live in `~/.config/tellm/config.toml`:
//!
//! ```toml
//! default_profile = "fast"
//!
//! [profiles.fast]
//! provider = "openai"
//! model = "gpt-5-nano"
//! format = "message:string,error:string"
//! error_key = "error"
//! ```

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// One named bundle of defaults, mirroring the CLI flag set. Every field is
/// optional; explicit flags always win over profile values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub verbosity: Option<String>,
    #[serde(default)]
    pub reasoning_effort: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub only: Option<String>,
    #[serde(default)]
    pub error_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    default_profile: Option<String>,
    #[serde(default)]
    profiles: HashMap<String, Profile>,
}

/// Load the selected profile. An explicit name wins over the file's
/// `default_profile`. A missing file, empty selection, or unknown profile
/// name all resolve to the empty profile rather than an error.
pub async fn load(path: Option<PathBuf>, profile_name: Option<&str>) -> anyhow::Result<Profile> {
    let path = path.unwrap_or_else(default_config_path);

    let contents = match tokio::fs::read_to_string(&path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Profile::default()),
        Err(e) => return Err(anyhow::anyhow!("read config {}: {e}", path.display())),
    };

    let file: ConfigFile = toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("parse config {}: {e}", path.display()))?;

    select_profile(file, profile_name)
}

fn select_profile(file: ConfigFile, profile_name: Option<&str>) -> anyhow::Result<Profile> {
    let name = profile_name
        .map(str::to_string)
        .or(file.default_profile)
        .filter(|n| !n.is_empty());
    let Some(name) = name else {
        return Ok(Profile::default());
    };
    Ok(file.profiles.get(&name).cloned().unwrap_or_default())
}

pub fn default_config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    Path::new(&home)
        .join(".config")
        .join("tellm")
        .join("config.toml")
}

const CONFIG_TEMPLATE: &str = "default_profile = \"\"\n\n[profiles]\n";

/// Open the config file in `$EDITOR`, creating a minimal template first if
/// the file does not exist yet.
pub async fn edit(path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = path.unwrap_or_else(default_config_path);

    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| anyhow::anyhow!("create config directory {}: {e}", dir.display()))?;
    }
    if !tokio::fs::try_exists(&path).await? {
        tokio::fs::write(&path, CONFIG_TEMPLATE)
            .await
            .map_err(|e| anyhow::anyhow!("create config {}: {e}", path.display()))?;
    }

    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
    let status = tokio::process::Command::new(&editor)
        .arg(&path)
        .status()
        .await
        .map_err(|e| anyhow::anyhow!("failed to open editor {editor:?}: {e}"))?;
    if !status.success() {
        return Err(anyhow::anyhow!("editor {editor:?} exited with {status}"));
    }
    Ok(())
}
