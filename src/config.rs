//! Configuration management for vibe-ide
//!
//! Stores settings in ~/.config/vibe-ide/config.json

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Environment variable holding the Gemini key; also the name shown to users
pub const CREDENTIAL_ENV: &str = "GEMINI_API_KEY";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

const DEFAULT_EXPLAIN_DEBOUNCE_MS: u64 = 1500;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Plaintext fallback; the environment variable wins when both are set
    pub gemini_api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    /// Idle time before explanations are requested
    #[serde(default = "default_explain_debounce_ms")]
    pub explain_debounce_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_explain_debounce_ms() -> u64 {
    DEFAULT_EXPLAIN_DEBOUNCE_MS
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            model: default_model(),
            explain_debounce_ms: DEFAULT_EXPLAIN_DEBOUNCE_MS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

/// Resolved runtime settings for the assistant pipelines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantSettings {
    pub api_key: Option<String>,
    pub credential_name: String,
    pub model: String,
    pub explain_debounce: Duration,
    pub request_timeout: Duration,
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Config::default().resolve_settings(None)
    }
}

impl Config {
    /// Get the config directory path
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("vibe-ide"))
    }

    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("config.json"))
    }

    /// Load config from disk, or return default
    pub fn load() -> Self {
        Self::config_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    /// Load from an explicit path. Missing files give defaults; corrupt files
    /// are moved aside so the next save does not destroy them.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str(&content) {
            Ok(config) => config,
            Err(err) => {
                preserve_corrupt_config(path, &content);
                warn!(
                    path = %path.display(),
                    error = %err,
                    "config file was corrupted; a backup was saved and defaults were loaded"
                );
                Self::default()
            }
        }
    }

    /// Save config to disk
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().context("Could not determine config directory")?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).context("Failed to create config directory")?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Err(e) = fs::set_permissions(dir, fs::Permissions::from_mode(0o700)) {
                    warn!(error = %e, "failed to set config directory permissions");
                }
            }
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;

        #[cfg(unix)]
        {
            write_config_atomic(path, &content).context("Failed to write config")?;
        }

        #[cfg(not(unix))]
        {
            fs::write(path, content).context("Failed to write config")?;
        }

        Ok(())
    }

    fn pick_api_key(&self, env_value: Option<String>) -> Option<String> {
        env_value
            .or_else(|| self.gemini_api_key.clone())
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }

    /// Resolve runtime settings; `GEMINI_API_KEY` wins over the file value
    pub fn assistant_settings(&self) -> AssistantSettings {
        self.resolve_settings(std::env::var(CREDENTIAL_ENV).ok())
    }

    fn resolve_settings(&self, env_key: Option<String>) -> AssistantSettings {
        let model = match self.model.trim() {
            "" => DEFAULT_MODEL.to_string(),
            model => model.to_string(),
        };
        AssistantSettings {
            api_key: self.pick_api_key(env_key),
            credential_name: CREDENTIAL_ENV.to_string(),
            model,
            explain_debounce: Duration::from_millis(self.explain_debounce_ms),
            request_timeout: Duration::from_secs(self.request_timeout_secs.max(1)),
        }
    }
}

fn preserve_corrupt_config(path: &Path, content: &str) {
    let corrupt_path = path.with_extension("json.corrupt");
    if fs::rename(path, &corrupt_path).is_err() {
        let _ = fs::write(&corrupt_path, content);
    }
}

#[cfg(unix)]
fn write_config_atomic(path: &Path, content: &str) -> std::io::Result<()> {
    use std::fs::OpenOptions;
    use std::os::unix::fs::PermissionsExt;

    let tmp_path = path.with_extension("tmp");
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&tmp_path)?;

    if let Err(e) = file.set_permissions(fs::Permissions::from_mode(0o600)) {
        warn!(error = %e, "failed to set temp config file permissions");
    }

    file.write_all(content.as_bytes())?;

    if let Err(err) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err);
    }
    Ok(())
}
