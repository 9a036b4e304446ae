//! Configuration management for TaskMaster.
//!
//! Loads configuration from ${TASKMASTER_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default backend base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Environment variable overriding the backend base URL.
pub const API_URL_ENV: &str = "TASKMASTER_API_URL";

/// Returns the default config template with comments.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

pub mod paths {
    //! Path resolution for TaskMaster configuration and session data.
    //!
    //! TASKMASTER_HOME resolution order:
    //! 1. TASKMASTER_HOME environment variable (if set)
    //! 2. ~/.config/taskmaster (default)

    use std::path::PathBuf;

    /// Returns the TaskMaster home directory.
    pub fn taskmaster_home() -> PathBuf {
        if let Ok(home) = std::env::var("TASKMASTER_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".taskmaster"),
            |h| h.join(".config").join("taskmaster"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        taskmaster_home().join("config.toml")
    }

    /// Returns the path to the persisted session.
    pub fn session_path() -> PathBuf {
        taskmaster_home().join("session.json")
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend base URL (e.g. `http://localhost:8080`).
    pub api_url: Option<String>,
}

impl Config {
    /// Loads configuration from the default config path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Writes the default config template to `path`.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        fs::write(path, default_config_template())
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }

    /// Resolves the backend base URL.
    ///
    /// Resolution order:
    /// 1. `cli_override` (from `--api-url`)
    /// 2. `TASKMASTER_API_URL` env var (if set and non-empty)
    /// 3. `api_url` from the config file
    /// 4. Default: `http://localhost:8080`
    ///
    /// # Errors
    /// Returns an error if the winning candidate is not a valid URL.
    pub fn resolve_api_url(&self, cli_override: Option<&str>) -> Result<String> {
        let env_url = std::env::var(API_URL_ENV).ok();
        resolve_api_url_from(cli_override, env_url.as_deref(), self.api_url.as_deref())
    }
}

fn resolve_api_url_from(
    cli_override: Option<&str>,
    env_url: Option<&str>,
    config_url: Option<&str>,
) -> Result<String> {
    let candidate = [cli_override, env_url, config_url]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|url| !url.is_empty());

    match candidate {
        Some(url) => {
            validate_url(url)?;
            Ok(url.trim_end_matches('/').to_string())
        }
        None => Ok(DEFAULT_API_URL.to_string()),
    }
}

/// Validates that a URL is well-formed.
fn validate_url(url: &str) -> Result<()> {
    url::Url::parse(url).with_context(|| format!("Invalid TaskMaster API URL: {url}"))?;
    Ok(())
}
