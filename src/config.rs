//! Configuration management for the SQL console completion engine
//!
//! Handles loading and saving settings to ~/.config/sqlconsole/config.json.
//! Environment variables (optionally from a `.env` file) override file values.

use crate::completion::CompletionSources;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Overrides the API base URL
pub const ENV_API_URL: &str = "SQL_CONSOLE_API_URL";
/// Overrides the introspection request timeout, in seconds
pub const ENV_TIMEOUT_SECS: &str = "SQL_CONSOLE_TIMEOUT_SECS";

/// Completion settings
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct CompletionConfig {
    /// Replaces the built-in keyword list when set
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
    /// Replaces the built-in function list when set
    #[serde(default)]
    pub functions: Option<Vec<String>>,
}

impl CompletionConfig {
    /// Static sources with overrides applied
    pub fn sources(&self) -> CompletionSources {
        let defaults = CompletionSources::default();
        CompletionSources::new(
            self.keywords.clone().unwrap_or(defaults.keywords),
            self.functions.clone().unwrap_or(defaults.functions),
        )
    }
}

/// Application configuration
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Root of the console server API (introspection endpoints live under it)
    pub api_base_url: String,
    /// Timeout for each introspection request
    pub request_timeout_secs: u64,
    /// Schemas hidden from table-listing snapshots
    pub excluded_schemas: Vec<String>,
    /// LIMIT used by the generated SELECT when a table is picked
    pub default_row_limit: usize,
    pub completion: CompletionConfig,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000/api".to_string(),
            request_timeout_secs: 30,
            excluded_schemas: vec!["pg_catalog".to_string(), "information_schema".to_string()],
            default_row_limit: 100,
            completion: CompletionConfig::default(),
        }
    }
}

impl ConsoleConfig {
    /// Get the config file path (~/.config/sqlconsole/config.json)
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not find config directory")?
            .join("sqlconsole");

        Ok(config_dir.join("config.json"))
    }

    /// Load configuration from disk and the environment, falling back to defaults
    pub fn load() -> Self {
        let mut config = match Self::config_path().and_then(|path| Self::load_from(&path)) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "using default configuration");
                Self::default()
            }
        };

        // Missing .env is the normal case
        let _ = dotenvy::dotenv();
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Read a config file; a missing file yields defaults
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .context("Failed to read config file")?;

        let config: Self = serde_json::from_str(&contents)
            .context("Failed to parse config file")?;

        Ok(config)
    }

    /// Apply environment overrides through `lookup`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_API_URL).filter(|u| !u.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            match raw.trim().parse() {
                Ok(secs) => self.request_timeout_secs = secs,
                Err(_) => warn!(value = %raw, "ignoring invalid {}", ENV_TIMEOUT_SECS),
            }
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        // Create directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let contents = serde_json::to_string_pretty(self)
            .context("Failed to serialize config")?;

        fs::write(path, contents)
            .context("Failed to write config file")?;

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Editor text for a table picked in the browser
    pub fn select_query_for(&self, schema: &str, table: &str) -> String {
        crate::sql::select_query_for(schema, table, self.default_row_limit)
    }
}
