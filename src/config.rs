//! Configuration management for tasksync
//!
//! This module handles loading, parsing, and validation of configuration files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Valid range for `calendar.import_window_days`.
pub const IMPORT_WINDOW_MIN_DAYS: u32 = 1;
pub const IMPORT_WINDOW_MAX_DAYS: u32 = 365;

const REMOTE_BACKENDS: [&str; 2] = ["fake", "rest"];
const CALENDAR_PROVIDERS: [&str; 3] = ["fake", "memory", "google"];
const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub remote: RemoteConfig,
    pub calendar: CalendarConfig,
    pub logging: LoggingConfig,
}

/// Local storage configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file. Unset means an in-memory database.
    pub database_path: Option<String>,
}

/// Remote task store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Store type: "fake" or "rest"
    pub backend: String,
    /// Base URL of the REST endpoint
    pub base_url: Option<String>,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Environment variable holding the session access token
    pub access_token_env: String,
}

/// Calendar import/export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    /// Calendar source: "fake", "memory" or "google"
    pub provider: String,
    /// Number of days ahead fetched by an import
    pub import_window_days: u32,
    /// Name of the list imported events land in
    pub imported_list_name: String,
    /// Export tasks to the calendar after every successful sync
    pub export_after_sync: bool,
    /// Environment variable holding the Google access token
    pub access_token_env: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Enable logging
    pub enabled: bool,
    /// Minimum level: error, warn, info, debug or trace
    pub level: String,
    /// Log file path. Unset means the default location in the data directory.
    pub file: Option<String>,
    /// Also log to stderr
    pub stderr: bool,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            backend: "fake".to_string(),
            base_url: None,
            api_key_env: "TASKSYNC_API_KEY".to_string(),
            access_token_env: "TASKSYNC_ACCESS_TOKEN".to_string(),
        }
    }
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            provider: "fake".to_string(),
            import_window_days: 30,
            imported_list_name: "Imported".to_string(),
            export_after_sync: false,
            access_token_env: "GOOGLE_ACCESS_TOKEN".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            level: "info".to_string(),
            file: None,
            stderr: false,
        }
    }
}

impl StorageConfig {
    pub fn database_path(&self) -> Option<PathBuf> {
        self.database_path.as_ref().map(PathBuf::from)
    }
}

impl RemoteConfig {
    /// API key read from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        read_env(&self.api_key_env)
    }

    /// Session token read from the configured environment variable.
    pub fn access_token(&self) -> Option<String> {
        read_env(&self.access_token_env)
    }
}

impl CalendarConfig {
    pub fn access_token(&self) -> Option<String> {
        read_env(&self.access_token_env)
    }
}

impl LoggingConfig {
    pub fn level_filter(&self) -> log::LevelFilter {
        match self.level.to_ascii_lowercase().as_str() {
            "error" => log::LevelFilter::Error,
            "warn" => log::LevelFilter::Warn,
            "debug" => log::LevelFilter::Debug,
            "trace" => log::LevelFilter::Trace,
            _ => log::LevelFilter::Info,
        }
    }
}

fn read_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

impl Config {
    /// Load configuration from file or return defaults
    pub fn load() -> Result<Self> {
        let config_path = Self::find_config_file()?;

        if let Some(path) = config_path {
            Self::load_from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Find configuration file in order of precedence
    fn find_config_file() -> Result<Option<PathBuf>> {
        // 1. Check current directory
        let current_dir_config = PathBuf::from("tasksync.toml");
        if current_dir_config.exists() {
            return Ok(Some(current_dir_config));
        }

        // 2. Check XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("tasksync").join("config.toml");
            if xdg_config.exists() {
                return Ok(Some(xdg_config));
            }
        }

        Ok(None)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !REMOTE_BACKENDS.contains(&self.remote.backend.as_str()) {
            anyhow::bail!(
                "Unsupported remote backend '{}'. Available backends: {}",
                self.remote.backend,
                REMOTE_BACKENDS.join(", ")
            );
        }

        if self.remote.backend == "rest" {
            match &self.remote.base_url {
                Some(url) if url.starts_with("http://") || url.starts_with("https://") => {}
                Some(url) => anyhow::bail!("remote.base_url must be an http(s) URL, got '{}'", url),
                None => anyhow::bail!("remote.base_url is required for the rest backend"),
            }
            if self.remote.api_key_env.is_empty() {
                anyhow::bail!("remote.api_key_env cannot be empty");
            }
        }

        if !CALENDAR_PROVIDERS.contains(&self.calendar.provider.as_str()) {
            anyhow::bail!(
                "Unsupported calendar provider '{}'. Available providers: {}",
                self.calendar.provider,
                CALENDAR_PROVIDERS.join(", ")
            );
        }

        if self.calendar.import_window_days < IMPORT_WINDOW_MIN_DAYS
            || self.calendar.import_window_days > IMPORT_WINDOW_MAX_DAYS
        {
            anyhow::bail!(
                "import_window_days must be between {} and {}, got {}",
                IMPORT_WINDOW_MIN_DAYS,
                IMPORT_WINDOW_MAX_DAYS,
                self.calendar.import_window_days
            );
        }

        if self.calendar.imported_list_name.trim().is_empty() {
            anyhow::bail!("imported_list_name cannot be empty");
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            anyhow::bail!("Invalid logging level '{}'", self.logging.level);
        }

        Ok(())
    }

    /// Generate default configuration file
    pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let config = Self::default();
        let toml_content = toml::to_string_pretty(&config).context("Failed to serialize default config")?;

        // Add header comment
        let header = format!(
            "# tasksync Configuration File\n# Generated on {}\n\n",
            chrono::Local::now().format("%Y-%m-%d")
        );

        let full_content = header + &toml_content;

        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        std::fs::write(&path, full_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get the XDG config directory path
    pub fn get_xdg_config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
            .map(|dir| dir.join("tasksync"))
    }

    /// Get the default config file path
    pub fn get_default_config_path() -> Result<PathBuf> {
        Ok(Self::get_xdg_config_dir()?.join("config.toml"))
    }
}
