use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::error::CallboardError;

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

impl From<ConfigLoadError> for CallboardError {
    fn from(err: ConfigLoadError) -> Self {
        match err {
            ConfigLoadError::Config(e) => e.into(),
            ConfigLoadError::MissingRequired(key) => CallboardError::InvalidConfigValue {
                key,
                message: "Missing required value".to_string(),
            },
            ConfigLoadError::InvalidValue { key, message } => {
                CallboardError::InvalidConfigValue { key, message }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CallboardConfig {
    #[serde(default)]
    pub accounts: AccountsConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub webhooks: WebhooksConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountsConfig {
    #[serde(default = "default_accounts_path")]
    pub path: PathBuf,

    /// Used when the accounts file does not carry its own default.
    #[serde(default = "default_stale_after_days")]
    pub default_stale_after_days: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_monitor_base_url")]
    pub monitor_base_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_limit")]
    pub default_limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhooksConfig {
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json_format: bool,
}

fn default_accounts_path() -> PathBuf {
    PathBuf::from("accounts.json")
}

fn default_stale_after_days() -> u32 {
    30
}

fn default_api_base_url() -> String {
    "https://api.twilio.com".to_string()
}

fn default_monitor_base_url() -> String {
    "https://monitor.twilio.com".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_limit() -> u32 {
    50
}

fn default_probe_timeout() -> u64 {
    5
}

fn default_user_agent() -> String {
    "TwilioProxy/1.1".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            path: default_accounts_path(),
            default_stale_after_days: default_stale_after_days(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            monitor_base_url: default_monitor_base_url(),
            request_timeout_secs: default_request_timeout(),
            default_limit: default_limit(),
        }
    }
}

impl Default for WebhooksConfig {
    fn default() -> Self {
        Self {
            probe_timeout_secs: default_probe_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

impl CallboardConfig {
    pub fn load() -> Result<Self, ConfigLoadError> {
        Self::load_from_paths(get_config_paths())
    }

    pub fn load_from_paths(paths: Vec<PathBuf>) -> Result<Self, ConfigLoadError> {
        load_dotenv_files();

        let mut builder = ConfigBuilder::builder();

        for path in paths {
            if path.exists() {
                builder = builder.add_source(File::from(path).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("CALLBOARD")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let mut callboard_config: CallboardConfig = config.try_deserialize()?;

        // Flat aliases. Neither collides with a section name; RUST_LOG is
        // read by the subscriber's EnvFilter directly.
        if let Ok(path) = std::env::var("CALLBOARD_ACCOUNTS_PATH") {
            callboard_config.accounts.path = PathBuf::from(path);
        }

        if let Ok(level) = std::env::var("CALLBOARD_LOG_LEVEL") {
            callboard_config.logging.level = level;
        }

        callboard_config.validate()?;

        Ok(callboard_config)
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.accounts.path.as_os_str().is_empty() {
            return Err(ConfigLoadError::MissingRequired("accounts.path".to_string()));
        }

        for (key, url) in [
            ("upstream.api_base_url", &self.upstream.api_base_url),
            ("upstream.monitor_base_url", &self.upstream.monitor_base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigLoadError::InvalidValue {
                    key: key.to_string(),
                    message: "Must start with http:// or https://".to_string(),
                });
            }
        }

        if self.upstream.request_timeout_secs == 0 {
            return Err(ConfigLoadError::InvalidValue {
                key: "upstream.request_timeout_secs".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        if self.upstream.default_limit == 0 {
            return Err(ConfigLoadError::InvalidValue {
                key: "upstream.default_limit".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        if self.webhooks.probe_timeout_secs == 0 {
            return Err(ConfigLoadError::InvalidValue {
                key: "webhooks.probe_timeout_secs".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        let level_lower = self.logging.level.to_lowercase();
        if !valid_levels.contains(&level_lower.as_str()) && !level_lower.contains('=') {
            return Err(ConfigLoadError::InvalidValue {
                key: "logging.level".to_string(),
                message: format!(
                    "Invalid log level '{}'. Must be one of: {:?}",
                    self.logging.level, valid_levels
                ),
            });
        }

        Ok(())
    }
}

fn get_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join("config").join("default.toml"));
        paths.push(cwd.join("config").join("local.toml"));
        paths.push(cwd.join("callboard.toml"));
    }

    if let Some(config_dir) = get_config_dir() {
        paths.push(config_dir.join("config.toml"));
    }

    paths
}

fn load_dotenv_files() {
    for path in get_dotenv_paths() {
        if path.exists() {
            let _ = dotenvy::from_path(&path);
        }
    }
}

fn get_dotenv_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".env"));
        paths.push(cwd.join(".env.local"));
    }

    if let Some(config_dir) = get_config_dir() {
        paths.push(config_dir.join(".env"));
    }

    paths
}

pub fn get_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("callboard"))
}
