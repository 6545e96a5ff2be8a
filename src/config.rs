use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::sync::{DataKey, Module};

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    fn default_value(value: T) -> Self {
        Self::new(value, ConfigSource::Default)
    }
}

pub const DEFAULT_LOG_FILTER: &str = "harmony=info";
pub const DEFAULT_TABLE: &str = "harmony_data";
pub const DEFAULT_SCHEMA: &str = "public";
pub const DEFAULT_CHANNEL: &str = "harmony-all-changes";

/// Hosted backend settings.
///
/// `url` and `key` only seed the first connection; credentials saved in
/// the local store win once present.
#[derive(Debug, Clone, Serialize)]
pub struct RemoteConfig {
    pub url: ConfigValue<Option<String>>,
    #[serde(skip_serializing)]
    pub key: ConfigValue<Option<String>>,
    pub table: ConfigValue<String>,
    pub schema: ConfigValue<String>,
    pub channel: ConfigValue<String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: ConfigValue::default_value(None),
            key: ConfigValue::default_value(None),
            table: ConfigValue::default_value(DEFAULT_TABLE.to_string()),
            schema: ConfigValue::default_value(DEFAULT_SCHEMA.to_string()),
            channel: ConfigValue::default_value(DEFAULT_CHANNEL.to_string()),
        }
    }
}

impl RemoteConfig {
    /// Returns true if both url and key are set and non-blank
    pub fn is_configured(&self) -> bool {
        self.credentials().is_some()
    }

    /// The `(url, key)` pair, if both are present.
    pub fn credentials(&self) -> Option<(String, String)> {
        let url = self.url.value.as_deref().map(str::trim).unwrap_or("");
        let key = self.key.value.as_deref().map(str::trim).unwrap_or("");
        if url.is_empty() || key.is_empty() {
            None
        } else {
            Some((url.to_string(), key.to_string()))
        }
    }
}

/// Optional feature modules. Core data is always enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModulesConfig {
    /// Wishlist and weekly tasks
    pub planner: bool,
    /// Household finance and stock holdings
    pub finance: bool,
}

impl ModulesConfig {
    /// Only core data.
    pub fn core_only() -> Self {
        Self {
            planner: false,
            finance: false,
        }
    }

    pub fn enables(&self, key: DataKey) -> bool {
        match key.module() {
            Module::Core => true,
            Module::Planner => self.planner,
            Module::Finance => self.finance,
        }
    }

    /// Enabled keys in load order.
    pub fn enabled_keys(&self) -> impl Iterator<Item = DataKey> + '_ {
        DataKey::ALL.into_iter().filter(move |key| self.enables(*key))
    }
}

impl Default for ModulesConfig {
    fn default() -> Self {
        Self {
            planner: true,
            finance: true,
        }
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Directory holding one JSON file per data key
    pub data_dir: ConfigValue<PathBuf>,
    /// Default tracing filter when RUST_LOG is unset
    pub log_filter: ConfigValue<String>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
    pub remote: RemoteConfig,
    pub modules: ModulesConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: ConfigValue::default_value(Self::default_data_dir()),
            log_filter: ConfigValue::default_value(DEFAULT_LOG_FILTER.to_string()),
            config_file: None,
            remote: RemoteConfig::default(),
            modules: ModulesConfig::default(),
        }
    }
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    data_dir: Option<PathBuf>,
    log_filter: Option<String>,
    remote: Option<RemoteFile>,
    modules: Option<ModulesConfig>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RemoteFile {
    url: Option<String>,
    key: Option<String>,
    table: Option<String>,
    schema: Option<String>,
    channel: Option<String>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        Self::load_with(config_path, |name| std::env::var(name).ok())
    }

    fn load_with<F>(config_path: Option<PathBuf>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        // Try to load from config file
        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config.config_file = Some(path.clone());

            if let Some(data_dir) = file_config.data_dir {
                // Resolve relative paths against config file's directory
                let resolved = if data_dir.is_relative() {
                    path.parent().map(|p| p.join(&data_dir)).unwrap_or(data_dir)
                } else {
                    data_dir
                };
                config.data_dir = ConfigValue::new(resolved, ConfigSource::File);
            }
            if let Some(filter) = file_config.log_filter {
                config.log_filter = ConfigValue::new(filter, ConfigSource::File);
            }
            if let Some(remote) = file_config.remote {
                let target = &mut config.remote;
                if let Some(url) = remote.url {
                    target.url = ConfigValue::new(Some(url), ConfigSource::File);
                }
                if let Some(key) = remote.key {
                    target.key = ConfigValue::new(Some(key), ConfigSource::File);
                }
                if let Some(table) = remote.table {
                    target.table = ConfigValue::new(table, ConfigSource::File);
                }
                if let Some(schema) = remote.schema {
                    target.schema = ConfigValue::new(schema, ConfigSource::File);
                }
                if let Some(channel) = remote.channel {
                    target.channel = ConfigValue::new(channel, ConfigSource::File);
                }
            }
            if let Some(modules) = file_config.modules {
                config.modules = modules;
            }
        }

        // Apply environment variable overrides
        if let Some(dir) = env("HARMONY_DATA_DIR") {
            config.data_dir = ConfigValue::new(PathBuf::from(dir), ConfigSource::Environment);
        }
        if let Some(filter) = env("HARMONY_LOG") {
            config.log_filter = ConfigValue::new(filter, ConfigSource::Environment);
        }
        if let Some(url) = env("HARMONY_REMOTE_URL") {
            config.remote.url = ConfigValue::new(Some(url), ConfigSource::Environment);
        }
        if let Some(key) = env("HARMONY_REMOTE_KEY") {
            config.remote.key = ConfigValue::new(Some(key), ConfigSource::Environment);
        }

        Ok(config)
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/harmony/
    /// - macOS: ~/Library/Application Support/harmony/
    /// - Windows: %APPDATA%/harmony/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("harmony")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/harmony/
    /// - macOS: ~/Library/Application Support/harmony/
    /// - Windows: %APPDATA%/harmony/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("harmony")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::ReadError(_, e) => Some(e),
            ConfigError::ParseError(_, e) => Some(e),
        }
    }
}
