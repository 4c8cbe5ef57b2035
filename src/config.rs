use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::model_gateway::{ModelSettings, DEFAULT_MAX_TOKENS, DEFAULT_MODEL};

pub const DEFAULT_HOST: &str = "192.168.88.15";
pub const DEFAULT_PORT: u16 = 11000;
pub const DEFAULT_CACHE_TTL_HOURS: u64 = 24 * 7;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("HOME environment variable not set")]
    NoHome,

    #[error("Config file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Cannot write config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// `~/.config/blue_cli`
pub fn config_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config").join("blue_cli"))
}

/// Configuration defaults that can be saved to a file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_ttl_hours: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_cache: Option<bool>,
}

impl Config {
    /// Create a new empty config
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in values used when neither the saved config nor the command line sets one.
    pub fn builtin() -> Self {
        Config {
            host: Some(DEFAULT_HOST.to_string()),
            port: Some(DEFAULT_PORT),
            model: None,
            base_url: None,
            max_tokens: Some(DEFAULT_MAX_TOKENS),
            cache_ttl_hours: Some(DEFAULT_CACHE_TTL_HOURS),
            no_cache: Some(false),
        }
    }

    /// Get the config file path (~/.config/blue_cli/config.toml)
    pub fn get_config_path() -> Result<PathBuf, ConfigError> {
        config_dir()
            .map(|dir| dir.join("config.toml"))
            .ok_or(ConfigError::NoHome)
    }

    /// Load config from the default location
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::get_config_path()?)
    }

    /// Load config from `path`; a missing file is an empty config.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Config::new());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::get_config_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let toml_string = toml::to_string_pretty(self)?;
        fs::write(path, toml_string)?;

        Ok(())
    }

    /// Merge this config with another, preferring values from other
    pub fn merge(&mut self, other: &Config) {
        if other.host.is_some() {
            self.host = other.host.clone();
        }
        if other.port.is_some() {
            self.port = other.port;
        }
        if other.model.is_some() {
            self.model = other.model.clone();
        }
        if other.base_url.is_some() {
            self.base_url = other.base_url.clone();
        }
        if other.max_tokens.is_some() {
            self.max_tokens = other.max_tokens;
        }
        if other.cache_ttl_hours.is_some() {
            self.cache_ttl_hours = other.cache_ttl_hours;
        }
        if other.no_cache.is_some() {
            self.no_cache = other.no_cache;
        }
    }

    pub fn host(&self) -> &str {
        self.host.as_deref().unwrap_or(DEFAULT_HOST)
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    /// Lifetime of cached catalog searches.
    pub fn cache_ttl(&self) -> Duration {
        let hours = self.cache_ttl_hours.unwrap_or(DEFAULT_CACHE_TTL_HOURS);
        Duration::from_secs(hours.saturating_mul(60 * 60))
    }

    /// Model settings; values set here win over the key file.
    pub fn model_settings(&self, keys: &KeysFile) -> ModelSettings {
        ModelSettings {
            model: self
                .model
                .clone()
                .or_else(|| keys.model.clone())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: self.base_url.clone().or_else(|| keys.base_url.clone()),
            max_tokens: self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        }
    }

    /// Print the config in a human-readable format
    pub fn print(&self, title: &str) {
        println!("{}:", title);

        if let Some(host) = &self.host {
            println!("  Player host:        {}", host);
        }
        if let Some(port) = self.port {
            println!("  Player port:        {}", port);
        }
        if let Some(model) = &self.model {
            println!("  Model:              {}", model);
        }
        if let Some(base_url) = &self.base_url {
            println!("  Model endpoint:     {}", base_url);
        }
        if let Some(max_tokens) = self.max_tokens {
            println!("  Max output tokens:  {}", max_tokens);
        }
        if let Some(ttl) = self.cache_ttl_hours {
            println!("  Search cache TTL:   {} hours", ttl);
        }
        if let Some(no_cache) = self.no_cache {
            println!("  Search cache:       {}", if no_cache { "disabled" } else { "enabled" });
        }
    }
}

/// `keys.json`: the API key plus optional model overrides.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct KeysFile {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
}

impl KeysFile {
    /// `~/.config/blue_cli/keys.json`
    pub fn default_path() -> Option<PathBuf> {
        config_dir().map(|dir| dir.join("keys.json"))
    }

    /// Read the key file; missing or invalid files yield an empty set of keys.
    pub fn load(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(_) => return KeysFile::default(),
        };
        match serde_json::from_str(&content) {
            Ok(keys) => keys,
            Err(e) => {
                warn!("ignoring invalid key file {}: {}", path.display(), e);
                KeysFile::default()
            }
        }
    }

    pub fn load_default() -> Self {
        Self::default_path()
            .map(|path| Self::load(&path))
            .unwrap_or_default()
    }
}
