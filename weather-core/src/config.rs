use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt, fs, path::Path, path::PathBuf, time::Duration};

use crate::model::DisplayPreferences;

pub const DEFAULT_IP_LOOKUP_URL: &str = "https://ipinfo.io/json";
pub const DEFAULT_GEOCODING_URL: &str = "https://api.api-ninjas.com/v1/geocoding";
pub const DEFAULT_WEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
pub const DEFAULT_ICON_BASE_URL: &str = "https://openweathermap.org/img/wn";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Upstream services that take an API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceId {
    Weather,
    Geocoding,
}

impl ServiceId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceId::Weather => "weather",
            ServiceId::Geocoding => "geocoding",
        }
    }

    pub const fn all() -> &'static [ServiceId] {
        &[ServiceId::Weather, ServiceId::Geocoding]
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ServiceId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "weather" | "openweather" => Ok(ServiceId::Weather),
            "geocoding" => Ok(ServiceId::Geocoding),
            _ => Err(anyhow!("Unknown service '{value}'. Supported services: weather, geocoding.")),
        }
    }
}

/// Credentials for a single service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeyConfig {
    pub api_key: String,
}

/// Where each upstream lives, and how long a single request may take.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceEndpoints {
    pub ip_lookup_url: String,
    pub geocoding_url: String,
    pub weather_url: String,
    pub icon_base_url: String,
    pub timeout_secs: u64,
}

impl Default for ServiceEndpoints {
    fn default() -> Self {
        Self {
            ip_lookup_url: DEFAULT_IP_LOOKUP_URL.to_string(),
            geocoding_url: DEFAULT_GEOCODING_URL.to_string(),
            weather_url: DEFAULT_WEATHER_URL.to_string(),
            icon_base_url: DEFAULT_ICON_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ServiceEndpoints {
    /// Request timeout; never zero, so every call stays bounded.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub services: ServiceEndpoints,

    /// Example TOML:
    /// [api_keys.weather]
    /// api_key = "..."
    #[serde(default)]
    pub api_keys: HashMap<String, ApiKeyConfig>,

    /// Units a new session starts with.
    #[serde(default)]
    pub display: DisplayPreferences,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-task", "weather-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Set or replace the API key for a service.
    pub fn upsert_api_key(&mut self, service: ServiceId, api_key: String) {
        self.api_keys.insert(service.as_str().to_string(), ApiKeyConfig { api_key });
    }

    /// Returns the API key for a service, if present and non-blank.
    pub fn api_key(&self, service: ServiceId) -> Option<&str> {
        self.api_keys
            .get(service.as_str())
            .map(|cfg| cfg.api_key.as_str())
            .filter(|key| !key.trim().is_empty())
    }

    pub fn is_configured(&self, service: ServiceId) -> bool {
        self.api_key(service).is_some()
    }

    /// The weather service cannot be queried without a key.
    pub fn weather_api_key(&self) -> Result<&str> {
        self.api_key(ServiceId::Weather).ok_or_else(|| {
            anyhow!(
                "No API key configured for the weather service.\n\
                 Hint: run `weather configure weather` and enter your OpenWeather API key."
            )
        })
    }
}
