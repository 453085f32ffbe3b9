use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

/// Environment variable holding the OpenWeather API key. Takes precedence over the file.
pub const API_KEY_ENV: &str = "WEATHERLY_API_KEY";

pub const DEFAULT_WEATHER_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_PREDICTION_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_GEOLOCATION_URL: &str = "http://ip-api.com/json";

/// Where the two remote services live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    #[serde(default = "default_weather_url")]
    pub weather_url: String,

    #[serde(default = "default_prediction_url")]
    pub prediction_url: String,

    /// Transport timeout. Absent means the HTTP client's own default.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_weather_url() -> String {
    DEFAULT_WEATHER_URL.to_string()
}

fn default_prediction_url() -> String {
    DEFAULT_PREDICTION_URL.to_string()
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            weather_url: default_weather_url(),
            prediction_url: default_prediction_url(),
            timeout_secs: None,
        }
    }
}

/// External dictation command. Its stdout (one transcript per line) is the recognition result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceConfig {
    pub command: Option<String>,

    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeolocationConfig {
    /// IP-based locator endpoint; an empty string disables the capability.
    #[serde(default = "default_geolocation_url")]
    pub url: String,
}

fn default_geolocation_url() -> String {
    DEFAULT_GEOLOCATION_URL.to_string()
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self { url: default_geolocation_url() }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
///
/// [endpoints]
/// prediction_url = "http://127.0.0.1:5000"
///
/// [voice]
/// command = "dictate"
/// args = ["--lang", "en-US"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub api_key: Option<String>,

    #[serde(default)]
    pub endpoints: EndpointConfig,

    #[serde(default)]
    pub voice: VoiceConfig,

    #[serde(default)]
    pub geolocation: GeolocationConfig,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weatherly", "weatherly")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn set_api_key(&mut self, api_key: String) {
        let trimmed = api_key.trim();
        self.api_key = (!trimmed.is_empty()).then(|| trimmed.to_string());
    }

    /// API key stored in the file, if non-empty.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|key| !key.is_empty())
    }

    /// Reads the credential once: environment first, then the file.
    pub fn resolve_credential(&self) -> Option<String> {
        self.credential_with_env(std::env::var(API_KEY_ENV).ok())
    }

    pub(crate) fn credential_with_env(&self, env_value: Option<String>) -> Option<String> {
        env_value
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .or_else(|| self.api_key().map(str::to_string))
    }
}
