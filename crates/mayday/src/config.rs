//! Configuration management for mayday.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};
use crate::sos::DEFAULT_DISTRESS_MESSAGE;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "mayday";

/// Default session file name.
const SESSION_FILE_NAME: &str = "session.json";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `MAYDAY_`)
/// 2. TOML config file at `~/.config/mayday/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Identity provider configuration.
    pub identity: IdentityConfig,
    /// Document store configuration.
    pub store: StoreConfig,
    /// Geolocation configuration.
    pub locate: LocateConfig,
    /// AI enhancement configuration.
    pub enhance: EnhanceConfig,
    /// SOS message configuration.
    pub sos: SosMessageConfig,
}

/// Identity provider boundary configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Base URL of the hosted identity provider.
    pub base_url: String,
    /// API key sent with identity requests, if the deployment needs one.
    pub api_key: Option<String>,
}

/// Document store boundary configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Base URL of the hosted document store.
    pub base_url: String,
}

/// Geolocation boundary configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocateConfig {
    /// Endpoint of the device location source.
    pub endpoint: String,
    /// Bounded wait for a fresh fix, in seconds.
    pub wait_secs: u64,
}

/// AI enhancement boundary configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhanceConfig {
    /// Endpoint of the text-enhancement service.
    pub endpoint: String,
    /// Bounded wait for the enhancement call, in seconds.
    pub wait_secs: u64,
    /// Whether to attempt enhancement at all.
    pub enabled: bool,
}

/// SOS message configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SosMessageConfig {
    /// The distress text to enhance and fall back to.
    pub default_message: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            base_url: "https://identity.mayday.app".to_string(),
            api_key: None,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: "https://store.mayday.app".to_string(),
        }
    }
}

impl Default for LocateConfig {
    fn default() -> Self {
        Self {
            // The local device agent that proxies the platform's GPS.
            endpoint: "http://127.0.0.1:7878/fix".to_string(),
            wait_secs: 10,
        }
    }
}

impl Default for EnhanceConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://ai.mayday.app/v1/enhance".to_string(),
            wait_secs: 10,
            enabled: true,
        }
    }
}

impl Default for SosMessageConfig {
    fn default() -> Self {
        Self {
            default_message: DEFAULT_DISTRESS_MESSAGE.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `MAYDAY_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file).nested())
            .merge(Env::prefixed("MAYDAY_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Get the session file path.
    #[must_use]
    pub fn session_file_path() -> PathBuf {
        Self::default_data_dir().join(SESSION_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("identity.base_url", &self.identity.base_url),
            ("store.base_url", &self.store.base_url),
            ("locate.endpoint", &self.locate.endpoint),
            ("enhance.endpoint", &self.enhance.endpoint),
        ] {
            if Url::parse(value).is_err() {
                return Err(Error::ConfigValidation {
                    message: format!("{field} is not a valid URL: {value}"),
                });
            }
        }

        if self.locate.wait_secs == 0 {
            return Err(Error::ConfigValidation {
                message: "locate.wait_secs must be greater than 0".to_string(),
            });
        }
        if self.enhance.wait_secs == 0 {
            return Err(Error::ConfigValidation {
                message: "enhance.wait_secs must be greater than 0".to_string(),
            });
        }

        if self.sos.default_message.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "sos.default_message must not be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Get the locate wait as a Duration.
    #[must_use]
    pub fn locate_wait(&self) -> Duration {
        Duration::from_secs(self.locate.wait_secs)
    }

    /// Get the enhance wait as a Duration.
    #[must_use]
    pub fn enhance_wait(&self) -> Duration {
        Duration::from_secs(self.enhance.wait_secs)
    }

    /// Build the per-trigger SOS options from this configuration.
    #[must_use]
    pub fn sos_options(&self) -> crate::sos::SosOptions {
        crate::sos::SosOptions {
            default_message: self.sos.default_message.clone(),
            locate_wait: self.locate_wait(),
            enhance_wait: self.enhance_wait(),
            enhance_enabled: self.enhance.enabled,
        }
    }
}
