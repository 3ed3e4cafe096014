//! Configuration management for tempseries.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::net::SocketAddr;
use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "tempseries";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "temperature.db";

/// Prefix for environment variable overrides.
const ENV_PREFIX: &str = "TEMPSERIES_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `TEMPSERIES_`, sections split on `__`)
/// 2. TOML config file at `~/.config/tempseries/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration.
    pub server: ServerConfig,
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Series validation configuration.
    pub validation: ValidationConfig,
    /// List endpoint configuration.
    pub listing: ListingConfig,
    /// Record event configuration.
    pub events: EventsConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to listen on, `host:port`.
    pub bind_address: String,
    /// Allow cross-origin requests from any origin.
    pub cors_enabled: bool,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/tempseries/temperature.db`
    pub database_path: Option<PathBuf>,
}

/// Series validation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Reject samples outside `[min_value, max_value]`.
    pub enforce_range: bool,
    /// Lowest accepted sample when the range is enforced.
    pub min_value: f64,
    /// Highest accepted sample when the range is enforced.
    pub max_value: f64,
}

/// List endpoint configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    /// Rows returned when the caller gives no limit.
    pub default_limit: usize,
    /// Upper bound applied to caller-supplied limits.
    pub max_limit: usize,
}

/// Record event configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Publish created/updated/deleted events.
    pub enabled: bool,
    /// Events buffered per subscriber before it starts lagging.
    pub channel_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:5000".to_string(),
            cors_enabled: true,
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            enforce_range: false,
            min_value: -100.0,
            max_value: 100.0,
        }
    }
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            default_limit: 100,
            max_limit: 1000,
        }
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            channel_capacity: 64,
        }
    }
}

impl ListingConfig {
    /// Resolve a caller-supplied limit: default when absent, clamped to the maximum.
    #[must_use]
    pub fn resolve(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_limit)
            .min(self.max_limit)
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `TEMPSERIES_`)
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
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

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

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        self.bind_addr()?;

        let validation = &self.validation;
        if !validation.min_value.is_finite() || !validation.max_value.is_finite() {
            return Err(Error::ConfigValidation {
                message: "min_value and max_value must be finite".to_string(),
            });
        }
        if validation.min_value > validation.max_value {
            return Err(Error::ConfigValidation {
                message: format!(
                    "min_value ({}) cannot be greater than max_value ({})",
                    validation.min_value, validation.max_value
                ),
            });
        }

        if self.listing.default_limit == 0 || self.listing.max_limit == 0 {
            return Err(Error::ConfigValidation {
                message: "default_limit and max_limit must be greater than 0".to_string(),
            });
        }
        if self.listing.default_limit > self.listing.max_limit {
            return Err(Error::ConfigValidation {
                message: format!(
                    "default_limit ({}) cannot be greater than max_limit ({})",
                    self.listing.default_limit, self.listing.max_limit
                ),
            });
        }

        if self.events.channel_capacity == 0 {
            return Err(Error::ConfigValidation {
                message: "channel_capacity must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Parse the configured bind address.
    ///
    /// # Errors
    ///
    /// Returns an error if `server.bind_address` is not a valid socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server
            .bind_address
            .parse()
            .map_err(|_| Error::ConfigValidation {
                message: format!("invalid bind_address: {}", self.server.bind_address),
            })
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }
}
