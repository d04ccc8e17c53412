//! Configuration management for skybook.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults. The
//! bot token in particular is never hard-coded: it comes from the config
//! file or the `SKYBOOK_BOT_TOKEN` environment variable.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::render::FIELDS_PER_LISTED_BOOKING;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "skybook";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "bookings.db";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `SKYBOOK_`)
/// 2. TOML config file at `~/.config/skybook/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Bot behavior configuration.
    pub bot: BotConfig,
    /// Draft session configuration.
    pub session: SessionConfig,
    /// Display configuration.
    pub display: DisplayConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/skybook/bookings.db`
    pub database_path: Option<PathBuf>,
}

/// Bot-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Platform authentication token.
    ///
    /// Optional because the console gateway needs none; a network gateway
    /// must refuse to start without it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Prefix that marks a message as a command.
    pub command_prefix: String,
    /// Seconds to wait for a ticket ID follow-up on lookup/cancel.
    pub reply_timeout_secs: u64,
    /// Seconds to wait for a menu selection on inquiry/support.
    pub menu_timeout_secs: u64,
}

/// Draft session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Seconds an abandoned step-one draft survives.
    pub draft_ttl_secs: u64,
    /// Seconds between eviction sweeps.
    pub sweep_interval_secs: u64,
}

/// Display-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Maximum display fields per listing page.
    pub max_fields_per_page: usize,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: None,
            command_prefix: "!".to_string(),
            reply_timeout_secs: 120,
            menu_timeout_secs: 30,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            draft_ttl_secs: 900,
            sweep_interval_secs: 60,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_fields_per_page: 25,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `SKYBOOK_`)
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
            .merge(Env::prefixed("SKYBOOK_").split("_"));

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
        if self.bot.command_prefix.is_empty() {
            return Err(Error::ConfigValidation {
                message: "command_prefix must not be empty".to_string(),
            });
        }

        if self.bot.command_prefix.chars().any(char::is_whitespace) {
            return Err(Error::ConfigValidation {
                message: "command_prefix must not contain whitespace".to_string(),
            });
        }

        if self.bot.reply_timeout_secs == 0 || self.bot.menu_timeout_secs == 0 {
            return Err(Error::ConfigValidation {
                message: "reply and menu timeouts must be greater than 0".to_string(),
            });
        }

        if self.session.draft_ttl_secs == 0 || self.session.sweep_interval_secs == 0 {
            return Err(Error::ConfigValidation {
                message: "draft_ttl_secs and sweep_interval_secs must be greater than 0"
                    .to_string(),
            });
        }

        if self.display.max_fields_per_page < FIELDS_PER_LISTED_BOOKING {
            return Err(Error::ConfigValidation {
                message: format!(
                    "max_fields_per_page ({}) must be at least {FIELDS_PER_LISTED_BOOKING} \
                     to fit one booking",
                    self.display.max_fields_per_page
                ),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the lookup/cancel follow-up timeout as a Duration.
    #[must_use]
    pub fn reply_timeout(&self) -> Duration {
        Duration::from_secs(self.bot.reply_timeout_secs)
    }

    /// Get the menu selection timeout as a Duration.
    #[must_use]
    pub fn menu_timeout(&self) -> Duration {
        Duration::from_secs(self.bot.menu_timeout_secs)
    }

    /// Get the draft TTL as a Duration.
    #[must_use]
    pub fn draft_ttl(&self) -> Duration {
        Duration::from_secs(self.session.draft_ttl_secs)
    }

    /// Get the eviction sweep interval as a Duration.
    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.session.sweep_interval_secs)
    }
}
