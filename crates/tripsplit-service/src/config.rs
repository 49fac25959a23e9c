//! # Service Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TRIPSPLIT_DB_PATH=/var/lib/tripsplit/tripsplit.db                  │
//! │     TRIPSPLIT_LOG=debug                                                │
//! │     TRIPSPLIT_NOTIFY_CAPACITY=512                                      │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/tripsplit/tripsplit.toml (Linux)                         │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "./tripsplit.db"
//! max_connections = 5
//!
//! [reference]
//! categories = ["food", "lodging", "other"]
//!
//! [notifications]
//! channel_capacity = 256
//!
//! [logging]
//! filter = "info,tripsplit=debug,sqlx=warn"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use tripsplit_core::reference::{DEFAULT_CATEGORIES, ISO_4217_CURRENCIES};
use tripsplit_core::ReferenceData;
use tripsplit_db::DbConfig;

use crate::error::{ServiceError, ServiceResult};

/// Default tracing filter.
pub const DEFAULT_LOG_FILTER: &str = "info,tripsplit=debug,sqlx=warn";

// =============================================================================
// Sections
// =============================================================================

/// `[database]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file, created on first start. `:memory:` keeps everything in
    /// memory for the life of the process.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_db_path() -> PathBuf {
    directories::ProjectDirs::from("com", "tripsplit", "tripsplit")
        .map(|dirs| dirs.data_dir().join("tripsplit.db"))
        .unwrap_or_else(|| PathBuf::from("./tripsplit.db"))
}

fn default_max_connections() -> u32 {
    5
}

fn default_min_connections() -> u32 {
    1
}

fn default_connect_timeout() -> u64 {
    30
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

/// `[reference]`. Unset lists fall back to the built-in tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceSettings {
    #[serde(default)]
    pub currencies: Option<Vec<String>>,

    #[serde(default)]
    pub categories: Option<Vec<String>>,
}

/// `[notifications]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSettings {
    /// Events buffered per subscriber before it starts lagging.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_channel_capacity() -> usize {
    256
}

impl Default for NotificationSettings {
    fn default() -> Self {
        NotificationSettings {
            channel_capacity: default_channel_capacity(),
        }
    }
}

/// `[logging]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `EnvFilter` directives; `RUST_LOG` still wins when set.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            filter: default_log_filter(),
        }
    }
}

// =============================================================================
// Service Configuration
// =============================================================================

/// Complete service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub reference: ReferenceSettings,

    #[serde(default)]
    pub notifications: NotificationSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl ServiceConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (tripsplit.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ServiceResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());

        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ServiceResult<()> {
        if self.database.max_connections == 0 {
            return Err(ServiceError::InvalidConfig(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ServiceError::InvalidConfig(
                "database.min_connections must not exceed max_connections".into(),
            ));
        }

        if self.notifications.channel_capacity == 0 {
            return Err(ServiceError::InvalidConfig(
                "notifications.channel_capacity must be greater than 0".into(),
            ));
        }

        if matches!(&self.reference.currencies, Some(c) if c.is_empty()) {
            return Err(ServiceError::InvalidConfig(
                "reference.currencies must not be empty".into(),
            ));
        }

        if matches!(&self.reference.categories, Some(c) if c.is_empty()) {
            return Err(ServiceError::InvalidConfig(
                "reference.categories must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Applies `TRIPSPLIT_*` overrides read through `lookup`.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("TRIPSPLIT_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(filter) = lookup("TRIPSPLIT_LOG") {
            self.logging.filter = filter;
        }

        if let Some(capacity) = lookup("TRIPSPLIT_NOTIFY_CAPACITY") {
            match capacity.parse::<usize>() {
                Ok(c) => self.notifications.channel_capacity = c,
                Err(_) => warn!(value = %capacity, "Ignoring invalid TRIPSPLIT_NOTIFY_CAPACITY"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "tripsplit", "tripsplit")
            .map(|dirs| dirs.config_dir().join("tripsplit.toml"))
    }

    // =========================================================================
    // Conversions
    // =========================================================================

    /// Pool settings for `Database::new`.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database.path)
            .max_connections(self.database.max_connections)
            .min_connections(self.database.min_connections)
            .connect_timeout(Duration::from_secs(self.database.connect_timeout_secs))
    }

    /// Currency and category tables used for validation.
    pub fn reference_data(&self) -> ReferenceData {
        let currencies = match &self.reference.currencies {
            Some(list) => list.clone(),
            None => ISO_4217_CURRENCIES.iter().map(|c| c.to_string()).collect(),
        };
        let categories = match &self.reference.categories {
            Some(list) => list.clone(),
            None => DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
        };
        ReferenceData::new(currencies, categories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tripsplit_db::StoreLocation;

    #[test]
    fn test_default_config() {
        let config = ServiceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.notifications.channel_capacity, 256);
        assert_eq!(config.logging.filter, DEFAULT_LOG_FILTER);
        assert!(config.reference_data().is_supported_currency("JPY"));
    }

    #[test]
    fn test_partial_toml() {
        let config: ServiceConfig = toml::from_str(
            r#"
            [database]
            path = "/tmp/trip.db"

            [reference]
            categories = ["food", "fuel"]
            "#,
        )
        .unwrap();

        assert_eq!(config.database.path, PathBuf::from("/tmp/trip.db"));
        assert_eq!(config.database.max_connections, 5);

        let reference = config.reference_data();
        assert!(reference.is_valid_category("fuel"));
        assert!(!reference.is_valid_category("shopping"));
        assert!(reference.is_supported_currency("EUR"));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("TRIPSPLIT_DB_PATH", "/data/override.db"),
            ("TRIPSPLIT_LOG", "warn"),
            ("TRIPSPLIT_NOTIFY_CAPACITY", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = ServiceConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.database.path, PathBuf::from("/data/override.db"));
        assert_eq!(config.logging.filter, "warn");
        assert_eq!(config.notifications.channel_capacity, 256);
    }

    #[test]
    fn test_validation() {
        let mut config = ServiceConfig::default();
        config.notifications.channel_capacity = 0;
        assert!(config.validate().is_err());

        let mut config = ServiceConfig::default();
        config.database.min_connections = 10;
        assert!(config.validate().is_err());

        let mut config = ServiceConfig::default();
        config.reference.categories = Some(vec![]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = ServiceConfig::load_or_default(Some(PathBuf::from(
            "/nonexistent/tripsplit/tripsplit.toml",
        )));
        assert_eq!(config.database.max_connections, 5);
    }

    #[test]
    fn test_db_config_conversion() {
        let mut config = ServiceConfig::default();
        config.database.path = PathBuf::from("/tmp/x.db");
        config.database.max_connections = 3;

        let db = config.db_config();
        assert_eq!(db.location, StoreLocation::File(PathBuf::from("/tmp/x.db")));
        assert_eq!(db.max_connections, 3);
        assert_eq!(db.connect_timeout, Duration::from_secs(30));

        config.database.path = PathBuf::from(":memory:");
        let db = config.db_config();
        assert_eq!(db.location, StoreLocation::InMemory);
        assert_eq!(db.max_connections, 1);
    }

    #[test]
    fn test_toml_serialization() {
        let toml_str = toml::to_string_pretty(&ServiceConfig::default()).unwrap();
        assert!(toml_str.contains("[database]"));
        assert!(toml_str.contains("[notifications]"));
    }
}
