use serde::{Deserialize, Serialize};

use super::analytics::AnalyticsConfig;
use super::database::DatabaseConfig;
use super::errors::ConfigError;
use super::logging::LoggingConfig;

const LOCAL_CONFIG_PATH: &str = "ferrous-analytics.toml";
const SYSTEM_CONFIG_PATH: &str = "/etc/ferrous-analytics/config.toml";

/// Main configuration structure for Ferrous Analytics
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Aggregation and report cache settings
    #[serde(default)]
    pub analytics: AnalyticsConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file or use defaults
    ///
    /// Priority order:
    /// 1. Explicitly provided path
    /// 2. ferrous-analytics.toml in current directory
    /// 3. /etc/ferrous-analytics/config.toml
    /// 4. Default configuration
    pub fn load(path: Option<&str>, cli_overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = match path.map(str::to_string).or_else(Self::get_config_path) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        config.apply_cli_overrides(cli_overrides);
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if let Some(db) = overrides.database_path {
            self.database.path = db;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = json;
        }
        if let Some(secs) = overrides.aggregation_interval_secs {
            self.analytics.aggregation_interval_secs = secs;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let analytics = &self.analytics;

        if analytics.aggregation_interval_secs == 0 {
            return Err(ConfigError::invalid(
                "analytics.aggregation_interval_secs",
                "must be greater than 0",
            ));
        }
        if analytics.aggregation_lookback_days == 0 {
            return Err(ConfigError::invalid(
                "analytics.aggregation_lookback_days",
                "must be greater than 0",
            ));
        }
        if analytics.aggregation_granularities.is_empty() {
            return Err(ConfigError::invalid(
                "analytics.aggregation_granularities",
                "at least one granularity is required",
            ));
        }
        if analytics.cache_maintenance_interval_secs == 0 {
            return Err(ConfigError::invalid(
                "analytics.cache_maintenance_interval_secs",
                "must be greater than 0",
            ));
        }
        if analytics.short_cache_ttl_minutes > analytics.default_cache_ttl_minutes {
            return Err(ConfigError::invalid(
                "analytics.short_cache_ttl_minutes",
                format!(
                    "{} exceeds default_cache_ttl_minutes ({})",
                    analytics.short_cache_ttl_minutes, analytics.default_cache_ttl_minutes
                ),
            ));
        }
        if self.database.outcome_max_batch_size == 0 {
            return Err(ConfigError::invalid(
                "database.outcome_max_batch_size",
                "must be greater than 0",
            ));
        }

        Ok(())
    }

    pub fn get_config_path() -> Option<String> {
        [LOCAL_CONFIG_PATH, SYSTEM_CONFIG_PATH]
            .into_iter()
            .find(|p| std::path::Path::new(p).exists())
            .map(str::to_string)
    }
}

/// Command-line overrides for configuration
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub database_path: Option<String>,
    pub log_level: Option<String>,
    pub log_json: Option<bool>,
    pub aggregation_interval_secs: Option<u64>,
}
