//! Configuration for the database boundary
//!
//! Loads settings from a YAML file and lets environment variables override them.
//! A `.env` file, when present, is read first by [`Config::from_env`].

use relalg_sql::DialectKind;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid value for {var}: {message}")]
    InvalidEnvVar { var: &'static str, message: String },
}

/// Database connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub dialect: DialectKind,

    /// Opaque connection descriptor handed to the driver
    pub url: String,

    /// Drop every declared table before validating the schema
    pub drop_existing: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            dialect: DialectKind::Sqlite,
            url: ":memory:".to_string(),
            drop_existing: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `relalg_driver=debug`
    pub level: String,

    /// pretty, json or compact
    pub format: String,

    /// stdout, file or both
    pub output: String,

    pub directory: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            output: "stdout".to_string(),
            directory: "./logs".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file, then apply environment overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&contents)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Defaults plus `.env` and environment overrides, without a config file
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut config = Config::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(dialect) = std::env::var("RELALG_DIALECT") {
            self.database.dialect = dialect.parse().map_err(|message| ConfigError::InvalidEnvVar {
                var: "RELALG_DIALECT",
                message,
            })?;
        }
        if let Ok(url) = std::env::var("RELALG_DATABASE_URL") {
            self.database.url = url;
        }
        if let Ok(drop) = std::env::var("RELALG_DROP_EXISTING") {
            self.database.drop_existing = parse_flag(&drop).ok_or_else(|| ConfigError::InvalidEnvVar {
                var: "RELALG_DROP_EXISTING",
                message: format!("expected a boolean, found '{}'", drop),
            })?;
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("LOG_FORMAT") {
            self.logging.format = format;
        }
        if let Ok(output) = std::env::var("LOG_OUTPUT") {
            self.logging.output = output;
        }
        if let Ok(dir) = std::env::var("LOG_DIR") {
            self.logging.directory = dir;
        }

        Ok(())
    }

    /// Export the logging settings for [`crate::logging::init_from_env`]
    pub fn apply_logging_env(&self) {
        std::env::set_var("RUST_LOG", &self.logging.level);
        std::env::set_var("LOG_FORMAT", &self.logging.format);
        std::env::set_var("LOG_OUTPUT", &self.logging.output);
        std::env::set_var("LOG_DIR", &self.logging.directory);
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
