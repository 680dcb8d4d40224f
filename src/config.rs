//! Application configuration
//!
//! Loaded from TOML. Every section and field has a default, so a partial
//! file (or no file at all) is valid.
//!
//! ```toml
//! [server]
//! api_port = 8080
//!
//! [currency]
//! provider_url = "https://open.er-api.com/v6/latest/USD"
//! cache_ttl_secs = 3600
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::ConverterSettings;
use crate::infrastructure::DatabaseConfig;

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV: &str = "TUTORING_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseSection,
    pub security: SecurityConfig,
    pub logging: LoggingConfig,
    pub currency: CurrencyConfig,
    pub admin: AdminConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub api_host: String,
    pub api_port: u16,
    /// Seconds allowed for cleanup after a shutdown signal.
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_host: "0.0.0.0".to_string(),
            api_port: 8080,
            shutdown_timeout: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    /// `sqlite` (persistent) or `memory` (lost on exit).
    pub backend: StorageBackend,
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Sqlite,
    Memory,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        let db = DatabaseConfig::default();
        Self {
            backend: StorageBackend::Sqlite,
            url: db.url,
            max_connections: db.max_connections,
        }
    }
}

impl DatabaseSection {
    pub fn to_database_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.url.clone(),
            max_connections: self.max_connections,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub bcrypt_cost: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expiration_hours: 24,
            bcrypt_cost: crate::infrastructure::crypto::password::DEFAULT_COST,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `tutoring_billing=debug`.
    pub level: String,
    /// `plain` or `json`.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "plain".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrencyConfig {
    /// Endpoint returning `{"rates": {"EGP": 48.5, ...}}` per 1 USD.
    pub provider_url: String,
    pub cache_ttl_secs: u64,
    pub request_timeout_secs: u64,
    pub failure_backoff_secs: u64,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        let settings = ConverterSettings::default();
        Self {
            provider_url: "https://open.er-api.com/v6/latest/USD".to_string(),
            cache_ttl_secs: settings.ttl.as_secs(),
            request_timeout_secs: settings.request_timeout.as_secs(),
            failure_backoff_secs: settings.failure_backoff.as_secs(),
        }
    }
}

impl CurrencyConfig {
    pub fn converter_settings(&self) -> ConverterSettings {
        ConverterSettings {
            ttl: Duration::from_secs(self.cache_ttl_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            failure_backoff: Duration::from_secs(self.failure_backoff_secs),
        }
    }
}

/// Super-admin created when the user table is empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            email: "admin@localhost".to_string(),
            password: "change-me-now".to_string(),
        }
    }
}

impl AppConfig {
    /// Read `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.trim().is_empty() {
            return Err(ConfigError::Invalid("security.jwt_secret must not be empty".into()));
        }
        if self.security.jwt_expiration_hours <= 0 {
            return Err(ConfigError::Invalid(
                "security.jwt_expiration_hours must be positive".into(),
            ));
        }
        if !(4..=31).contains(&self.security.bcrypt_cost) {
            return Err(ConfigError::Invalid("security.bcrypt_cost must be 4-31".into()));
        }
        if self.currency.cache_ttl_secs == 0 || self.currency.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "currency cache and timeout durations must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// `$TUTORING_CONFIG`, else `<config_dir>/tutoring-billing/config.toml`.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return PathBuf::from(path);
    }
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tutoring-billing")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [server]
            api_port = 9090

            [database]
            backend = "memory"

            [currency]
            cache_ttl_secs = 600
            "#,
        )
        .unwrap();
        assert_eq!(config.server.api_port, 9090);
        assert_eq!(config.server.api_host, "0.0.0.0");
        assert_eq!(config.currency.converter_settings().ttl, Duration::from_secs(600));
        assert_eq!(config.currency.request_timeout_secs, 5);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.database.backend, StorageBackend::Memory);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = AppConfig::load(Path::new("/nonexistent/tutoring/config.toml")).unwrap();
        assert_eq!(config.server.api_port, 8080);
        assert_eq!(config.currency.cache_ttl_secs, 3600);
    }

    #[test]
    fn zero_ttl_is_rejected() {
        let mut config = AppConfig::default();
        config.currency.cache_ttl_secs = 0;
        assert!(config.validate().is_err());
    }
}
