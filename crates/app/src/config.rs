//! Application configuration loaded from environment variables.

use std::str::FromStr;

use event_store::postgres::DEFAULT_TABLE;
use thiserror::Error;

/// Errors raised while reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} has invalid value {value:?}: expected {expected}")]
    Invalid {
        name: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("{0} must be set when EVENT_STORE=postgres")]
    Missing(&'static str),
}

/// Which event store backs the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    Memory,
    Postgres,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "postgres" => Ok(Self::Postgres),
            _ => Err(ConfigError::Invalid {
                name: "EVENT_STORE",
                value: s.to_string(),
                expected: "memory or postgres",
            }),
        }
    }
}

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::Invalid {
                name: "LOG_FORMAT",
                value: s.to_string(),
                expected: "pretty or json",
            }),
        }
    }
}

/// Application configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `EVENT_STORE` — `memory` or `postgres` (default: `memory`)
/// - `DATABASE_URL` — PostgreSQL connection string, required for `postgres`
/// - `EVENTS_TABLE` — table holding events (default: `events`)
/// - `DATABASE_MAX_CONNECTIONS` — pool size (default: `5`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT` — `pretty` or `json` (default: `pretty`)
#[derive(Debug, Clone)]
pub struct Config {
    pub store: StoreBackend,
    pub database_url: Option<String>,
    pub events_table: String,
    pub max_connections: u32,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let store = lookup("EVENT_STORE")
            .map(|v| v.parse())
            .transpose()?
            .unwrap_or(defaults.store);

        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                name: "DATABASE_MAX_CONNECTIONS",
                value,
                expected: "a positive integer",
            })?,
            None => defaults.max_connections,
        };

        let config = Self {
            store,
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            events_table: lookup("EVENTS_TABLE").unwrap_or(defaults.events_table),
            max_connections,
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: lookup("LOG_FORMAT")
                .map(|v| v.parse())
                .transpose()?
                .unwrap_or(defaults.log_format),
        };

        if config.store == StoreBackend::Postgres && config.database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: StoreBackend::Memory,
            database_url: None,
            events_table: DEFAULT_TABLE.to_string(),
            max_connections: 5,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.events_table, "events");
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_empty_environment_uses_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.store, StoreBackend::Memory);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_postgres_settings() {
        let config = load(&[
            ("EVENT_STORE", "Postgres"),
            ("DATABASE_URL", "postgres://localhost/events"),
            ("EVENTS_TABLE", "user_events"),
            ("DATABASE_MAX_CONNECTIONS", "12"),
            ("LOG_FORMAT", "json"),
        ])
        .unwrap();

        assert_eq!(config.store, StoreBackend::Postgres);
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/events")
        );
        assert_eq!(config.events_table, "user_events");
        assert_eq!(config.max_connections, 12);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_postgres_requires_database_url() {
        assert!(matches!(
            load(&[("EVENT_STORE", "postgres")]),
            Err(ConfigError::Missing("DATABASE_URL"))
        ));
    }

    #[test]
    fn test_rejects_unknown_values() {
        assert!(matches!(
            load(&[("EVENT_STORE", "mongo")]),
            Err(ConfigError::Invalid { name: "EVENT_STORE", .. })
        ));
        assert!(matches!(
            load(&[("DATABASE_MAX_CONNECTIONS", "many")]),
            Err(ConfigError::Invalid { name: "DATABASE_MAX_CONNECTIONS", .. })
        ));
        assert!(load(&[("LOG_FORMAT", "xml")]).is_err());
    }
}
