//! Process configuration read from the environment.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_LISTEN_ADDR: SocketAddr =
    SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8080);
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_WEBHOOK_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} has invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub listen_addr: SocketAddr,
    pub database_max_connections: u32,
    pub webhook_timeout: Duration,
    pub run_migrations: bool,
}

impl AppConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any key lookup; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Ok(Self {
            database_url: get("DATABASE_URL"),
            listen_addr: parse_or(get("LISTEN_ADDR"), "LISTEN_ADDR", || DEFAULT_LISTEN_ADDR)?,
            database_max_connections: parse_or(
                get("DATABASE_MAX_CONNECTIONS"),
                "DATABASE_MAX_CONNECTIONS",
                || DEFAULT_MAX_CONNECTIONS,
            )?,
            webhook_timeout: Duration::from_secs(parse_or(
                get("WEBHOOK_TIMEOUT_SECS"),
                "WEBHOOK_TIMEOUT_SECS",
                || DEFAULT_WEBHOOK_TIMEOUT_SECS,
            )?),
            run_migrations: parse_or(get("RUN_MIGRATIONS"), "RUN_MIGRATIONS", || true)?,
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            listen_addr: DEFAULT_LISTEN_ADDR,
            database_max_connections: DEFAULT_MAX_CONNECTIONS,
            webhook_timeout: Duration::from_secs(DEFAULT_WEBHOOK_TIMEOUT_SECS),
            run_migrations: true,
        }
    }
}

fn parse_or<T>(
    raw: Option<String>,
    name: &'static str,
    default: impl FnOnce() -> T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default()),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.listen_addr, DEFAULT_LISTEN_ADDR);
        assert_eq!(config.listen_addr.to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn values_are_parsed() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/storefront"),
            ("LISTEN_ADDR", "127.0.0.1:9000"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
            ("WEBHOOK_TIMEOUT_SECS", "2"),
            ("RUN_MIGRATIONS", "false"),
        ])
        .unwrap();
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/storefront")
        );
        assert_eq!(config.listen_addr.port(), 9000);
        assert_eq!(config.database_max_connections, 4);
        assert_eq!(config.webhook_timeout, Duration::from_secs(2));
        assert!(!config.run_migrations);
    }

    #[test]
    fn blank_database_url_means_in_memory() {
        let config = config_from(&[("DATABASE_URL", "  ")]).unwrap();
        assert!(config.database_url.is_none());
    }

    #[test]
    fn malformed_values_are_rejected() {
        match config_from(&[("DATABASE_MAX_CONNECTIONS", "lots")]) {
            Err(ConfigError::Invalid { name, value, .. }) => {
                assert_eq!(name, "DATABASE_MAX_CONNECTIONS");
                assert_eq!(value, "lots");
            }
            other => panic!("expected invalid config, got {other:?}"),
        }
        assert!(config_from(&[("RUN_MIGRATIONS", "yes")]).is_err());
        assert!(config_from(&[("LISTEN_ADDR", "localhost")]).is_err());
    }
}
