//! Application configuration, read from the process environment

use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_ORACLE_URL: &str = "http://localhost:2358";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_ORACLE_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_DB_POOL_SIZE: usize = 16;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub oracle_url: String,
    pub oracle_auth_token: Option<String>,
    pub bind_addr: String,
    pub port: u16,
    pub oracle_timeout: Duration,
    pub db_pool_size: usize,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup (the environment in production)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let oracle_url = get("JUDGE0_URL")
            .unwrap_or_else(|| DEFAULT_ORACLE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let port = parse_or("PORT", get("PORT"), DEFAULT_PORT)?;
        let timeout_secs = parse_or(
            "ORACLE_TIMEOUT_SECS",
            get("ORACLE_TIMEOUT_SECS"),
            DEFAULT_ORACLE_TIMEOUT_SECS,
        )?;
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "ORACLE_TIMEOUT_SECS",
                value: "0".to_string(),
            });
        }
        let db_pool_size = parse_or("DB_POOL_SIZE", get("DB_POOL_SIZE"), DEFAULT_DB_POOL_SIZE)?;
        if db_pool_size == 0 {
            return Err(ConfigError::Invalid {
                key: "DB_POOL_SIZE",
                value: "0".to_string(),
            });
        }

        let log_format = match get("LOG_FORMAT").as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "LOG_FORMAT",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            database_url,
            oracle_url,
            oracle_auth_token: get("JUDGE0_AUTH_TOKEN"),
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            oracle_timeout: Duration::from_secs(timeout_secs),
            db_pool_size,
            log_format,
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/judge")]))
            .unwrap();
        assert_eq!(config.oracle_url, DEFAULT_ORACLE_URL);
        assert_eq!(config.port, 5000);
        assert_eq!(config.oracle_timeout, Duration::from_secs(15));
        assert_eq!(config.db_pool_size, 16);
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.oracle_auth_token, None);
        assert_eq!(config.listen_addr(), "0.0.0.0:5000");
    }

    #[test]
    fn test_database_url_required() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("DATABASE_URL"));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/judge"),
            ("JUDGE0_URL", "http://judge0:2358/"),
            ("JUDGE0_AUTH_TOKEN", "secret"),
            ("PORT", "8080"),
            ("BIND_ADDR", "127.0.0.1"),
            ("ORACLE_TIMEOUT_SECS", "30"),
            ("LOG_FORMAT", "json"),
        ]))
        .unwrap();
        assert_eq!(config.oracle_url, "http://judge0:2358");
        assert_eq!(config.oracle_auth_token.as_deref(), Some("secret"));
        assert_eq!(config.listen_addr(), "127.0.0.1:8080");
        assert_eq!(config.oracle_timeout, Duration::from_secs(30));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_port_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/judge"),
            ("PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PORT", .. }));
    }

    #[test]
    fn test_zero_pool_size_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/judge"),
            ("DB_POOL_SIZE", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "DB_POOL_SIZE", .. }));
    }

    #[test]
    fn test_zero_oracle_timeout_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/judge"),
            ("ORACLE_TIMEOUT_SECS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "ORACLE_TIMEOUT_SECS", .. }));
    }
}
