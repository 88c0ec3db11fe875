//! Configuration loading and representation.
//!
//! Everything comes from environment variables. Parsing goes through a lookup
//! function so tests can supply their own environment without touching the
//! process one.

use std::net::SocketAddr;
use std::str::FromStr;

use thiserror::Error;
use tracing::debug;

use shelfscan_inventory::CategoryMatch;
use shelfscan_observability::LogFormat;

pub const BIND_VAR: &str = "SHELFSCAN_BIND";
pub const STORE_VAR: &str = "SHELFSCAN_STORE";
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";
pub const DB_MAX_CONNECTIONS_VAR: &str = "SHELFSCAN_DB_MAX_CONNECTIONS";
pub const CATEGORY_MATCH_VAR: &str = "SHELFSCAN_CATEGORY_MATCH";
pub const LOG_FORMAT_VAR: &str = "SHELFSCAN_LOG_FORMAT";

const DEFAULT_BIND: &str = "0.0.0.0:8080";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} is required when {reason}")]
    Missing { key: &'static str, reason: &'static str },

    #[error("invalid {key}={value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Which `StockStore` implementation backs the process.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    Memory,
    Postgres,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "in-memory" => Ok(StoreBackend::Memory),
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            other => Err(format!("store must be one of: memory, postgres (got {other:?})")),
        }
    }
}

/// Process configuration, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub store: StoreBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub category_match: CategoryMatch,
    pub log_format: LogFormat,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store: StoreBackend = parse_or_default(&lookup, STORE_VAR)?;
        let database_url = lookup(DATABASE_URL_VAR).filter(|v| !v.trim().is_empty());

        if store == StoreBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing {
                key: DATABASE_URL_VAR,
                reason: "SHELFSCAN_STORE=postgres",
            });
        }

        let bind_addr = match lookup(BIND_VAR) {
            Some(raw) => raw.trim().parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                key: BIND_VAR,
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => {
                debug!("{BIND_VAR} not set, using default: {DEFAULT_BIND}");
                DEFAULT_BIND.parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                    key: BIND_VAR,
                    value: DEFAULT_BIND.to_string(),
                    reason: e.to_string(),
                })?
            }
        };

        let db_max_connections = match lookup(DB_MAX_CONNECTIONS_VAR) {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: DB_MAX_CONNECTIONS_VAR,
                        value: raw,
                        reason: "expected a positive integer".to_string(),
                    });
                }
            },
            None => DEFAULT_DB_MAX_CONNECTIONS,
        };

        Ok(Self {
            bind_addr,
            store,
            database_url,
            db_max_connections,
            category_match: parse_or_default(&lookup, CATEGORY_MATCH_VAR)?,
            log_format: parse_or_default(&lookup, LOG_FORMAT_VAR)?,
        })
    }
}

fn parse_or_default<T, F>(lookup: &F, key: &'static str) -> Result<T, ConfigError>
where
    T: FromStr + Default + core::fmt::Debug,
    T::Err: core::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
        None => {
            let value = T::default();
            debug!("{key} not set, using default: {value:?}");
            Ok(value)
        }
    }
}
