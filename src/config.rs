// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names, default values, and the
//! immutable [`AppConfig`] built from them once at startup. The config is
//! passed by value to the constructors that need it; nothing reads the
//! environment afterwards.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATA_DIR` | Directory holding `wallets.redb` | `./data` |
//! | `CACHE_TTL_SECS` | Lifetime of a cached balance | `3600` |
//! | `CACHE_CAPACITY` | Max wallets held in the cache | `10000` |
//! | `CACHE_SWEEP_SECS` | Interval between expired-entry sweeps | `60` |
//! | `STORE_TIMEOUT_MS` | Timeout for one store call | `5000` |
//! | `CACHE_TIMEOUT_MS` | Timeout for one cache call | `250` |
//! | `SEED_WALLETS` | `id=balance` pairs created at startup if absent | empty |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;

use crate::logging::LogFormat;
use crate::models::WalletId;
use crate::service::ServiceSettings;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// Environment variable name for the data directory path.
///
/// The balance database lives at `{DATA_DIR}/wallets.redb`.
pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const CACHE_TTL_ENV: &str = "CACHE_TTL_SECS";
pub const CACHE_CAPACITY_ENV: &str = "CACHE_CAPACITY";
pub const CACHE_SWEEP_ENV: &str = "CACHE_SWEEP_SECS";
pub const STORE_TIMEOUT_ENV: &str = "STORE_TIMEOUT_MS";
pub const CACHE_TIMEOUT_ENV: &str = "CACHE_TIMEOUT_MS";

/// Comma-separated `id=balance` pairs, e.g.
/// `123e4567-e89b-12d3-a456-426614174000=1000.00`.
///
/// Wallets have no creation endpoint; this is how operators provision them.
pub const SEED_WALLETS_ENV: &str = "SEED_WALLETS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";
pub const DB_FILE_NAME: &str = "wallets.redb";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid value {value:?} for {var}: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

impl ConfigError {
    fn new(var: &'static str, value: &str, reason: impl Into<String>) -> Self {
        Self {
            var,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Startup configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub cache_ttl: Duration,
    pub cache_capacity: usize,
    pub cache_sweep_interval: Duration,
    pub store_timeout: Duration,
    pub cache_timeout: Duration,
    pub seed_wallets: Vec<(WalletId, Decimal)>,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        let service = ServiceSettings::default();
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            data_dir: PathBuf::from("./data"),
            cache_ttl: service.cache_ttl,
            cache_capacity: 10_000,
            cache_sweep_interval: Duration::from_secs(60),
            store_timeout: service.store_timeout,
            cache_timeout: service.cache_timeout,
            seed_wallets: Vec::new(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable source. Unset variables keep defaults;
    /// set but unparsable ones are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(host) = lookup(HOST_ENV) {
            config.host = host;
        }
        if let Some(port) = lookup(PORT_ENV) {
            config.port = parse_number(PORT_ENV, &port)?;
        }
        if let Some(dir) = lookup(DATA_DIR_ENV) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(secs) = lookup(CACHE_TTL_ENV) {
            config.cache_ttl = Duration::from_secs(parse_positive(CACHE_TTL_ENV, &secs)?);
        }
        if let Some(capacity) = lookup(CACHE_CAPACITY_ENV) {
            config.cache_capacity = parse_positive(CACHE_CAPACITY_ENV, &capacity)? as usize;
        }
        if let Some(secs) = lookup(CACHE_SWEEP_ENV) {
            config.cache_sweep_interval =
                Duration::from_secs(parse_positive(CACHE_SWEEP_ENV, &secs)?);
        }
        if let Some(ms) = lookup(STORE_TIMEOUT_ENV) {
            config.store_timeout = Duration::from_millis(parse_positive(STORE_TIMEOUT_ENV, &ms)?);
        }
        if let Some(ms) = lookup(CACHE_TIMEOUT_ENV) {
            config.cache_timeout = Duration::from_millis(parse_positive(CACHE_TIMEOUT_ENV, &ms)?);
        }
        if let Some(seeds) = lookup(SEED_WALLETS_ENV) {
            config.seed_wallets = parse_seed_wallets(&seeds)?;
        }
        if let Some(format) = lookup(LOG_FORMAT_ENV) {
            config.log_format = format
                .parse()
                .map_err(|_| ConfigError::new(LOG_FORMAT_ENV, &format, "expected json or pretty"))?;
        }

        Ok(config)
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse()
            .map_err(|_| ConfigError::new(HOST_ENV, &self.host, "not a valid bind address"))
    }

    pub fn service_settings(&self) -> ServiceSettings {
        ServiceSettings {
            cache_ttl: self.cache_ttl,
            store_timeout: self.store_timeout,
            cache_timeout: self.cache_timeout,
        }
    }
}

fn parse_number<T: FromStr>(var: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::new(var, raw, "not a number"))
}

fn parse_positive(var: &'static str, raw: &str) -> Result<u64, ConfigError> {
    match parse_number::<u64>(var, raw)? {
        0 => Err(ConfigError::new(var, raw, "must be greater than zero")),
        n => Ok(n),
    }
}

fn parse_seed_wallets(raw: &str) -> Result<Vec<(WalletId, Decimal)>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| -> Result<(WalletId, Decimal), ConfigError> {
            let (id, balance) = entry
                .split_once('=')
                .ok_or_else(|| ConfigError::new(SEED_WALLETS_ENV, entry, "expected id=balance"))?;
            let id = WalletId::parse(id.trim())
                .map_err(|_| ConfigError::new(SEED_WALLETS_ENV, entry, "invalid wallet id"))?;
            let balance = Decimal::from_str(balance.trim())
                .map_err(|_| ConfigError::new(SEED_WALLETS_ENV, entry, "invalid balance"))?;
            if balance < Decimal::ZERO {
                return Err(ConfigError::new(SEED_WALLETS_ENV, entry, "negative balance"));
            }
            Ok((id, balance))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use rust_decimal_macros::dec;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.cache_ttl, Duration::from_secs(3600));
        assert_eq!(config.db_path(), PathBuf::from("./data/wallets.redb"));
        assert_eq!(config.bind_addr().unwrap().port(), 8080);
    }

    #[test]
    fn overrides_are_applied() {
        let config = AppConfig::from_lookup(lookup_from(&[
            (HOST_ENV, "127.0.0.1"),
            (PORT_ENV, "9000"),
            (DATA_DIR_ENV, "/var/lib/ledger"),
            (CACHE_TTL_ENV, "60"),
            (CACHE_CAPACITY_ENV, "5"),
            (STORE_TIMEOUT_ENV, "100"),
            (CACHE_TIMEOUT_ENV, "10"),
            (LOG_FORMAT_ENV, "JSON"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr().unwrap().to_string(), "127.0.0.1:9000");
        assert_eq!(config.db_path(), PathBuf::from("/var/lib/ledger/wallets.redb"));
        assert_eq!(config.cache_capacity, 5);
        assert_eq!(config.log_format, LogFormat::Json);

        let settings = config.service_settings();
        assert_eq!(settings.cache_ttl, Duration::from_secs(60));
        assert_eq!(settings.store_timeout, Duration::from_millis(100));
        assert_eq!(settings.cache_timeout, Duration::from_millis(10));
    }

    #[test]
    fn invalid_numbers_are_errors() {
        let err = AppConfig::from_lookup(lookup_from(&[(PORT_ENV, "eighty")])).unwrap_err();
        assert_eq!(err.var, PORT_ENV);

        let err = AppConfig::from_lookup(lookup_from(&[(CACHE_TTL_ENV, "0")])).unwrap_err();
        assert_eq!(err.var, CACHE_TTL_ENV);
    }

    #[test]
    fn unknown_log_format_is_an_error() {
        let err = AppConfig::from_lookup(lookup_from(&[(LOG_FORMAT_ENV, "xml")])).unwrap_err();
        assert_eq!(err.var, LOG_FORMAT_ENV);
        assert_eq!(err.value, "xml");
    }

    #[test]
    fn seed_wallets_parse() {
        let config = AppConfig::from_lookup(lookup_from(&[(
            SEED_WALLETS_ENV,
            "123e4567-e89b-12d3-a456-426614174000=1000.00, 123e4567-e89b-12d3-a456-426614174001=0,",
        )]))
        .unwrap();
        assert_eq!(config.seed_wallets.len(), 2);
        assert_eq!(config.seed_wallets[0].1, dec!(1000.00));
        assert_eq!(
            config.seed_wallets[1].0.to_string(),
            "123e4567-e89b-12d3-a456-426614174001"
        );
    }

    #[test]
    fn bad_seed_wallets_are_errors() {
        for raw in [
            "123e4567-e89b-12d3-a456-426614174000",
            "nope=1",
            "123e4567-e89b-12d3-a456-426614174000=abc",
            "123e4567-e89b-12d3-a456-426614174000=-5",
        ] {
            let err = AppConfig::from_lookup(lookup_from(&[(SEED_WALLETS_ENV, raw)])).unwrap_err();
            assert_eq!(err.var, SEED_WALLETS_ENV, "{raw}");
        }
    }

    #[test]
    fn bad_host_is_reported_at_bind() {
        let config = AppConfig::from_lookup(lookup_from(&[(HOST_ENV, "not a host")])).unwrap();
        assert!(config.bind_addr().is_err());
    }
}
