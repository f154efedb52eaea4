//! Service configuration resolved from defaults and environment variables.

use std::env;
use std::ffi::OsString;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::DEFAULT_TTL;
use crate::http_client::DEFAULT_TIMEOUT_MS;
use crate::retry::RetryConfig;
use crate::ValidationError;

pub const ENV_ADDR: &str = "QUOTECACHE_ADDR";
pub const ENV_CACHE_TTL_SECS: &str = "QUOTECACHE_CACHE_TTL_SECS";
pub const ENV_TIMEOUT_MS: &str = "QUOTECACHE_TIMEOUT_MS";
pub const ENV_LOOKBACK_DAYS: &str = "QUOTECACHE_LOOKBACK_DAYS";
pub const ENV_CATALOG: &str = "QUOTECACHE_CATALOG";
pub const ENV_CORS_ORIGINS: &str = "QUOTECACHE_CORS_ORIGINS";
pub const ENV_MAX_RETRIES: &str = "QUOTECACHE_MAX_RETRIES";

/// Lookback used when a caller does not pass one.
pub const DEFAULT_LOOKBACK_DAYS: u32 = 30;
/// Largest accepted lookback window.
pub const MAX_LOOKBACK_DAYS: u32 = 3_650;

const DEFAULT_PORT: u16 = 5_000;
const DEFAULT_ORIGIN: &str = "http://localhost:3001";

/// Runtime configuration shared by the resolver and the HTTP surface.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    /// Address the HTTP surface binds to.
    pub bind_addr: SocketAddr,
    /// Quote freshness window. Zero disables caching.
    pub cache_ttl: Duration,
    /// Per-request upstream timeout.
    pub request_timeout_ms: u64,
    pub default_lookback_days: u32,
    /// Catalog asset override; `None` uses the embedded asset.
    pub catalog_path: Option<PathBuf>,
    /// Origins allowed by CORS.
    pub allowed_origins: Vec<String>,
    pub retry: RetryConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), DEFAULT_PORT),
            cache_ttl: DEFAULT_TTL,
            request_timeout_ms: DEFAULT_TIMEOUT_MS,
            default_lookback_days: DEFAULT_LOOKBACK_DAYS,
            catalog_path: None,
            allowed_origins: vec![DEFAULT_ORIGIN.to_owned()],
            retry: RetryConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Defaults overridden by any non-empty `QUOTECACHE_*` variables.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidConfig`] when a set variable cannot be
    /// parsed or is out of range.
    pub fn from_env() -> Result<Self, ValidationError> {
        Self::from_lookup(|key| env::var_os(key))
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ValidationError>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let read = |key: &'static str| -> Option<String> {
            let value = lookup(key)?;
            let value = value.to_string_lossy().trim().to_owned();
            (!value.is_empty()).then_some(value)
        };

        let mut config = Self::default();

        if let Some(value) = read(ENV_ADDR) {
            config.bind_addr = parse_value(ENV_ADDR, &value)?;
        }
        if let Some(value) = read(ENV_CACHE_TTL_SECS) {
            config.cache_ttl = Duration::from_secs(parse_value(ENV_CACHE_TTL_SECS, &value)?);
        }
        if let Some(value) = read(ENV_TIMEOUT_MS) {
            let timeout: u64 = parse_value(ENV_TIMEOUT_MS, &value)?;
            if timeout == 0 {
                return Err(invalid(ENV_TIMEOUT_MS, &value));
            }
            config.request_timeout_ms = timeout;
        }
        if let Some(value) = read(ENV_LOOKBACK_DAYS) {
            let days: u32 = parse_value(ENV_LOOKBACK_DAYS, &value)?;
            if !(1..=MAX_LOOKBACK_DAYS).contains(&days) {
                return Err(invalid(ENV_LOOKBACK_DAYS, &value));
            }
            config.default_lookback_days = days;
        }
        if let Some(value) = read(ENV_MAX_RETRIES) {
            config.retry.max_retries = parse_value(ENV_MAX_RETRIES, &value)?;
        }
        if let Some(value) = read(ENV_CATALOG) {
            config.catalog_path = Some(PathBuf::from(value));
        }
        if let Some(value) = read(ENV_CORS_ORIGINS) {
            let origins: Vec<String> = value
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_owned)
                .collect();
            if origins.is_empty() {
                return Err(invalid(ENV_CORS_ORIGINS, &value));
            }
            config.allowed_origins = origins;
        }

        Ok(config)
    }
}

fn parse_value<T: FromStr>(key: &'static str, value: &str) -> Result<T, ValidationError> {
    value.parse().map_err(|_| invalid(key, value))
}

fn invalid(key: &'static str, value: &str) -> ValidationError {
    ValidationError::InvalidConfig {
        key,
        value: value.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<ServiceConfig, ValidationError> {
        let vars: HashMap<String, OsString> = vars
            .iter()
            .map(|(key, value)| ((*key).to_owned(), OsString::from(value)))
            .collect();
        ServiceConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_without_environment() {
        let config = config_from(&[]).expect("defaults");
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:5000");
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert_eq!(config.request_timeout_ms, 5_000);
        assert_eq!(config.default_lookback_days, 30);
        assert_eq!(config.allowed_origins, ["http://localhost:3001"]);
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = config_from(&[
            (ENV_ADDR, "0.0.0.0:8080"),
            (ENV_CACHE_TTL_SECS, "60"),
            (ENV_TIMEOUT_MS, "1500"),
            (ENV_LOOKBACK_DAYS, "7"),
            (ENV_CATALOG, "/etc/quotecache/catalog.json"),
            (ENV_CORS_ORIGINS, "https://a.example, https://b.example,"),
            (ENV_MAX_RETRIES, "0"),
        ])
        .expect("valid overrides");

        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert_eq!(config.request_timeout_ms, 1_500);
        assert_eq!(config.default_lookback_days, 7);
        assert_eq!(
            config.catalog_path,
            Some(PathBuf::from("/etc/quotecache/catalog.json"))
        );
        assert_eq!(
            config.allowed_origins,
            ["https://a.example", "https://b.example"]
        );
        assert_eq!(config.retry.max_retries, 0);
    }

    #[test]
    fn blank_values_are_ignored() {
        let config = config_from(&[(ENV_ADDR, "  "), (ENV_CATALOG, "")]).expect("defaults");
        assert_eq!(config, ServiceConfig::default());
    }

    #[test]
    fn zero_ttl_is_accepted() {
        let config = config_from(&[(ENV_CACHE_TTL_SECS, "0")]).expect("valid");
        assert!(config.cache_ttl.is_zero());
    }

    #[test]
    fn malformed_values_are_rejected() {
        for (key, value) in [
            (ENV_ADDR, "localhost"),
            (ENV_CACHE_TTL_SECS, "-1"),
            (ENV_TIMEOUT_MS, "0"),
            (ENV_LOOKBACK_DAYS, "0"),
            (ENV_LOOKBACK_DAYS, "3651"),
            (ENV_CORS_ORIGINS, ",,"),
            (ENV_MAX_RETRIES, "many"),
        ] {
            let err = config_from(&[(key, value)]).expect_err("must fail");
            assert!(
                matches!(err, ValidationError::InvalidConfig { key: k, .. } if k == key),
                "{key}={value} gave {err:?}"
            );
        }
    }
}
