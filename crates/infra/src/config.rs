//! Process configuration, read from environment variables.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use thiserror::Error;

use crate::rate_limit::{RateLimit, RouteLimits};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be set")]
    Missing { key: &'static str },

    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("invalid rate limit {value:?}: {reason}")]
    InvalidRateLimit { value: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    /// `true` selects the Postgres store adapter.
    pub use_persistent_stores: bool,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub rate_limit_enabled: bool,
    pub rate_limits: RouteLimits,
    pub rate_limit_whitelist: Vec<IpAddr>,
    /// Seed a few rooms into the in-memory store on startup.
    pub seed_demo_rooms: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            use_persistent_stores: false,
            database_url: None,
            database_max_connections: 10,
            rate_limit_enabled: true,
            rate_limits: RouteLimits::default(),
            rate_limit_whitelist: vec![IpAddr::V4(Ipv4Addr::LOCALHOST), IpAddr::V6(Ipv6Addr::LOCALHOST)],
            seed_demo_rooms: true,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let use_persistent_stores = flag(&get, "USE_PERSISTENT_STORES", defaults.use_persistent_stores)?;
        let database_url = get("DATABASE_URL");
        if use_persistent_stores && database_url.is_none() {
            return Err(ConfigError::Missing { key: "DATABASE_URL" });
        }

        let rate_limits = RouteLimits {
            read: limit(&get, "RATE_LIMIT_READ", defaults.rate_limits.read)?,
            write: limit(&get, "RATE_LIMIT_WRITE", defaults.rate_limits.write)?,
            delete: limit(&get, "RATE_LIMIT_DELETE", defaults.rate_limits.delete)?,
            search: limit(&get, "RATE_LIMIT_SEARCH", defaults.rate_limits.search)?,
        };

        let rate_limit_whitelist = match lookup("RATE_LIMIT_WHITELIST") {
            Some(raw) => parse_whitelist(&raw)?,
            None => defaults.rate_limit_whitelist,
        };

        Ok(Self {
            host: get("HOST").unwrap_or(defaults.host),
            port: number(&get, "PORT", defaults.port)?,
            use_persistent_stores,
            database_url,
            database_max_connections: number(&get, "DATABASE_MAX_CONNECTIONS", defaults.database_max_connections)?,
            rate_limit_enabled: flag(&get, "RATE_LIMIT_ENABLED", defaults.rate_limit_enabled)?,
            rate_limits,
            rate_limit_whitelist,
            seed_demo_rooms: flag(&get, "SEED_DEMO_ROOMS", defaults.seed_demo_rooms)?,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Comma-separated addresses; blank entries are ignored, so an empty string means no whitelist.
fn parse_whitelist(raw: &str) -> Result<Vec<IpAddr>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse().map_err(|_| ConfigError::Invalid {
                key: "RATE_LIMIT_WHITELIST",
                value: s.to_string(),
                reason: "not an IP address".to_string(),
            })
        })
        .collect()
}

fn flag(get: &impl Fn(&str) -> Option<String>, key: &'static str, default: bool) -> Result<bool, ConfigError> {
    match get(key) {
        None => Ok(default),
        Some(v) => match v.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid {
                key,
                value: v,
                reason: "expected a boolean".to_string(),
            }),
        },
    }
}

fn number<N: std::str::FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: N,
) -> Result<N, ConfigError> {
    match get(key) {
        None => Ok(default),
        Some(v) => v.parse().map_err(|_| ConfigError::Invalid {
            key,
            value: v,
            reason: "expected a number".to_string(),
        }),
    }
}

fn limit(get: &impl Fn(&str) -> Option<String>, key: &'static str, default: RateLimit) -> Result<RateLimit, ConfigError> {
    get(key).map_or(Ok(default), |v| v.parse())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let settings = from_pairs(&[]).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.bind_addr(), "0.0.0.0:8000");
        assert_eq!(settings.rate_limits.search, RateLimit::per_minute(50));
        assert_eq!(settings.rate_limit_whitelist.len(), 2);
    }

    #[test]
    fn overrides_are_parsed() {
        let settings = from_pairs(&[
            ("PORT", "9001"),
            ("RATE_LIMIT_ENABLED", "false"),
            ("RATE_LIMIT_SEARCH", "5/second"),
            ("RATE_LIMIT_WHITELIST", "10.0.0.1, 10.0.0.2"),
        ])
        .unwrap();
        assert_eq!(settings.port, 9001);
        assert!(!settings.rate_limit_enabled);
        assert_eq!(settings.rate_limits.search, RateLimit::new(5, Duration::from_secs(1)));
        assert_eq!(
            settings.rate_limit_whitelist,
            vec!["10.0.0.1".parse::<IpAddr>().unwrap(), "10.0.0.2".parse().unwrap()]
        );
    }

    #[test]
    fn empty_whitelist_disables_exemptions() {
        let settings = from_pairs(&[("RATE_LIMIT_WHITELIST", "")]).unwrap();
        assert!(settings.rate_limit_whitelist.is_empty());
    }

    #[test]
    fn persistent_stores_require_database_url() {
        assert_eq!(
            from_pairs(&[("USE_PERSISTENT_STORES", "true")]).unwrap_err(),
            ConfigError::Missing { key: "DATABASE_URL" }
        );
        let settings = from_pairs(&[
            ("USE_PERSISTENT_STORES", "true"),
            ("DATABASE_URL", "postgres://localhost/hotel"),
        ])
        .unwrap();
        assert!(settings.use_persistent_stores);
    }

    #[test]
    fn bad_values_are_startup_errors() {
        assert!(matches!(from_pairs(&[("PORT", "http")]), Err(ConfigError::Invalid { key: "PORT", .. })));
        assert!(matches!(
            from_pairs(&[("RATE_LIMIT_WRITE", "lots")]),
            Err(ConfigError::InvalidRateLimit { .. })
        ));
        assert!(matches!(
            from_pairs(&[("RATE_LIMIT_WHITELIST", "localhost")]),
            Err(ConfigError::Invalid { key: "RATE_LIMIT_WHITELIST", .. })
        ));
    }
}
