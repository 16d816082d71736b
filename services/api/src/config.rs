//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use matching_core::LikeDuplicatePolicy;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// `None` runs the service on the in-memory store.
    pub database_url: Option<String>,
    pub log_level: Level,
    pub cors_origin: String,
    pub nearby_radius_km: f64,
    pub push_buffer: usize,
    pub handshake_timeout: Duration,
    pub like_duplicates: LikeDuplicatePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 3000)),
            database_url: None,
            log_level: Level::INFO,
            cors_origin: "http://localhost:3000".to_string(),
            nearby_radius_km: matching_core::proximity::DEFAULT_RADIUS_KM,
            push_buffer: 32,
            handshake_timeout: Duration::from_secs(10),
            like_duplicates: LikeDuplicatePolicy::Allow,
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a `Config` from any key/value source, falling back to defaults
    /// for unset keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        // --- Server and Database Settings ---
        let bind_address = match lookup("BIND_ADDRESS") {
            Some(raw) => raw.parse::<SocketAddr>().map_err(|e| {
                ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
            })?,
            None => defaults.bind_address,
        };

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let log_level = match lookup("RUST_LOG") {
            Some(raw) => raw.parse::<Level>().map_err(|_| {
                ConfigError::InvalidValue(
                    "RUST_LOG".to_string(),
                    format!("'{}' is not a valid log level", raw),
                )
            })?,
            None => defaults.log_level,
        };

        let cors_origin = lookup("CORS_ORIGIN").unwrap_or(defaults.cors_origin);

        // --- Matching Settings ---
        let nearby_radius_km = match lookup("NEARBY_RADIUS_KM") {
            Some(raw) => parse_radius(&raw)?,
            None => defaults.nearby_radius_km,
        };

        let like_duplicates = match lookup("LIKE_DUPLICATES") {
            Some(raw) => parse_like_policy(&raw)?,
            None => defaults.like_duplicates,
        };

        // --- Push Channel Settings ---
        let push_buffer = match lookup("PUSH_BUFFER") {
            Some(raw) => parse_positive("PUSH_BUFFER", &raw)? as usize,
            None => defaults.push_buffer,
        };

        let handshake_timeout = match lookup("HANDSHAKE_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_positive("HANDSHAKE_TIMEOUT_SECS", &raw)?),
            None => defaults.handshake_timeout,
        };

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            cors_origin,
            nearby_radius_km,
            push_buffer,
            handshake_timeout,
            like_duplicates,
        })
    }
}

fn parse_radius(raw: &str) -> Result<f64, ConfigError> {
    match raw.trim().parse::<f64>() {
        Ok(km) if km.is_finite() && km > 0.0 => Ok(km),
        _ => Err(ConfigError::InvalidValue(
            "NEARBY_RADIUS_KM".to_string(),
            format!("'{}' is not a positive number of kilometres", raw),
        )),
    }
}

fn parse_positive(key: &str, raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidValue(
            key.to_string(),
            format!("'{}' is not a positive integer", raw),
        )),
    }
}

fn parse_like_policy(raw: &str) -> Result<LikeDuplicatePolicy, ConfigError> {
    match raw.trim().to_lowercase().as_str() {
        "allow" => Ok(LikeDuplicatePolicy::Allow),
        "reject" => Ok(LikeDuplicatePolicy::Reject),
        _ => Err(ConfigError::InvalidValue(
            "LIKE_DUPLICATES".to_string(),
            format!("'{}' must be 'allow' or 'reject'", raw),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:3000".parse::<SocketAddr>().unwrap());
        assert!(config.database_url.is_none());
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.nearby_radius_km, 10.0);
        assert_eq!(config.push_buffer, 32);
        assert_eq!(config.handshake_timeout, Duration::from_secs(10));
        assert_eq!(config.like_duplicates, LikeDuplicatePolicy::Allow);
    }

    #[test]
    fn reads_every_setting() {
        let config = load(&[
            ("BIND_ADDRESS", "127.0.0.1:8080"),
            ("DATABASE_URL", "postgres://localhost/matching"),
            ("RUST_LOG", "debug"),
            ("CORS_ORIGIN", "https://app.example.com"),
            ("NEARBY_RADIUS_KM", "25.5"),
            ("PUSH_BUFFER", "8"),
            ("HANDSHAKE_TIMEOUT_SECS", "3"),
            ("LIKE_DUPLICATES", "Reject"),
        ])
        .unwrap();

        assert_eq!(config.bind_address, "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/matching"));
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.cors_origin, "https://app.example.com");
        assert_eq!(config.nearby_radius_km, 25.5);
        assert_eq!(config.push_buffer, 8);
        assert_eq!(config.handshake_timeout, Duration::from_secs(3));
        assert_eq!(config.like_duplicates, LikeDuplicatePolicy::Reject);
    }

    #[test]
    fn blank_database_url_means_in_memory() {
        assert!(load(&[("DATABASE_URL", "  ")]).unwrap().database_url.is_none());
    }

    #[test]
    fn rejects_invalid_values() {
        for (key, value) in [
            ("BIND_ADDRESS", "nowhere"),
            ("RUST_LOG", "loud"),
            ("NEARBY_RADIUS_KM", "-1"),
            ("NEARBY_RADIUS_KM", "NaN"),
            ("PUSH_BUFFER", "0"),
            ("HANDSHAKE_TIMEOUT_SECS", "soon"),
            ("LIKE_DUPLICATES", "sometimes"),
        ] {
            match load(&[(key, value)]) {
                Err(ConfigError::InvalidValue(var, _)) => assert_eq!(var, key),
                other => panic!("{key}={value} should be invalid, got {other:?}"),
            }
        }
    }
}
