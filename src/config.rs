//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::str::FromStr;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    /// Service name reported in logs
    pub app_name: String,

    /// Candidates tried before account number allocation gives up
    pub account_number_max_attempts: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url =
            lookup("DATABASE_URL").ok_or(ConfigError::MissingEnv("DATABASE_URL"))?;

        let database_max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?;
        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = parse_or(&lookup, "PORT", 3000)?;
        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string());
        let app_name = lookup("APP_NAME").unwrap_or_else(|| "account-service".to_string());

        let account_number_max_attempts = parse_or(&lookup, "ACCOUNT_NUMBER_MAX_ATTEMPTS", 16)?;
        if account_number_max_attempts == 0 {
            return Err(ConfigError::InvalidValue("ACCOUNT_NUMBER_MAX_ATTEMPTS"));
        }

        Ok(Self {
            database_url,
            database_max_connections,
            host,
            port,
            environment,
            app_name,
            account_number_max_attempts,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue(key)),
        None => Ok(default),
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/bank")])).unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.database_max_connections, 10);
        assert_eq!(config.account_number_max_attempts, 16);
        assert!(!config.is_production());
    }

    #[test]
    fn test_missing_database_url() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv("DATABASE_URL")));
    }

    #[test]
    fn test_invalid_port() {
        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/bank"),
            ("PORT", "not-a-port"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue("PORT")));
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/bank"),
            ("ACCOUNT_NUMBER_MAX_ATTEMPTS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue("ACCOUNT_NUMBER_MAX_ATTEMPTS")));
    }

    #[test]
    fn test_production_flag() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/bank"),
            ("ENVIRONMENT", "production"),
        ]))
        .unwrap();
        assert!(config.is_production());
    }
}
