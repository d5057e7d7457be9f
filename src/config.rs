use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("could not find env: {0}")]
    Missing(&'static str),
    #[error("could not parse env {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on handling one request; late requests get 408.
    pub request_timeout: Duration,
    pub shutdown_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub name: &'static str,
    pub version: &'static str,
    pub http: HttpConfig,
    pub database: DatabaseConfig,
    pub health_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup so tests don't have to
    /// touch the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let http = HttpConfig {
            host: required(&lookup, "HTTP_HOST")?,
            port: parse("HTTP_PORT", required(&lookup, "HTTP_PORT")?)?,
            request_timeout: Duration::from_secs(optional(&lookup, "REQUEST_TIMEOUT_SECS", 15)?),
            shutdown_timeout: Duration::from_secs(optional(&lookup, "SHUTDOWN_TIMEOUT_SECS", 15)?),
        };
        let database = DatabaseConfig {
            url: required(&lookup, "DATABASE_URL")?,
            max_connections: optional(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
        };
        Ok(Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            http,
            database,
            health_timeout: Duration::from_millis(optional(&lookup, "HEALTH_TIMEOUT_MS", 500)?),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.http.host, self.http.port)
    }
}

/// Blank values count as unset.
fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::Missing(name)),
    }
}

fn optional<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(v) if !v.trim().is_empty() => parse(name, v),
        _ => Ok(default),
    }
}

fn parse<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| ConfigError::Invalid { name, value })
}
