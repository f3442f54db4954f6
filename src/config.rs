//! Service configuration from the environment.
//!
//! Values are read from process environment variables, optionally seeded
//! from a `.env` file in the working directory.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_HTTP_ADDRESS: &str = "0.0.0.0:8080";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 5;
const DEFAULT_DATABASE_PATH: &str = "pr-reviewer.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(key: &'static str, value: &str, reason: impl ToString) -> Self {
        Self::InvalidValue {
            key,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Deployment environment; selects the default log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppEnv {
    #[default]
    Local,
    Dev,
    Prod,
}

impl AppEnv {
    /// Log filter used when `RUST_LOG` is not set.
    pub fn default_log_level(&self) -> &'static str {
        match self {
            Self::Local | Self::Dev => "debug",
            Self::Prod => "info",
        }
    }
}

impl FromStr for AppEnv {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "dev" => Ok(Self::Dev),
            "prod" => Ok(Self::Prod),
            _ => Err("expected one of local, dev, prod".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub app_env: AppEnv,
    pub http_address: SocketAddr,
    pub request_timeout: Duration,
    pub database_path: PathBuf,
    pub database_max_connections: u32,
}

impl Config {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Unset or blank keys fall
    /// back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let app_env = parse_or("APP_ENV", get("APP_ENV"), AppEnv::default())?;
        let http_address: SocketAddr = parse_or(
            "HTTP_ADDRESS",
            get("HTTP_ADDRESS"),
            DEFAULT_HTTP_ADDRESS
                .parse()
                .map_err(|e| ConfigError::invalid("HTTP_ADDRESS", DEFAULT_HTTP_ADDRESS, e))?,
        )?;

        let timeout_secs: u64 = parse_or(
            "HTTP_REQUEST_TIMEOUT_SECS",
            get("HTTP_REQUEST_TIMEOUT_SECS"),
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;
        if timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "HTTP_REQUEST_TIMEOUT_SECS",
                "0",
                "must be positive",
            ));
        }

        let database_max_connections: u32 = parse_or(
            "DATABASE_MAX_CONNECTIONS",
            get("DATABASE_MAX_CONNECTIONS"),
            DEFAULT_MAX_CONNECTIONS,
        )?;
        if database_max_connections == 0 {
            return Err(ConfigError::invalid(
                "DATABASE_MAX_CONNECTIONS",
                "0",
                "must be positive",
            ));
        }

        let database_path = get("DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH));

        Ok(Self {
            app_env,
            http_address,
            request_timeout: Duration::from_secs(timeout_secs),
            database_path,
            database_max_connections,
        })
    }
}

fn parse_or<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
{
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::invalid(key, &value, e)),
        None => Ok(default),
    }
}

/// Initialise `env_logger`. `RUST_LOG` wins over the environment default.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logger(app_env: AppEnv) {
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(app_env.default_log_level()),
    )
    .try_init();
}
