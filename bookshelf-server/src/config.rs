//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BOOKSHELF_MONGODB_URL` - MongoDB connection string, only when `BOOKSHELF_STORE=mongodb`
//!
//! ## Optional
//! - `BOOKSHELF_HOST` - Bind address (default: 127.0.0.1)
//! - `BOOKSHELF_PORT` - Listen port (default: 3001)
//! - `BOOKSHELF_BASE_URL` - Public URL used in pagination links (default: http://localhost:3001)
//! - `BOOKSHELF_STORE` - `memory` or `mongodb` (default: memory)
//! - `BOOKSHELF_MONGODB_DATABASE` - Database name (default: bookshelf)
//! - `BOOKSHELF_DEFAULT_LIMIT` - Page size when a listing gives none (default: 10)
//! - `BOOKSHELF_MAX_LIMIT` - Largest page size a listing may request (default: 100)
//! - `BOOKSHELF_UNKNOWN_FILTERS` - `allow`, `ignore` or `reject` (default: ignore)
//! - `BOOKSHELF_LOG_FORMAT` - `pretty` or `json` (default: pretty)

use std::{
    fmt::Display,
    net::{IpAddr, SocketAddr},
    str::FromStr,
};

use bookshelf::querystring::{DEFAULT_LIMIT, UnknownFieldPolicy};
use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_MAX_LIMIT: usize = 100;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Which document store backs the server.
#[derive(Debug, Clone)]
pub enum StoreConfig {
    Memory,
    MongoDb {
        /// Connection string (may contain credentials)
        url: SecretString,
        database: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}' (expected pretty or json)")),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL, prefixed to pagination links
    pub base_url: String,
    pub store: StoreConfig,
    /// Page size used when a listing does not ask for one
    pub default_limit: usize,
    /// Upper bound on the page size a listing may ask for
    pub max_limit: usize,
    /// Handling of filters on fields a listing does not allow
    pub unknown_filters: UnknownFieldPolicy,
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: DEFAULT_PORT,
            base_url: format!("http://localhost:{DEFAULT_PORT}"),
            store: StoreConfig::Memory,
            default_limit: DEFAULT_LIMIT,
            max_limit: DEFAULT_MAX_LIMIT,
            unknown_filters: UnknownFieldPolicy::default(),
            log_format: LogFormat::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or a value does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    fn from_source(source: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let store = match get_env_or_default(&source, "BOOKSHELF_STORE", "memory")
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "memory" => StoreConfig::Memory,
            "mongodb" => StoreConfig::MongoDb {
                url: SecretString::from(get_required_env(&source, "BOOKSHELF_MONGODB_URL")?),
                database: get_env_or_default(&source, "BOOKSHELF_MONGODB_DATABASE", "bookshelf"),
            },
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "BOOKSHELF_STORE".to_string(),
                    format!("unknown store '{other}' (expected memory or mongodb)"),
                ));
            }
        };

        Ok(Self {
            host: parse_env(&source, "BOOKSHELF_HOST", defaults.host)?,
            port: parse_env(&source, "BOOKSHELF_PORT", defaults.port)?,
            base_url: get_env_or_default(&source, "BOOKSHELF_BASE_URL", &defaults.base_url)
                .trim_end_matches('/')
                .to_string(),
            store,
            default_limit: parse_env(&source, "BOOKSHELF_DEFAULT_LIMIT", defaults.default_limit)?,
            max_limit: parse_env(&source, "BOOKSHELF_MAX_LIMIT", defaults.max_limit)?,
            unknown_filters: parse_env(&source, "BOOKSHELF_UNKNOWN_FILTERS", defaults.unknown_filters)?,
            log_format: parse_env(&source, "BOOKSHELF_LOG_FORMAT", defaults.log_format)?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn get_optional_env(source: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    source(key).filter(|value| !value.trim().is_empty())
}

fn get_required_env(
    source: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<String, ConfigError> {
    get_optional_env(source, key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

fn get_env_or_default(
    source: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> String {
    get_optional_env(source, key).unwrap_or_else(|| default.to_string())
}

fn parse_env<T>(
    source: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match get_optional_env(source, key) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}
