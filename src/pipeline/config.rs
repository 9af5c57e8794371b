//! Pipeline configuration from environment variables

use super::error::ConfigError;
use std::env;
use std::time::Duration;

/// Configuration for the storyflow runtime
///
/// Loaded from environment variables with sensible defaults. Only the token
/// signing secret is mandatory.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Path to SQLite database file
    pub db_path: String,

    /// Secret used to sign and verify bearer tokens
    pub jwt_secret: String,

    /// Listening host
    pub bind_addr: String,

    /// Listening port
    pub port: u16,

    /// Candidate ids taken from the source per cycle
    pub fetch_batch_size: usize,

    /// Ingestion cycle period in milliseconds
    pub ingest_interval_ms: u64,

    /// Page cache TTL in milliseconds
    pub cache_ttl_ms: u64,

    /// Deadline for a single source request in milliseconds
    pub fetch_timeout_ms: u64,

    /// Base URL of the story source API
    pub source_base_url: String,

    pub admin_username: String,
    pub admin_password: String,

    /// Bearer token lifetime in seconds
    pub token_ttl_secs: u64,
}

impl PipelineConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `STORYFLOW_DB_PATH` (default: data/storyflow.db)
    /// - `JWT_SECRET` (required)
    /// - `STORYFLOW_BIND_ADDR` (default: 0.0.0.0)
    /// - `PORT` (default: 3000)
    /// - `FETCH_BATCH_SIZE` (default: 10)
    /// - `INGEST_INTERVAL_MS` (default: 300000)
    /// - `CACHE_TTL_MS` (default: 300000)
    /// - `FETCH_TIMEOUT_MS` (default: 10000)
    /// - `HN_API_BASE_URL` (default: https://hacker-news.firebaseio.com/v0)
    /// - `ADMIN_USERNAME` / `ADMIN_PASSWORD` (default: admin / password)
    /// - `TOKEN_TTL_SECS` (default: 3600)
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| ConfigError::MissingVariable("JWT_SECRET".to_string()))?;

        if jwt_secret.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "JWT_SECRET must not be empty".to_string(),
            ));
        }

        let source_base_url = env::var("HN_API_BASE_URL")
            .unwrap_or_else(|_| "https://hacker-news.firebaseio.com/v0".to_string())
            .trim_end_matches('/')
            .to_string();

        if !source_base_url.starts_with("http://") && !source_base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "HN_API_BASE_URL must start with http:// or https://".to_string(),
            ));
        }

        let fetch_batch_size = parse_or("FETCH_BATCH_SIZE", 10usize)?;
        if fetch_batch_size == 0 {
            return Err(ConfigError::InvalidValue(
                "FETCH_BATCH_SIZE must be at least 1".to_string(),
            ));
        }

        let ingest_interval_ms = parse_or("INGEST_INTERVAL_MS", 300_000u64)?;
        if ingest_interval_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "INGEST_INTERVAL_MS must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            db_path: env::var("STORYFLOW_DB_PATH")
                .unwrap_or_else(|_| "data/storyflow.db".to_string()),
            jwt_secret,
            bind_addr: env::var("STORYFLOW_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_or("PORT", 3000u16)?,
            fetch_batch_size,
            ingest_interval_ms,
            cache_ttl_ms: parse_or("CACHE_TTL_MS", 300_000u64)?,
            fetch_timeout_ms: parse_or("FETCH_TIMEOUT_MS", 10_000u64)?,
            source_base_url,
            admin_username: env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string()),
            admin_password: env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "password".to_string()),
            token_ttl_secs: parse_or("TOKEN_TTL_SECS", 3600u64)?,
        })
    }

    pub fn ingest_interval(&self) -> Duration {
        Duration::from_millis(self.ingest_interval_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

/// Parse an optional variable, falling back to `default` when unset.
/// A set-but-unparseable value is an error rather than a silent default.
fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(format!("{}='{}'", name, raw))),
        Err(_) => Ok(default),
    }
}
