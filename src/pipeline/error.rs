//! Error types for the ingestion pipeline and its collaborators

use thiserror::Error;

/// Failure while pulling data from the story source
///
/// Always contained to the id (or candidate list) that produced it.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("source returned status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("malformed response from {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("item {0} not found")]
    NotFound(i64),

    #[error("fetch timed out after {0}ms")]
    Timeout(u64),
}

/// Storage failure
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage lock poisoned")]
    Poisoned,
}

/// Why a bearer token was not accepted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthRejection {
    #[error("no bearer token supplied")]
    Missing,

    #[error("invalid token: {0}")]
    Invalid(String),
}

/// Invalid or missing configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}
