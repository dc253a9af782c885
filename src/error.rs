//! Error types for gramophone.

use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required configuration {key}: {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("failed to parse configuration: {0}")]
    ParseError(String),
}

/// Storage backend failures (I/O, connectivity, constraint, malformed stored data).
///
/// These never reach callers of the service directly; see [`ChangelogError`].
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("connection pool error: {0}")]
    Pool(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("schema initialization failed: {0}")]
    Migration(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("malformed stored record: {0}")]
    Record(#[from] RecordError),

    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("postgres pool error: {0}")]
    PoolError(#[from] deadpool_postgres::PoolError),

    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Structural failures of the canonical/storage mapping.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("required field '{0}' is absent")]
    MissingField(&'static str),
}

/// Input rejected before any storage access.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("required field '{0}' is missing or blank")]
    Missing(&'static str),

    #[error("field '{field}' is not a valid timestamp: {value}")]
    InvalidTimestamp { field: &'static str, value: String },

    #[error("malformed request body: {0}")]
    MalformedBody(String),
}

/// Service-level failure. Carries a stable code and a generic message only.
#[derive(Debug, Error)]
pub enum ChangelogError {
    #[error("invalid changelog input: {0}")]
    Validation(#[from] ValidationError),

    #[error("failed to create changelog")]
    CreateFailed,

    #[error("failed to fetch changelogs")]
    ListFailed,

    #[error("failed to delete changelog")]
    DeleteFailed,
}

impl ChangelogError {
    /// Stable, operation-scoped error code.
    pub fn code(&self) -> &'static str {
        match self {
            ChangelogError::Validation(_) => "VALIDATION_FAILED",
            ChangelogError::CreateFailed => "CREATE_FAILED",
            ChangelogError::ListFailed => "LIST_FAILED",
            ChangelogError::DeleteFailed => "DELETE_FAILED",
        }
    }

    /// HTTP-level status the presentation layer should answer with.
    pub fn status(&self) -> u16 {
        match self {
            ChangelogError::Validation(_) => 400,
            _ => 500,
        }
    }
}
