//! Configuration for gramophone.

use secrecy::{ExposeSecret, SecretString};

use crate::error::ConfigError;

/// Default embedded database file, relative to the working directory.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://gramophone.db";

/// Main configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            database: DatabaseConfig::from_env()?,
        })
    }
}

/// Which storage backend a database URL selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbKind {
    /// Embedded file (or in-memory) relational database.
    Sqlite,
    /// Remote key-value store.
    Redis,
    /// Remote relational service.
    Postgres,
}

impl std::fmt::Display for DbKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DbKind::Sqlite => "sqlite",
            DbKind::Redis => "redis",
            DbKind::Postgres => "postgres",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for DbKind {
    type Err = String;

    /// Classify a database URL by its scheme. A bare path counts as SQLite.
    fn from_str(url: &str) -> Result<Self, Self::Err> {
        let url = url.trim();
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            return Ok(DbKind::Postgres);
        }
        if url.starts_with("redis://") || url.starts_with("rediss://") {
            return Ok(DbKind::Redis);
        }
        if url.starts_with("sqlite:") || url == ":memory:" {
            return Ok(DbKind::Sqlite);
        }
        match url.split_once("://") {
            Some((scheme, _)) => Err(format!(
                "unsupported database scheme '{}', expected sqlite, redis or postgres",
                scheme
            )),
            None => Ok(DbKind::Sqlite),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: SecretString,
    pub pool_size: usize,
    /// Namespace prepended to every key the key-value backend writes.
    pub key_prefix: String,
}

impl DatabaseConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let url = optional_env("DATABASE_URL")?.unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let pool_size = parse_optional_env("DATABASE_POOL_SIZE", 10usize)?;
        if pool_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "DATABASE_POOL_SIZE".to_string(),
                message: "must be a positive integer".to_string(),
            });
        }

        let config = Self {
            url: SecretString::from(url),
            pool_size,
            key_prefix: optional_env("REDIS_KEY_PREFIX")?.unwrap_or_default(),
        };

        // Fail at startup, not on first use.
        config.kind()?;
        Ok(config)
    }

    /// Configuration pointing at `url` with defaults for everything else.
    pub fn for_test(url: &str) -> Self {
        Self {
            url: SecretString::from(url.to_string()),
            pool_size: 2,
            key_prefix: String::new(),
        }
    }

    /// Set the key-value namespace.
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Get the database URL (exposes the secret).
    pub fn url(&self) -> &str {
        self.url.expose_secret()
    }

    /// Backend selected by the URL scheme.
    pub fn kind(&self) -> Result<DbKind, ConfigError> {
        self.url()
            .parse()
            .map_err(|message| ConfigError::InvalidValue {
                key: "DATABASE_URL".to_string(),
                message,
            })
    }
}

// Helper functions

fn optional_env(key: &str) -> Result<Option<String>, ConfigError> {
    match std::env::var(key) {
        Ok(val) if val.is_empty() => Ok(None),
        Ok(val) => Ok(Some(val)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(ConfigError::ParseError(format!(
            "failed to read {key}: {e}"
        ))),
    }
}

fn parse_optional_env<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    optional_env(key)?
        .map(|s| {
            s.parse().map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("{e}"),
            })
        })
        .transpose()
        .map(|opt| opt.unwrap_or(default))
}
