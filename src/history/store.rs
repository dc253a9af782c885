//! Backend selection: builds the configured store from DATABASE_URL.

use std::sync::Arc;

use crate::config::{DatabaseConfig, DbKind};
use crate::error::DatabaseError;
use crate::history::backend::ChangelogBackend;
use crate::history::kv::RedisStore;
use crate::history::postgres::PostgresStore;
use crate::history::sqlite::SqliteStore;

/// Connect the backend chosen by the URL scheme.
///
/// Connecting never creates schema; call [`ChangelogBackend::initialize`]
/// once from the process bootstrap.
pub async fn connect(config: &DatabaseConfig) -> Result<Arc<dyn ChangelogBackend>, DatabaseError> {
    let kind = config.kind().map_err(|e| DatabaseError::Pool(e.to_string()))?;
    tracing::debug!(backend = %kind, "Connecting changelog store");
    let backend: Arc<dyn ChangelogBackend> = match kind {
        DbKind::Sqlite => Arc::new(SqliteStore::new(config).await?),
        DbKind::Redis => Arc::new(RedisStore::new(config).await?),
        DbKind::Postgres => Arc::new(PostgresStore::new(config).await?),
    };
    Ok(backend)
}
