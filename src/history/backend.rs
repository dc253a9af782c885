//! Capability trait implemented by every changelog storage backend.

use async_trait::async_trait;

use crate::changelog::{NewChangelogInput, StorageRecord};
use crate::config::DbKind;
use crate::error::DatabaseError;

/// Persistence for changelog records (SQLite, Redis, or Postgres).
///
/// Backends speak the storage form; the service owns the translation to
/// canonical records. Every method may suspend on I/O.
#[async_trait]
pub trait ChangelogBackend: Send + Sync {
    /// Which variant this is.
    fn kind(&self) -> DbKind;

    /// Create tables, indexes, or whatever the variant needs. Idempotent.
    async fn initialize(&self) -> Result<(), DatabaseError>;

    /// Persist a new record with a fresh id and a backend-assigned `createdat`.
    /// Returns the id.
    async fn save(&self, input: &NewChangelogInput) -> Result<String, DatabaseError>;

    /// Every stored record, `generatedat` descending.
    async fn list_all(&self) -> Result<Vec<StorageRecord>, DatabaseError>;

    /// Records for one repository, `generatedat` descending.
    async fn list_by_repository(&self, url: &str) -> Result<Vec<StorageRecord>, DatabaseError>;

    /// Remove a record. `Ok(false)` when no record had that id.
    async fn delete_by_id(&self, id: &str) -> Result<bool, DatabaseError>;

    /// Number of stored records.
    async fn count(&self) -> Result<u64, DatabaseError>;

    /// Release pools and connections. The backend must not be used afterwards.
    async fn close(&self);
}
