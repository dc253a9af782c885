//! SQLite backend for the changelog store.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use uuid::Uuid;

use crate::changelog::record::FIELD_MAP;
use crate::changelog::{NewChangelogInput, StorageRecord};
use crate::config::{DatabaseConfig, DbKind};
use crate::error::DatabaseError;
use crate::history::backend::ChangelogBackend;

/// SQLite-backed store.
pub struct SqliteStore {
    pool: SqlitePool,
}

fn sqlite_path_from_url(url: &str) -> String {
    let url = url.trim();
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url);
    path.split('?').next().unwrap_or(path).to_string()
}

fn is_memory_path(path: &str) -> bool {
    path.is_empty() || path == "memory" || path == ":memory:"
}

/// `id AS id, repourl AS repourl, ...`
///
/// Aliases pin the result column names to the storage form even when the
/// table was created with mixed-case columns (`repoUrl`, `generatedAt`).
fn select_list() -> String {
    FIELD_MAP
        .iter()
        .map(|(_, s)| format!("{s} AS {s}"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl SqliteStore {
    /// Open (or create) the database file. Does not create the schema.
    pub async fn new(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let path = sqlite_path_from_url(config.url());

        // An in-memory database lives exactly as long as its connection, so the
        // pool holds a single connection that never expires.
        let (opts, max_connections) = if is_memory_path(&path) {
            let opts = SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DatabaseError::Pool(format!("Invalid SQLite path: {}", e)))?;
            (opts, 1)
        } else {
            let opts = SqliteConnectOptions::new()
                .filename(&path)
                .create_if_missing(true);
            (opts, config.pool_size.max(1) as u32)
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opts)
            .await
            .map_err(|e| DatabaseError::Pool(e.to_string()))?;

        tracing::debug!(path = %path, "Opened SQLite changelog store");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl ChangelogBackend for SqliteStore {
    fn kind(&self) -> DbKind {
        DbKind::Sqlite
    }

    async fn initialize(&self) -> Result<(), DatabaseError> {
        let stmts = [
            "CREATE TABLE IF NOT EXISTS changelogs (
                id TEXT PRIMARY KEY,
                repourl TEXT NOT NULL,
                content TEXT NOT NULL,
                generatedat TEXT NOT NULL,
                periodstart TEXT NOT NULL,
                periodend TEXT NOT NULL,
                createdat TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
            "CREATE INDEX IF NOT EXISTS idx_changelogs_repourl_generatedat
                ON changelogs (repourl, generatedat)",
        ];
        for stmt in stmts {
            sqlx::query(stmt)
                .execute(&self.pool)
                .await
                .map_err(|e| DatabaseError::Migration(e.to_string()))?;
        }
        tracing::info!("SQLite changelog schema ready");
        Ok(())
    }

    async fn save(&self, input: &NewChangelogInput) -> Result<String, DatabaseError> {
        // SQLite has no native id generation; mint one before the insert.
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO changelogs (id, repourl, content, generatedat, periodstart, periodend)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&input.repository_url)
        .bind(&input.content)
        .bind(&input.generated_at)
        .bind(&input.period_start)
        .bind(&input.period_end)
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::Query(e.to_string()))?;

        tracing::debug!(id = %id, "Saved changelog");
        Ok(id)
    }

    async fn list_all(&self) -> Result<Vec<StorageRecord>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM changelogs ORDER BY generatedat DESC, id DESC",
            select_list()
        );
        sqlx::query_as::<_, StorageRecord>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DatabaseError::Query(e.to_string()))
    }

    async fn list_by_repository(&self, url: &str) -> Result<Vec<StorageRecord>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM changelogs WHERE repourl = ? ORDER BY generatedat DESC, id DESC",
            select_list()
        );
        sqlx::query_as::<_, StorageRecord>(&sql)
            .bind(url)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DatabaseError::Query(e.to_string()))
    }

    async fn delete_by_id(&self, id: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM changelogs WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::Query(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<u64, DatabaseError> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM changelogs")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DatabaseError::Query(e.to_string()))?;
        Ok(n.max(0) as u64)
    }

    async fn close(&self) {
        self.pool.close().await;
        tracing::debug!("Closed SQLite changelog store");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_store() -> SqliteStore {
        let store = SqliteStore::new(&DatabaseConfig::for_test("sqlite::memory:"))
            .await
            .expect("open");
        store.initialize().await.expect("initialize");
        store
    }

    fn input(repo: &str, generated_at: &str) -> NewChangelogInput {
        NewChangelogInput {
            repository_url: repo.to_string(),
            content: "- fix".to_string(),
            generated_at: generated_at.to_string(),
            period_start: "2024-01-01".to_string(),
            period_end: "2024-01-31".to_string(),
        }
    }

    #[test]
    fn test_sqlite_path_from_url() {
        assert_eq!(sqlite_path_from_url("sqlite://gramophone.db"), "gramophone.db");
        assert_eq!(sqlite_path_from_url("sqlite:///tmp/g.db"), "/tmp/g.db");
        assert_eq!(sqlite_path_from_url("sqlite::memory:"), ":memory:");
        assert_eq!(sqlite_path_from_url("sqlite://"), "");
        assert_eq!(sqlite_path_from_url("sqlite://g.db?mode=rwc"), "g.db");
        assert_eq!(sqlite_path_from_url("/var/g.db"), "/var/g.db");
        assert!(is_memory_path(&sqlite_path_from_url("sqlite://")));
    }

    #[test]
    fn test_select_list_aliases_every_column() {
        assert_eq!(
            select_list(),
            "id AS id, repourl AS repourl, content AS content, generatedat AS generatedat, \
             periodstart AS periodstart, periodend AS periodend, createdat AS createdat"
        );
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let store = memory_store().await;
        store.initialize().await.expect("second initialize");
        store.initialize().await.expect("third initialize");
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_created_at_is_assigned_by_the_database() {
        let store = memory_store().await;
        let id = store
            .save(&input("https://github.com/a/b", "2024-02-01T00:00:00Z"))
            .await
            .unwrap();
        let rows = store.list_all().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, id);
        assert!(rows[0].createdat.ends_with('Z'));
        assert!(crate::changelog::timestamp::parse_timestamp(&rows[0].createdat).is_some());
    }

    #[tokio::test]
    async fn test_reads_mixed_case_legacy_table() {
        let store = SqliteStore::new(&DatabaseConfig::for_test("sqlite::memory:"))
            .await
            .unwrap();
        sqlx::query(
            "CREATE TABLE changelogs (
                id TEXT PRIMARY KEY,
                repoUrl TEXT NOT NULL,
                content TEXT NOT NULL,
                generatedAt TEXT NOT NULL,
                periodStart TEXT NOT NULL,
                periodEnd TEXT NOT NULL,
                createdAt TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
        )
        .execute(store.pool())
        .await
        .unwrap();
        store.initialize().await.expect("initialize over legacy table");

        store
            .save(&input("https://github.com/a/b", "2024-01-01T00:00:00Z"))
            .await
            .unwrap();
        let rows = store.list_by_repository("https://github.com/a/b").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].repourl, "https://github.com/a/b");
        assert_eq!(rows[0].generatedat, "2024-01-01T00:00:00Z");
    }

    #[tokio::test]
    async fn test_delete_reports_absence() {
        let store = memory_store().await;
        assert!(!store.delete_by_id("missing").await.unwrap());
        let id = store
            .save(&input("https://github.com/a/b", "2024-01-01"))
            .await
            .unwrap();
        assert!(store.delete_by_id(&id).await.unwrap());
        assert!(!store.delete_by_id(&id).await.unwrap());
    }
}
