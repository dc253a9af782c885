//! PostgreSQL backend for the changelog store.

use async_trait::async_trait;
use deadpool_postgres::{Config, Pool, Runtime};
use tokio_postgres::{NoTls, Row};

use crate::changelog::{NewChangelogInput, StorageRecord};
use crate::config::{DatabaseConfig, DbKind};
use crate::error::DatabaseError;
use crate::history::backend::ChangelogBackend;

/// Timestamps leave the server as ISO-8601 UTC text, never in binary form.
const SELECT_COLUMNS: &str = r#"
    id,
    repourl,
    content,
    to_char(generatedat AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS.MS"Z"') AS generatedat,
    to_char(periodstart AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS.MS"Z"') AS periodstart,
    to_char(periodend AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS.MS"Z"') AS periodend,
    to_char(createdat AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS.MS"Z"') AS createdat
"#;

/// PostgreSQL-backed store.
pub struct PostgresStore {
    pool: Pool,
}

impl PostgresStore {
    /// Create a new store and connect to the database.
    pub async fn new(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let pool = pool_config(config)
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| DatabaseError::Pool(e.to_string()))?;

        let _ = pool.get().await?;

        Ok(Self { pool })
    }

    /// Get a connection from the pool.
    pub async fn conn(&self) -> Result<deadpool_postgres::Object, DatabaseError> {
        Ok(self.pool.get().await?)
    }
}

/// Pool settings. Every session runs in UTC so untagged timestamp text is
/// read the same way the service parsed it.
fn pool_config(config: &DatabaseConfig) -> Config {
    let mut cfg = Config::new();
    cfg.url = Some(config.url().to_string());
    cfg.options = Some("-c TimeZone=UTC".to_string());
    cfg.pool = Some(deadpool_postgres::PoolConfig {
        max_size: config.pool_size,
        ..Default::default()
    });
    cfg
}

fn row_to_storage(row: &Row) -> StorageRecord {
    StorageRecord {
        id: row.get("id"),
        repourl: row.get("repourl"),
        content: row.get("content"),
        generatedat: row.get("generatedat"),
        periodstart: row.get("periodstart"),
        periodend: row.get("periodend"),
        createdat: row.get("createdat"),
    }
}

#[async_trait]
impl ChangelogBackend for PostgresStore {
    fn kind(&self) -> DbKind {
        DbKind::Postgres
    }

    async fn initialize(&self) -> Result<(), DatabaseError> {
        let conn = self.conn().await?;
        conn.batch_execute(
            r#"
            CREATE TABLE IF NOT EXISTS changelogs (
                id TEXT PRIMARY KEY DEFAULT gen_random_uuid()::text,
                repourl TEXT NOT NULL,
                content TEXT NOT NULL,
                generatedat TIMESTAMPTZ NOT NULL,
                periodstart TIMESTAMPTZ NOT NULL,
                periodend TIMESTAMPTZ NOT NULL,
                createdat TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            CREATE INDEX IF NOT EXISTS idx_changelogs_repourl ON changelogs (repourl);
            CREATE INDEX IF NOT EXISTS idx_changelogs_generatedat ON changelogs (generatedat DESC);
            "#,
        )
        .await
        .map_err(|e| DatabaseError::Migration(e.to_string()))?;

        tracing::info!("Postgres changelog schema ready");
        Ok(())
    }

    async fn save(&self, input: &NewChangelogInput) -> Result<String, DatabaseError> {
        let conn = self.conn().await?;

        let row = conn
            .query_one(
                r#"
                INSERT INTO changelogs (repourl, content, generatedat, periodstart, periodend)
                VALUES ($1, $2, $3::text::timestamptz, $4::text::timestamptz, $5::text::timestamptz)
                RETURNING id
                "#,
                &[
                    &input.repository_url,
                    &input.content,
                    &input.generated_at,
                    &input.period_start,
                    &input.period_end,
                ],
            )
            .await?;

        let id: String = row.get("id");
        tracing::debug!(id = %id, "Saved changelog");
        Ok(id)
    }

    async fn list_all(&self) -> Result<Vec<StorageRecord>, DatabaseError> {
        let conn = self.conn().await?;
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM changelogs ORDER BY changelogs.generatedat DESC, id DESC"
        );
        let rows = conn.query(sql.as_str(), &[]).await?;
        Ok(rows.iter().map(row_to_storage).collect())
    }

    async fn list_by_repository(&self, url: &str) -> Result<Vec<StorageRecord>, DatabaseError> {
        let conn = self.conn().await?;
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM changelogs WHERE repourl = $1 \
             ORDER BY changelogs.generatedat DESC, id DESC"
        );
        let rows = conn.query(sql.as_str(), &[&url]).await?;
        Ok(rows.iter().map(row_to_storage).collect())
    }

    async fn delete_by_id(&self, id: &str) -> Result<bool, DatabaseError> {
        let conn = self.conn().await?;
        let affected = conn
            .execute("DELETE FROM changelogs WHERE id = $1", &[&id])
            .await?;
        Ok(affected > 0)
    }

    async fn count(&self) -> Result<u64, DatabaseError> {
        let conn = self.conn().await?;
        let row = conn.query_one("SELECT COUNT(*) AS n FROM changelogs", &[]).await?;
        let n: i64 = row.get("n");
        Ok(n.max(0) as u64)
    }

    async fn close(&self) {
        self.pool.close();
        tracing::debug!("Closed Postgres changelog pool");
    }
}
