//! Redis key-value backend for the changelog store.
//!
//! Layout:
//!
//! - `changelog:<id>`: hash holding one record in storage form
//! - `repo:<url>`: sorted set of record ids, scored by `generatedat` (epoch ms)
//!
//! Both are optionally namespaced by `REDIS_KEY_PREFIX`.
//!
//! A delete removes the hash and then the index entry with two separate
//! commands. If the process dies between them the index keeps an orphaned id;
//! readers skip it with a warning and nothing reconciles it.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use uuid::Uuid;

use crate::changelog::record::storage_name;
use crate::changelog::timestamp::{epoch_millis, now_iso};
use crate::changelog::{NewChangelogInput, StorageRecord, to_storage_form};
use crate::config::{DatabaseConfig, DbKind};
use crate::error::DatabaseError;
use crate::history::backend::ChangelogBackend;

const RECORD_NAMESPACE: &str = "changelog:";
const INDEX_NAMESPACE: &str = "repo:";

/// Redis-backed store.
pub struct RedisStore {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisStore {
    /// Connect to Redis. The connection manager reconnects on its own.
    pub async fn new(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let client = redis::Client::open(config.url())
            .map_err(|e| DatabaseError::Pool(format!("Invalid Redis URL: {}", e)))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| DatabaseError::Pool(e.to_string()))?;

        Ok(Self {
            conn,
            prefix: config.key_prefix.clone(),
        })
    }

    fn record_key(&self, id: &str) -> String {
        record_key(&self.prefix, id)
    }

    fn index_key(&self, url: &str) -> String {
        index_key(&self.prefix, url)
    }

    /// Fetch several hashes in one round trip. Vanished keys come back empty.
    async fn fetch_hashes(
        &self,
        keys: &[String],
    ) -> Result<Vec<HashMap<String, String>>, DatabaseError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let mut pipe = redis::pipe();
        for key in keys {
            pipe.hgetall(key);
        }
        let mut conn = self.conn.clone();
        let maps: Vec<HashMap<String, String>> = pipe.query_async(&mut conn).await?;
        Ok(maps)
    }
}

fn record_key(prefix: &str, id: &str) -> String {
    format!("{prefix}{RECORD_NAMESPACE}{id}")
}

fn index_key(prefix: &str, url: &str) -> String {
    format!("{prefix}{INDEX_NAMESPACE}{url}")
}

/// Repository URL of a stored hash, under either naming convention.
fn hash_repository(map: &HashMap<String, String>) -> Option<&String> {
    storage_name("repositoryUrl")
        .and_then(|name| map.get(name))
        .or_else(|| map.get("repositoryUrl"))
        .or_else(|| map.get("repoUrl"))
}

/// Newest first by parsed `generatedat`, then id descending.
fn compare_storage_desc(a: &StorageRecord, b: &StorageRecord) -> Ordering {
    let by_time = match (epoch_millis(&a.generatedat), epoch_millis(&b.generatedat)) {
        (Some(ta), Some(tb)) => tb.cmp(&ta),
        _ => b.generatedat.cmp(&a.generatedat),
    };
    by_time.then_with(|| b.id.cmp(&a.id))
}

#[async_trait]
impl ChangelogBackend for RedisStore {
    fn kind(&self) -> DbKind {
        DbKind::Redis
    }

    async fn initialize(&self) -> Result<(), DatabaseError> {
        // Nothing to create; make sure the server answers.
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        tracing::info!(prefix = %self.prefix, "Redis changelog store ready");
        Ok(())
    }

    async fn save(&self, input: &NewChangelogInput) -> Result<String, DatabaseError> {
        let score = epoch_millis(&input.generated_at).ok_or_else(|| {
            DatabaseError::Serialization(format!(
                "generatedat '{}' is not a timestamp",
                input.generated_at
            ))
        })?;

        let id = Uuid::new_v4().to_string();
        let stored = to_storage_form(input.clone().into_record(id.clone(), now_iso()));
        let fields = stored.fields();

        // Hash and index entry land together or not at all.
        let mut conn = self.conn.clone();
        let _: () = redis::pipe()
            .atomic()
            .hset_multiple(self.record_key(&id), &fields[..])
            .ignore()
            .zadd(self.index_key(&input.repository_url), &id, score as f64)
            .ignore()
            .query_async(&mut conn)
            .await?;

        tracing::debug!(id = %id, "Saved changelog");
        Ok(id)
    }

    async fn list_all(&self) -> Result<Vec<StorageRecord>, DatabaseError> {
        // Full keyspace scan; the repository index is not consulted.
        let mut conn = self.conn.clone();
        let pattern = format!("{}{RECORD_NAMESPACE}*", self.prefix);
        let keys: Vec<String> = conn.keys(pattern).await?;

        let mut records = Vec::with_capacity(keys.len());
        for map in self.fetch_hashes(&keys).await? {
            if map.is_empty() {
                continue;
            }
            records.push(StorageRecord::from_map(&map)?);
        }
        records.sort_by(compare_storage_desc);
        Ok(records)
    }

    async fn list_by_repository(&self, url: &str) -> Result<Vec<StorageRecord>, DatabaseError> {
        let mut conn = self.conn.clone();
        let ids: Vec<String> = conn.zrevrange(self.index_key(url), 0, -1).await?;
        let keys: Vec<String> = ids.iter().map(|id| self.record_key(id)).collect();

        let mut records = Vec::with_capacity(ids.len());
        for (id, map) in ids.iter().zip(self.fetch_hashes(&keys).await?) {
            if map.is_empty() {
                tracing::warn!(id = %id, repository = %url, "Orphaned repository index entry");
                continue;
            }
            records.push(StorageRecord::from_map(&map)?);
        }
        records.sort_by(compare_storage_desc);
        Ok(records)
    }

    async fn delete_by_id(&self, id: &str) -> Result<bool, DatabaseError> {
        let key = self.record_key(id);
        let mut conn = self.conn.clone();

        let map: HashMap<String, String> = conn.hgetall(&key).await?;
        if map.is_empty() {
            return Ok(false);
        }
        let repository = hash_repository(&map).cloned();

        let removed: i64 = conn.del(&key).await?;
        if removed == 0 {
            // Lost a race with another delete.
            return Ok(false);
        }

        // Second, independent removal. Not atomic with the DEL above.
        match repository {
            Some(url) => {
                let _: i64 = conn.zrem(self.index_key(&url), id).await?;
            }
            None => {
                tracing::warn!(id = %id, "Deleted changelog had no repository field; index entry left behind");
            }
        }

        tracing::debug!(id = %id, "Deleted changelog");
        Ok(true)
    }

    async fn count(&self) -> Result<u64, DatabaseError> {
        let mut conn = self.conn.clone();
        let pattern = format!("{}{RECORD_NAMESPACE}*", self.prefix);
        let keys: Vec<String> = conn.keys(pattern).await?;
        Ok(keys.len() as u64)
    }

    async fn close(&self) {
        // The connection manager closes when the store is dropped.
        tracing::debug!("Closed Redis changelog store");
    }
}
