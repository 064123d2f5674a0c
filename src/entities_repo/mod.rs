// SQLite persistence of entity groups: an append-only history and a single "last known" row
// used as the baseline on the next start. Groups are stored as version-prefixed wincode BLOBs.

mod blob;

use crate::models::EntitiesGroup;
use serde::Serialize;
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tracing::instrument;

/// One history row.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredEntities {
    pub created_at: i64,
    pub entities: EntitiesGroup,
}

pub struct EntitiesRepo {
    pool: SqlitePool,
    retention_ms: i64,
}

impl EntitiesRepo {
    pub async fn connect(path: &str, retention_days: u32) -> anyhow::Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);
        let pool = SqlitePoolOptions::new().connect_with(opts).await?;
        let retention_ms = (retention_days as i64) * 24 * 60 * 60 * 1000;
        Ok(Self { pool, retention_ms })
    }

    pub async fn init(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS entities_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                created_at INTEGER NOT NULL,
                data BLOB NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_entities_history_created_at ON entities_history(created_at)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS last_entities (id INTEGER PRIMARY KEY CHECK (id = 1), updated_at INTEGER NOT NULL, data BLOB NOT NULL)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Last saved group, `None` on a fresh database.
    #[instrument(skip(self), fields(repo = "entities", operation = "load_last_entities"))]
    pub async fn load_last_entities(&self) -> anyhow::Result<Option<EntitiesGroup>> {
        let row = sqlx::query("SELECT data FROM last_entities WHERE id = 1")
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let data: Vec<u8> = row.try_get("data")?;
        Ok(Some(decode(&data)?))
    }

    /// Appends the group to the history table.
    #[instrument(skip(self, entities), fields(repo = "entities", operation = "save_entities_group", entities_count = entities.len()))]
    pub async fn save_entities_group(&self, entities: &EntitiesGroup) -> anyhow::Result<()> {
        let data = encode(entities)?;
        sqlx::query("INSERT INTO entities_history (created_at, data) VALUES ($1, $2)")
            .bind(now_ms()?)
            .bind(&data)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Overwrites the "last known" row.
    #[instrument(skip(self, entities), fields(repo = "entities", operation = "save_last_entities_group", entities_count = entities.len()))]
    pub async fn save_last_entities_group(&self, entities: &EntitiesGroup) -> anyhow::Result<()> {
        let data = encode(entities)?;
        sqlx::query("INSERT OR REPLACE INTO last_entities (id, updated_at, data) VALUES (1, $1, $2)")
            .bind(now_ms()?)
            .bind(&data)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Most recent history rows, oldest first. Undecodable rows are skipped.
    pub async fn get_recent_entities(&self, limit: u32) -> anyhow::Result<Vec<StoredEntities>> {
        let rows = sqlx::query(
            "SELECT created_at, data FROM entities_history ORDER BY id DESC LIMIT $1",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let created_at: i64 = row.try_get("created_at")?;
            let data: Vec<u8> = row.try_get("data")?;
            match decode(&data) {
                Ok(entities) => out.push(StoredEntities {
                    created_at,
                    entities,
                }),
                Err(e) => {
                    tracing::debug!(error = %e, created_at, "skipping undecodable history row")
                }
            }
        }
        out.reverse();
        Ok(out)
    }

    /// Deletes history rows older than the retention window. Returns rows removed.
    #[instrument(skip(self), fields(repo = "entities", operation = "prune_old_data"))]
    pub async fn prune_old_data(&self) -> anyhow::Result<u64> {
        let cutoff = now_ms()? - self.retention_ms;
        let r = sqlx::query("DELETE FROM entities_history WHERE created_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(r.rows_affected())
    }

    pub async fn close(&self) -> anyhow::Result<()> {
        self.pool.close().await;
        Ok(())
    }

    #[cfg(test)]
    async fn insert_history_at(&self, created_at: i64, entities: &EntitiesGroup) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO entities_history (created_at, data) VALUES ($1, $2)")
            .bind(created_at)
            .bind(encode(entities)?)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn encode(entities: &EntitiesGroup) -> anyhow::Result<Vec<u8>> {
    let payload = wincode::serialize(entities).map_err(|e| anyhow::anyhow!("wincode: {}", e))?;
    Ok(blob::with_version_prefix(blob::BLOB_VERSION, payload))
}

fn decode(bytes: &[u8]) -> anyhow::Result<EntitiesGroup> {
    let payload = blob::blob_payload(bytes, blob::BLOB_VERSION)
        .ok_or_else(|| anyhow::anyhow!("unsupported entities blob version"))?;
    wincode::deserialize(payload).map_err(|e| anyhow::anyhow!("wincode deserialize entities: {}", e))
}

fn now_ms() -> anyhow::Result<i64> {
    Ok(std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)?
        .as_millis() as i64)
}
