//! SQLite-backed snapshot store

use crate::store::SnapshotStore;
use crate::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

/// Snapshot bodies kept in the `snapshots` table
#[derive(Debug, Clone)]
pub struct SqliteSnapshotStore {
    pool: SqlitePool,
}

impl SqliteSnapshotStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Item count and last update time recorded with a snapshot
    pub async fn summary(&self, key: &str) -> Result<Option<(i64, String)>> {
        let row: Option<(i64, String)> =
            sqlx::query_as("SELECT item_count, updated_at FROM snapshots WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row)
    }
}

#[async_trait]
impl SnapshotStore for SqliteSnapshotStore {
    async fn load(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT body FROM snapshots WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(body,)| body))
    }

    async fn save(&self, key: &str, body: String, item_count: usize) -> Result<()> {
        sqlx::query(
            "INSERT INTO snapshots (key, body, item_count, updated_at) VALUES (?, ?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET
                body = excluded.body,
                item_count = excluded.item_count,
                updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(body)
        .bind(item_count as i64)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_database;
    use crate::models::{Album, Snapshot};
    use crate::store::{load_snapshot, save_snapshot};

    #[tokio::test]
    async fn test_missing_snapshot() {
        let store = SqliteSnapshotStore::new(memory_database().await.unwrap());
        assert!(store.load("songs").await.unwrap().is_none());
        assert!(store.summary("songs").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_overwrites_previous_body() {
        let store = SqliteSnapshotStore::new(memory_database().await.unwrap());

        let mut albums: Snapshot<Album> = Snapshot::new();
        albums.insert(1, Album { title: "Mezzanine".to_string(), ..Default::default() });
        save_snapshot(&store, "albums", &albums).await.unwrap();

        albums.insert(2, Album { title: "Protection".to_string(), ..Default::default() });
        save_snapshot(&store, "albums", &albums).await.unwrap();

        let loaded: Snapshot<Album> = load_snapshot(&store, "albums").await.unwrap();
        assert_eq!(loaded.len(), 2);

        let (count, updated_at) = store.summary("albums").await.unwrap().unwrap();
        assert_eq!(count, 2);
        assert!(!updated_at.is_empty());
    }
}
