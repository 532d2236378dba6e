//! Snapshot persistence
//!
//! A [`SnapshotStore`] keeps opaque snapshot bodies by key. The typed
//! helpers [`load_snapshot`] and [`save_snapshot`] encode snapshots as JSON
//! on top of any store.

use crate::models::Snapshot;
use crate::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Key/blob persistence for collection snapshots
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load the body stored under `key`, `None` when nothing was saved yet
    async fn load(&self, key: &str) -> Result<Option<String>>;

    /// Replace the body stored under `key`
    async fn save(&self, key: &str, body: String, item_count: usize) -> Result<()>;
}

/// Load a typed snapshot, empty when the key was never saved
pub async fn load_snapshot<T, S>(store: &S, key: &str) -> Result<Snapshot<T>>
where
    T: DeserializeOwned,
    S: SnapshotStore + ?Sized,
{
    match store.load(key).await? {
        Some(body) => {
            let snapshot: Snapshot<T> = serde_json::from_str(&body)?;
            tracing::debug!(key, items = snapshot.len(), "Loaded snapshot");
            Ok(snapshot)
        }
        None => {
            tracing::debug!(key, "No stored snapshot, starting empty");
            Ok(Snapshot::new())
        }
    }
}

/// Persist a typed snapshot under `key`
pub async fn save_snapshot<T, S>(store: &S, key: &str, snapshot: &Snapshot<T>) -> Result<()>
where
    T: Serialize + Sync,
    S: SnapshotStore + ?Sized,
{
    let body = serde_json::to_string(snapshot)?;
    store.save(key, body, snapshot.len()).await?;
    tracing::debug!(key, items = snapshot.len(), "Saved snapshot");
    Ok(())
}

/// In-process store that keeps bodies for the lifetime of the value
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    bodies: Mutex<HashMap<String, String>>,
    saves: Mutex<usize>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `save` calls since creation
    pub async fn save_count(&self) -> usize {
        *self.saves.lock().await
    }

    /// Raw body stored under `key`
    pub async fn body(&self, key: &str) -> Option<String> {
        self.bodies.lock().await.get(key).cloned()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.bodies.lock().await.get(key).cloned())
    }

    async fn save(&self, key: &str, body: String, _item_count: usize) -> Result<()> {
        self.bodies.lock().await.insert(key.to_string(), body);
        *self.saves.lock().await += 1;
        Ok(())
    }
}
