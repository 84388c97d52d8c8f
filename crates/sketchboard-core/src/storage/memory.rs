//! Process-local scene storage.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use crate::scene::Scene;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// A saved scene as the file backend would see it: its JSON form plus the
/// stamp used for ordering.
struct Snapshot {
    json: String,
    updated_at_ms: u64,
}

/// Keeps scenes in memory, for tests and throwaway servers.
///
/// Scenes are stored serialized, so `load` re-validates exactly like
/// [`FileStorage`](super::FileStorage) and callers never share a copy.
/// `list` returns ids newest first.
#[derive(Default)]
pub struct MemoryStorage {
    snapshots: RwLock<HashMap<String, Snapshot>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: PoisonError<T>) -> StorageError {
    StorageError::Other("memory storage lock poisoned".into())
}

impl Storage for MemoryStorage {
    fn save(&self, scene: &Scene) -> BoxFuture<'_, StorageResult<()>> {
        let id = scene.id().to_string();
        let snapshot = scene
            .to_json()
            .map(|json| Snapshot {
                json,
                updated_at_ms: scene.updated_at_ms(),
            })
            .map_err(|e| StorageError::Serialization(e.to_string()));

        Box::pin(async move {
            let snapshot = snapshot?;
            self.snapshots.write().map_err(poisoned)?.insert(id, snapshot);
            Ok(())
        })
    }

    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<Scene>> {
        let id = id.to_string();
        Box::pin(async move {
            let snapshots = self.snapshots.read().map_err(poisoned)?;
            let snapshot = snapshots.get(&id).ok_or_else(|| StorageError::NotFound(id.clone()))?;
            Scene::from_json(&snapshot.json).map_err(|e| StorageError::Serialization(format!("{id}: {e}")))
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        Box::pin(async move {
            self.snapshots.write().map_err(poisoned)?.remove(&id);
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move {
            let snapshots = self.snapshots.read().map_err(poisoned)?;
            let mut entries: Vec<_> = snapshots.iter().map(|(id, s)| (s.updated_at_ms, id.clone())).collect();
            entries.sort_by(|a, b| b.cmp(a));
            Ok(entries.into_iter().map(|(_, id)| id).collect())
        })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let id = id.to_string();
        Box::pin(async move { Ok(self.snapshots.read().map_err(poisoned)?.contains_key(&id)) })
    }
}
