//! Shared application state.
//!
//! `AppState` is injected into handlers via the `State` extractor. The core
//! operators are pure and do no locking, so every read-modify-write of a
//! canvas goes through [`AppState::update_canvas`], which serializes
//! mutations per canvas id.

use crate::config::{ServerConfig, StorageKind};
use crate::error::ApiError;
use crate::fetch::HttpFetcher;
use dashmap::DashMap;
use sketchboard_core::{
    AssetStore, FileAssetStore, FileStorage, MemoryAssetStore, MemoryStorage, Scene, Storage,
};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub assets: Arc<dyn AssetStore>,
    pub fetcher: Arc<HttpFetcher>,
    pub max_upload_bytes: usize,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

/// Milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

impl AppState {
    pub fn new(
        storage: Arc<dyn Storage>,
        assets: Arc<dyn AssetStore>,
        fetch_timeout: Duration,
        max_upload_bytes: usize,
    ) -> Result<Self, ApiError> {
        let fetcher = HttpFetcher::new(Arc::clone(&assets), fetch_timeout, max_upload_bytes)
            .map_err(|e| ApiError::BadRequest(format!("http client: {e}")))?;
        Ok(Self {
            storage,
            assets,
            fetcher: Arc::new(fetcher),
            max_upload_bytes,
            locks: Arc::new(DashMap::new()),
        })
    }

    /// Wire up the storage backends named by `config`.
    pub fn from_config(config: &ServerConfig) -> Result<Self, ApiError> {
        let (storage, assets): (Arc<dyn Storage>, Arc<dyn AssetStore>) = match config.storage {
            StorageKind::Memory => (Arc::new(MemoryStorage::new()), Arc::new(MemoryAssetStore::new())),
            StorageKind::File => (
                Arc::new(FileStorage::new(config.canvas_dir())?),
                Arc::new(FileAssetStore::new(config.asset_dir())?),
            ),
        };
        Self::new(storage, assets, config.fetch_timeout, config.max_upload_bytes)
    }

    /// In-memory state for tests.
    #[cfg(test)]
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(MemoryAssetStore::new()),
            Duration::from_secs(1),
            crate::config::DEFAULT_MAX_UPLOAD_BYTES,
        )
        .expect("in-memory state")
    }

    fn canvas_lock(&self, id: &str) -> Arc<Mutex<()>> {
        Arc::clone(self.locks.entry(id.to_string()).or_default().value())
    }

    /// Persist a brand-new canvas.
    pub async fn create_canvas(&self, mut scene: Scene) -> Result<Scene, ApiError> {
        scene.touch(now_ms());
        self.storage.save(&scene).await?;
        Ok(scene)
    }

    /// Load, modify and save one canvas while holding its lock.
    ///
    /// If `apply` fails nothing is saved.
    pub async fn update_canvas<T, F>(&self, id: &str, apply: F) -> Result<(Scene, T), ApiError>
    where
        F: FnOnce(&mut Scene) -> Result<T, ApiError> + Send,
        T: Send,
    {
        let lock = self.canvas_lock(id);
        let result: Result<(Scene, T), ApiError> = async {
            let _guard = lock.lock().await;
            let mut scene = self.storage.load(id).await?;
            let output = apply(&mut scene)?;
            scene.touch(now_ms());
            self.storage.save(&scene).await?;
            Ok((scene, output))
        }
        .await;

        drop(lock);
        self.release_lock(id);
        result
    }

    /// Drop the lock entry for `id` unless another request still holds it.
    fn release_lock(&self, id: &str) {
        self.locks.remove_if(id, |_, lock| Arc::strong_count(lock) == 1);
    }
}
