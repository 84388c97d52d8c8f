//! Binary asset store for uploaded images.
//!
//! Scenes only hold a url; the bytes behind `/assets/<name>` urls live here.

use crate::elements::ImageFormat;
use crate::storage::BoxFuture;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;
use thiserror::Error;
use uuid::Uuid;

/// Url prefix under which stored assets are addressed.
pub const ASSET_URL_PREFIX: &str = "/assets/";

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Asset not found: {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Asset error: {0}")]
    Other(String),
}

pub type AssetResult<T> = Result<T, AssetError>;

/// Content store that hands out stable urls for byte blobs.
pub trait AssetStore: Send + Sync {
    /// Store `bytes` and return the url it can be fetched from.
    fn put(&self, bytes: Vec<u8>, format: Option<ImageFormat>) -> BoxFuture<'_, AssetResult<String>>;

    /// Fetch the bytes behind a url previously returned by [`AssetStore::put`].
    fn get(&self, url: &str) -> BoxFuture<'_, AssetResult<Vec<u8>>>;
}

/// The asset name inside an `/assets/<name>` url, if it is one of ours.
///
/// Names are restricted to a single safe path component.
pub fn asset_name(url: &str) -> Option<&str> {
    let name = url.strip_prefix(ASSET_URL_PREFIX)?;
    let safe = !name.is_empty()
        && !name.starts_with('.')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    safe.then_some(name)
}

fn new_name(format: Option<ImageFormat>) -> String {
    let ext = format.map_or("bin", |f| f.extension());
    format!("{}.{}", Uuid::new_v4(), ext)
}

/// In-memory asset store.
#[derive(Default)]
pub struct MemoryAssetStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored assets.
    pub fn len(&self) -> usize {
        self.blobs.read().map_or(0, |blobs| blobs.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lock_error(e: impl std::fmt::Display) -> AssetError {
    AssetError::Other(format!("Lock error: {}", e))
}

impl AssetStore for MemoryAssetStore {
    fn put(&self, bytes: Vec<u8>, format: Option<ImageFormat>) -> BoxFuture<'_, AssetResult<String>> {
        Box::pin(async move {
            let name = new_name(format);
            let mut blobs = self.blobs.write().map_err(lock_error)?;
            blobs.insert(name.clone(), bytes);
            Ok(format!("{ASSET_URL_PREFIX}{name}"))
        })
    }

    fn get(&self, url: &str) -> BoxFuture<'_, AssetResult<Vec<u8>>> {
        let url = url.to_string();
        Box::pin(async move {
            let name = asset_name(&url).ok_or_else(|| AssetError::NotFound(url.clone()))?;
            let blobs = self.blobs.read().map_err(lock_error)?;
            blobs.get(name).cloned().ok_or_else(|| AssetError::NotFound(url.clone()))
        })
    }
}

/// Asset store backed by a directory of files named after the asset.
pub struct FileAssetStore {
    base_path: PathBuf,
}

impl FileAssetStore {
    /// Creates the directory if it doesn't exist.
    pub fn new(base_path: PathBuf) -> AssetResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path)
                .map_err(|e| AssetError::Io(format!("Failed to create asset directory: {}", e)))?;
        }
        Ok(Self { base_path })
    }
}

impl AssetStore for FileAssetStore {
    fn put(&self, bytes: Vec<u8>, format: Option<ImageFormat>) -> BoxFuture<'_, AssetResult<String>> {
        let name = new_name(format);
        let path = self.base_path.join(&name);
        Box::pin(async move {
            fs::write(&path, bytes)
                .map_err(|e| AssetError::Io(format!("Failed to write {}: {}", path.display(), e)))?;
            log::debug!("stored asset {} at {}", name, path.display());
            Ok(format!("{ASSET_URL_PREFIX}{name}"))
        })
    }

    fn get(&self, url: &str) -> BoxFuture<'_, AssetResult<Vec<u8>>> {
        let url = url.to_string();
        let path = asset_name(&url).map(|name| self.base_path.join(name));
        Box::pin(async move {
            let path = path.ok_or_else(|| AssetError::NotFound(url.clone()))?;
            if !path.exists() {
                return Err(AssetError::NotFound(url));
            }
            fs::read(&path).map_err(|e| AssetError::Io(format!("Failed to read {}: {}", path.display(), e)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::block_on;
    use tempfile::tempdir;

    #[test]
    fn test_asset_name() {
        assert_eq!(asset_name("/assets/abc.png"), Some("abc.png"));
        assert_eq!(asset_name("/assets/../etc/passwd"), None);
        assert_eq!(asset_name("/assets/"), None);
        assert_eq!(asset_name("https://example.com/a.png"), None);
    }

    #[test]
    fn test_memory_put_get() {
        let store = MemoryAssetStore::new();
        let url = block_on(store.put(vec![1, 2, 3], Some(ImageFormat::Png))).unwrap();
        assert!(url.starts_with(ASSET_URL_PREFIX));
        assert!(url.ends_with(".png"));
        assert_eq!(block_on(store.get(&url)).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_memory_unknown_url() {
        let store = MemoryAssetStore::new();
        let result = block_on(store.get("/assets/missing.png"));
        assert!(matches!(result, Err(AssetError::NotFound(_))));
    }

    #[test]
    fn test_file_put_get() {
        let dir = tempdir().unwrap();
        let store = FileAssetStore::new(dir.path().to_path_buf()).unwrap();
        let url = block_on(store.put(b"jpeg bytes".to_vec(), Some(ImageFormat::Jpeg))).unwrap();
        assert!(url.ends_with(".jpg"));
        assert_eq!(block_on(store.get(&url)).unwrap(), b"jpeg bytes".to_vec());
    }

    #[test]
    fn test_file_rejects_foreign_url() {
        let dir = tempdir().unwrap();
        let store = FileAssetStore::new(dir.path().to_path_buf()).unwrap();
        let result = block_on(store.get("/assets/../secret"));
        assert!(matches!(result, Err(AssetError::NotFound(_))));
    }
}
