//! Scenes as JSON files, one per canvas id.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use crate::scene::Scene;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

/// Stores scenes as `<sanitized id>.json` under a single directory.
pub struct FileStorage {
    base_path: PathBuf,
}

fn io_error(action: &str, path: &Path, err: io::Error) -> StorageError {
    StorageError::Io(format!("cannot {action} {}: {err}", path.display()))
}

impl FileStorage {
    /// Open (and create if missing) the canvas directory at `base_path`.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        fs::create_dir_all(&base_path).map_err(|e| io_error("create", &base_path, e))?;
        Ok(Self { base_path })
    }

    fn scene_path(&self, id: &str) -> PathBuf {
        let stem: String = id
            .chars()
            .map(|c| if c.is_alphanumeric() || matches!(c, '-' | '_') { c } else { '_' })
            .collect();
        self.base_path.join(stem).with_extension("json")
    }
}

impl Storage for FileStorage {
    fn save(&self, scene: &Scene) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.scene_path(scene.id());
        let encoded = scene.to_json().map_err(|e| StorageError::Serialization(e.to_string()));

        Box::pin(async move {
            // Readers only ever see the old file or the complete new one.
            let staging = path.with_extension("json.tmp");
            fs::write(&staging, encoded?).map_err(|e| io_error("write", &staging, e))?;
            fs::rename(&staging, &path).map_err(|e| io_error("replace", &path, e))?;
            log::debug!("saved scene to {}", path.display());
            Ok(())
        })
    }

    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<Scene>> {
        let path = self.scene_path(id);
        let id = id.to_string();

        Box::pin(async move {
            let json = match fs::read_to_string(&path) {
                Ok(json) => json,
                Err(e) if e.kind() == ErrorKind::NotFound => return Err(StorageError::NotFound(id)),
                Err(e) => return Err(io_error("read", &path, e)),
            };
            Scene::from_json(&json)
                .map_err(|e| StorageError::Serialization(format!("{}: {e}", path.display())))
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.scene_path(id);

        Box::pin(async move {
            match fs::remove_file(&path) {
                Err(e) if e.kind() != ErrorKind::NotFound => Err(io_error("delete", &path, e)),
                _ => Ok(()),
            }
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move {
            let entries = match fs::read_dir(&self.base_path) {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
                Err(e) => return Err(io_error("list", &self.base_path, e)),
            };

            Ok(entries
                .filter_map(Result::ok)
                .map(|entry| entry.path())
                .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
                .filter_map(|path| Some(path.file_stem()?.to_str()?.to_owned()))
                .collect())
        })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let path = self.scene_path(id);
        Box::pin(async move { Ok(path.is_file()) })
    }
}
