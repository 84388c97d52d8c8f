//! Server configuration parsed from environment variables.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    File,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: IpAddr,
    pub port: u16,
    pub data_dir: PathBuf,
    pub storage: StorageKind,
    pub max_upload_bytes: usize,
    pub fetch_timeout: Duration,
}

impl ServerConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `PORT`: default 8000
    /// - `SKETCHBOARD_BIND`: default `0.0.0.0`
    /// - `SKETCHBOARD_DATA_DIR`: default `<platform data dir>/sketchboard`
    /// - `SKETCHBOARD_STORAGE`: `file` (default) or `memory`
    /// - `SKETCHBOARD_MAX_UPLOAD_BYTES`: default 10 MiB
    /// - `SKETCHBOARD_FETCH_TIMEOUT_SECS`: default 10
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let data_dir = lookup("SKETCHBOARD_DATA_DIR")
            .filter(|v| !v.trim().is_empty())
            .map_or_else(default_data_dir, PathBuf::from);

        Self {
            bind: parse_or("SKETCHBOARD_BIND", lookup("SKETCHBOARD_BIND"), IpAddr::V4(Ipv4Addr::UNSPECIFIED)),
            port: parse_or("PORT", lookup("PORT"), DEFAULT_PORT),
            data_dir,
            storage: parse_storage(lookup("SKETCHBOARD_STORAGE").as_deref()),
            max_upload_bytes: parse_or(
                "SKETCHBOARD_MAX_UPLOAD_BYTES",
                lookup("SKETCHBOARD_MAX_UPLOAD_BYTES"),
                DEFAULT_MAX_UPLOAD_BYTES,
            ),
            fetch_timeout: Duration::from_secs(parse_or(
                "SKETCHBOARD_FETCH_TIMEOUT_SECS",
                lookup("SKETCHBOARD_FETCH_TIMEOUT_SECS"),
                DEFAULT_FETCH_TIMEOUT_SECS,
            )),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    pub fn canvas_dir(&self) -> PathBuf {
        self.data_dir.join("canvases")
    }

    pub fn asset_dir(&self) -> PathBuf {
        self.data_dir.join("assets")
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .map_or_else(|| PathBuf::from("sketchboard-data"), |base| base.join("sketchboard"))
}

fn parse_or<T: std::str::FromStr>(key: &str, raw: Option<String>, default: T) -> T {
    let Some(raw) = raw else {
        return default;
    };
    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            tracing::warn!(key, value = %raw, "unparseable setting, using default");
            default
        }
    }
}

fn parse_storage(raw: Option<&str>) -> StorageKind {
    match raw.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        None | Some("") | Some("file") => StorageKind::File,
        Some("memory") => StorageKind::Memory,
        Some(other) => {
            tracing::warn!(value = other, "unknown SKETCHBOARD_STORAGE, using file storage");
            StorageKind::File
        }
    }
}
