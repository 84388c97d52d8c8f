//! Sketchboard Core Library
//!
//! The vector scene model and the operators that edit it: append, patch,
//! remove and proximity-based erase. Rendering lives in `sketchboard-render`.

pub mod assets;
pub mod color;
pub mod elements;
pub mod erase;
pub mod error;
pub mod geometry;
pub mod request;
pub mod scene;
pub mod storage;

pub use assets::{ASSET_URL_PREFIX, AssetError, AssetResult, AssetStore, FileAssetStore, MemoryAssetStore, asset_name};
pub use color::Color;
pub use elements::{Circle, Element, ElementId, HitTest, Image, ImageFormat, Path, Rectangle, Shape, Text};
pub use erase::{DEFAULT_ERASER_SIZE, EraseOutcome, erase};
pub use error::{SceneError, ValidationError};
pub use scene::{ImagePatch, Scene};
pub use storage::{BoxFuture, FileStorage, MemoryStorage, Storage, StorageError, StorageResult};

/// Re-exported so downstream crates share the same point type.
pub use kurbo::Point;
