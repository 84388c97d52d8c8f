//! Image asset prefetch and decoding.

use futures_util::future::join_all;
use sketchboard_core::{AssetError, AssetStore, BoxFuture, Scene, Shape};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Source of image bytes for the urls referenced by a scene.
pub trait AssetFetcher: Send + Sync {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>, AssetError>>;
}

impl<T: AssetStore + ?Sized> AssetFetcher for T {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>, AssetError>> {
        self.get(url)
    }
}

/// A decoded image as straight-alpha RGBA8 pixels, row-major.
#[derive(Clone, PartialEq, Eq)]
pub struct DecodedImage {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl DecodedImage {
    /// Wrap raw RGBA8 pixels. Returns `None` if the buffer size doesn't match.
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Option<Self> {
        let expected = (width as usize).checked_mul(height as usize)?.checked_mul(4)?;
        (rgba.len() == expected && expected > 0).then_some(Self { width, height, rgba })
    }

    /// Decode PNG, JPEG or WebP bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, image::ImageError> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Self {
            width,
            height,
            rgba: rgba.into_raw(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    /// Whether any pixel is not fully opaque.
    pub fn has_alpha(&self) -> bool {
        self.rgba.chunks_exact(4).any(|px| px[3] != 255)
    }

    /// Color channels without alpha.
    pub fn rgb(&self) -> Vec<u8> {
        self.rgba.chunks_exact(4).flat_map(|px| [px[0], px[1], px[2]]).collect()
    }

    /// The alpha channel alone.
    pub fn alpha(&self) -> Vec<u8> {
        self.rgba.chunks_exact(4).map(|px| px[3]).collect()
    }
}

impl fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

/// Decoded images keyed by url.
#[derive(Debug, Clone, Default)]
pub struct ImageCache {
    images: HashMap<String, Arc<DecodedImage>>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, url: impl Into<String>, image: DecodedImage) {
        self.images.insert(url.into(), Arc::new(image));
    }

    pub fn get(&self, url: &str) -> Option<&Arc<DecodedImage>> {
        self.images.get(url)
    }

    pub fn contains(&self, url: &str) -> bool {
        self.images.contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Distinct image urls of a scene, in first-use order.
pub fn image_urls(scene: &Scene) -> Vec<&str> {
    let mut seen = HashSet::new();
    scene
        .iter()
        .filter_map(|element| match &element.shape {
            Shape::Image(image) => Some(image.url.as_str()),
            _ => None,
        })
        .filter(|url| seen.insert(*url))
        .collect()
}

/// Fetch and decode every image the scene references, concurrently.
///
/// Urls that fail to fetch or decode are logged and left out of the cache;
/// renderers skip the elements that use them.
pub async fn prefetch_images(scene: &Scene, fetcher: &dyn AssetFetcher) -> ImageCache {
    let urls = image_urls(scene);
    let fetched = join_all(urls.iter().map(|url| async move { (*url, fetcher.fetch(url).await) })).await;

    let mut cache = ImageCache::new();
    for (url, result) in fetched {
        let bytes = match result {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("skipping image {}: {}", url, e);
                continue;
            }
        };
        match DecodedImage::decode(&bytes) {
            Ok(image) => cache.insert(url, image),
            Err(e) => log::warn!("skipping image {}: decode failed: {}", url, e),
        }
    }
    log::debug!("prefetched {}/{} images for scene {}", cache.len(), urls.len(), scene.id());
    cache
}
