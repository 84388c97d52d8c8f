//! Image placed by reference to an external asset.

use crate::error::{ValidationError, finite, non_negative};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Encoded format of an image asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
    #[serde(rename = "webp")]
    WebP,
}

impl ImageFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::WebP => "image/webp",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::WebP => "webp",
        }
    }

    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "webp" => Some(ImageFormat::WebP),
            _ => None,
        }
    }

    /// Detect format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(ImageFormat::Png);
        }
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::WebP);
        }
        None
    }
}

/// A raster image drawn into a box on the canvas.
///
/// The pixels are not owned here; `url` names an asset that renderers fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<ImageFormat>,
}

impl Image {
    pub fn new(url: impl Into<String>, position: Point, width: f64, height: f64) -> Self {
        Self {
            x: position.x,
            y: position.y,
            width,
            height,
            url: url.into(),
            format: None,
        }
    }

    /// Shrink to fit within `max_width` x `max_height`, keeping the aspect ratio.
    ///
    /// Images that already fit are left at their size.
    pub fn fit_within(mut self, max_width: f64, max_height: f64) -> Self {
        if self.width <= 0.0 || self.height <= 0.0 {
            return self;
        }
        let scale = (max_width / self.width).min(max_height / self.height);
        if scale < 1.0 {
            self.width *= scale;
            self.height *= scale;
        }
        self
    }

    /// Position and size checks, without the url.
    pub fn validate_placement(&self) -> Result<(), ValidationError> {
        finite("x", self.x)?;
        finite("y", self.y)?;
        non_negative("width", self.width)?;
        non_negative("height", self.height)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.validate_placement()?;
        if self.url.trim().is_empty() {
            return Err(ValidationError::EmptyUrl);
        }
        Ok(())
    }

    pub fn as_rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }
}
