//! Drawable element definitions.

mod circle;
mod image;
mod path;
mod rectangle;
mod text;

pub use circle::Circle;
pub use image::{Image, ImageFormat};
pub use path::Path;
pub use rectangle::Rectangle;
pub use text::Text;

use crate::error::ValidationError;
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default stroke width for paths and outlined shapes.
pub const DEFAULT_BRUSH_SIZE: f64 = 5.0;

/// Opaque handle of an element within its scene.
///
/// Assigned by the scene on append and never handed out twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(u64);

impl ElementId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ElementId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// Shapes the eraser removes as a whole when any query point reaches them.
pub trait HitTest {
    /// Whether any of `query` lies within `tolerance` of the shape.
    fn is_struck(&self, query: &[Point], tolerance: f64) -> bool;
}

/// The closed set of drawable primitives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "props", rename_all = "lowercase")]
pub enum Shape {
    Path(Path),
    Rectangle(Rectangle),
    Circle(Circle),
    Text(Text),
    Image(Image),
}

impl Shape {
    /// Lowercase kind name, as used on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Shape::Path(_) => "path",
            Shape::Rectangle(_) => "rectangle",
            Shape::Circle(_) => "circle",
            Shape::Text(_) => "text",
            Shape::Image(_) => "image",
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Shape::Path(s) => s.validate(),
            Shape::Rectangle(s) => s.validate(),
            Shape::Circle(s) => s.validate(),
            Shape::Text(s) => s.validate(),
            Shape::Image(s) => s.validate(),
        }
    }

    pub fn bounds(&self) -> Rect {
        match self {
            Shape::Path(s) => s.bounds(),
            Shape::Rectangle(s) => s.as_rect(),
            Shape::Circle(s) => s.bounds(),
            Shape::Text(s) => s.bounds(),
            Shape::Image(s) => s.as_rect(),
        }
    }

    pub fn as_image(&self) -> Option<&Image> {
        match self {
            Shape::Image(img) => Some(img),
            _ => None,
        }
    }
}

/// A shape placed in a scene under a stable identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    pub shape: Shape,
}

impl Element {
    pub fn kind(&self) -> &'static str {
        self.shape.kind()
    }
}
