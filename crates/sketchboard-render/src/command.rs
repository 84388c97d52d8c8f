//! Target-agnostic draw commands.

use crate::assets::DecodedImage;
use kurbo::{Point, Rect};
use sketchboard_core::Color;
use std::sync::Arc;

/// An outline stroke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub width: f64,
}

/// Fill and outline of a closed shape. Either may be absent, not both.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Paint {
    pub fill: Option<Color>,
    pub stroke: Option<Stroke>,
}

impl Paint {
    /// Paint for a shape with an outline color, outline width and optional fill.
    ///
    /// Invisible parts (transparent colors, zero widths) are dropped.
    pub fn new(color: Color, width: f64, fill: Option<Color>) -> Self {
        let stroke = (width > 0.0 && !color.is_invisible()).then_some(Stroke { color, width });
        Self {
            fill: fill.filter(|c| !c.is_invisible()),
            stroke,
        }
    }

    /// Nothing would be painted.
    pub fn is_empty(&self) -> bool {
        self.fill.is_none() && self.stroke.is_none()
    }
}

/// One drawing instruction, in canvas coordinates (origin top-left, y down).
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Open stroke through two or more points with round caps and joins.
    Polyline { points: Vec<Point>, stroke: Stroke },
    /// A single-point stroke, drawn as a filled disc of the brush diameter.
    Dot { center: Point, diameter: f64, color: Color },
    Rect { rect: Rect, paint: Paint },
    Circle { center: Point, radius: f64, paint: Paint },
    /// Text whose box has its top-left corner at `origin`.
    Text {
        origin: Point,
        baseline: Point,
        text: String,
        font_size: f64,
        color: Color,
    },
    /// A decoded raster image scaled into `rect`.
    Image {
        rect: Rect,
        url: String,
        image: Arc<DecodedImage>,
    },
}

impl DrawCommand {
    pub fn name(&self) -> &'static str {
        match self {
            DrawCommand::Polyline { .. } => "polyline",
            DrawCommand::Dot { .. } => "dot",
            DrawCommand::Rect { .. } => "rect",
            DrawCommand::Circle { .. } => "circle",
            DrawCommand::Text { .. } => "text",
            DrawCommand::Image { .. } => "image",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paint_drops_invisible_parts() {
        let paint = Paint::new(Color::TRANSPARENT, 5.0, Some(Color::WHITE));
        assert!(paint.stroke.is_none());
        assert_eq!(paint.fill, Some(Color::WHITE));

        let paint = Paint::new(Color::BLACK, 0.0, None);
        assert!(paint.is_empty());
    }

    #[test]
    fn test_paint_outline_only() {
        let paint = Paint::new(Color::BLACK, 2.0, None);
        assert_eq!(paint.stroke, Some(Stroke { color: Color::BLACK, width: 2.0 }));
        assert!(paint.fill.is_none());
    }
}
