//! Rectangle shape.

use super::{DEFAULT_BRUSH_SIZE, HitTest};
use crate::color::Color;
use crate::error::{ValidationError, finite, non_negative};
use crate::geometry::any_in_expanded_rect;
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rectangle {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Outline color.
    pub color: Color,
    /// Outline width.
    pub brush_size: f64,
    /// Interior color (None = outline only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Color>,
}

impl Rectangle {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            color: Color::BLACK,
            brush_size: DEFAULT_BRUSH_SIZE,
            fill: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        finite("x", self.x)?;
        finite("y", self.y)?;
        non_negative("width", self.width)?;
        non_negative("height", self.height)?;
        non_negative("brushSize", self.brush_size)?;
        Ok(())
    }

    pub fn as_rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }
}

impl HitTest for Rectangle {
    fn is_struck(&self, query: &[Point], tolerance: f64) -> bool {
        any_in_expanded_rect(query, self.as_rect(), tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_size_rejected() {
        let rect = Rectangle::new(0.0, 0.0, -10.0, 5.0);
        assert!(matches!(
            rect.validate(),
            Err(ValidationError::Negative { field: "width", .. })
        ));
    }

    #[test]
    fn test_struck_inside_and_within_tolerance() {
        let rect = Rectangle::new(0.0, 0.0, 100.0, 100.0);
        assert!(rect.is_struck(&[Point::new(50.0, 50.0)], 0.0));
        assert!(rect.is_struck(&[Point::new(105.0, 50.0)], 10.0));
        assert!(!rect.is_struck(&[Point::new(150.0, 50.0)], 10.0));
    }

    #[test]
    fn test_any_point_is_enough() {
        let rect = Rectangle::new(0.0, 0.0, 10.0, 10.0);
        let query = [Point::new(500.0, 500.0), Point::new(-500.0, 0.0), Point::new(5.0, 5.0)];
        assert!(rect.is_struck(&query, 0.0));
    }

    #[test]
    fn test_fill_omitted_from_json_when_absent() {
        let rect = Rectangle::new(1.0, 2.0, 3.0, 4.0);
        let value = serde_json::to_value(&rect).unwrap();
        assert!(value.get("fill").is_none());
    }
}
