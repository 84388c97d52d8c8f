//! Circle shape.

use super::{DEFAULT_BRUSH_SIZE, HitTest};
use crate::color::Color;
use crate::error::{ValidationError, finite, non_negative};
use crate::geometry::any_in_expanded_circle;
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// A circle given by its center and radius.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Circle {
    /// Center x.
    pub x: f64,
    /// Center y.
    pub y: f64,
    pub radius: f64,
    pub color: Color,
    pub brush_size: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Color>,
}

impl Circle {
    pub fn new(center: Point, radius: f64) -> Self {
        Self {
            x: center.x,
            y: center.y,
            radius,
            color: Color::BLACK,
            brush_size: DEFAULT_BRUSH_SIZE,
            fill: None,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        finite("x", self.x)?;
        finite("y", self.y)?;
        non_negative("radius", self.radius)?;
        non_negative("brushSize", self.brush_size)?;
        Ok(())
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.x - self.radius,
            self.y - self.radius,
            self.x + self.radius,
            self.y + self.radius,
        )
    }
}

impl HitTest for Circle {
    fn is_struck(&self, query: &[Point], tolerance: f64) -> bool {
        any_in_expanded_circle(query, self.center(), self.radius, tolerance)
    }
}
