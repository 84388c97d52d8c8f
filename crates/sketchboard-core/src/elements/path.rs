//! Freehand stroke.

use super::DEFAULT_BRUSH_SIZE;
use crate::color::Color;
use crate::error::{ValidationError, finite, positive};
use crate::geometry::{points_bounds, surviving_points};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// A freehand stroke stored as its raw point sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Path {
    /// Points in drawing order.
    pub points: Vec<Point>,
    pub color: Color,
    /// Stroke width.
    pub brush_size: f64,
}

impl Path {
    pub fn from_points(points: Vec<Point>) -> Self {
        Self {
            points,
            color: Color::BLACK,
            brush_size: DEFAULT_BRUSH_SIZE,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.points.is_empty() {
            return Err(ValidationError::EmptyPath);
        }
        for point in &self.points {
            finite("points.x", point.x)?;
            finite("points.y", point.y)?;
        }
        positive("brushSize", self.brush_size)?;
        Ok(())
    }

    pub fn bounds(&self) -> Rect {
        points_bounds(&self.points).unwrap_or(Rect::ZERO)
    }

    /// The points left after erasing with `query` at `tolerance`.
    pub fn surviving_points(&self, query: &[Point], tolerance: f64) -> Vec<Point> {
        surviving_points(&self.points, query, tolerance)
    }
}
