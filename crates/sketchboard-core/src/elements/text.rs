//! Text shape.

use super::HitTest;
use crate::color::Color;
use crate::error::{ValidationError, finite, positive};
use crate::geometry::{any_in_expanded_rect, approx_text_bounds};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// A single-line text run.
///
/// `(x, y)` is the top-left corner of the run's box; the baseline sits
/// [`Text::BASELINE_RATIO`] of the font size below it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Text {
    pub x: f64,
    pub y: f64,
    pub text: String,
    pub color: Color,
    /// Font size in pixels.
    pub font_size: f64,
}

impl Text {
    pub const DEFAULT_FONT_SIZE: f64 = 20.0;

    /// Distance from the top of the box to the baseline, relative to font size.
    pub const BASELINE_RATIO: f64 = 0.8;

    pub fn new(position: Point, text: String) -> Self {
        Self {
            x: position.x,
            y: position.y,
            text,
            color: Color::BLACK,
            font_size: Self::DEFAULT_FONT_SIZE,
        }
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn baseline(&self) -> Point {
        Point::new(self.x, self.y + self.font_size * Self::BASELINE_RATIO)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        finite("x", self.x)?;
        finite("y", self.y)?;
        if self.text.is_empty() {
            return Err(ValidationError::EmptyText);
        }
        positive("fontSize", self.font_size)?;
        Ok(())
    }

    /// Approximate bounds; glyph metrics are not available to the core.
    pub fn bounds(&self) -> Rect {
        approx_text_bounds(self.origin(), &self.text, self.font_size)
    }
}

impl HitTest for Text {
    fn is_struck(&self, query: &[Point], tolerance: f64) -> bool {
        any_in_expanded_rect(query, self.bounds(), tolerance)
    }
}
