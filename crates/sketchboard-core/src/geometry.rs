//! Pure proximity tests used by the eraser.
//!
//! Every function takes a set of query points and a tolerance radius and
//! answers whether (or which part of) a shape lies within reach. Distances
//! are compared squared, which is equivalent because tolerances are never
//! negative.

use crate::error::{ValidationError, finite, non_negative};
use kurbo::{Point, Rect};

/// Width of one glyph relative to the font size, for approximate text boxes.
pub const TEXT_WIDTH_FACTOR: f64 = 0.6;

/// Check that a query is usable: every point finite, tolerance finite and `>= 0`.
pub fn validate_query(query: &[Point], tolerance: f64) -> Result<(), ValidationError> {
    non_negative("eraserSize", tolerance)?;
    for point in query {
        finite("erasedPoints.x", point.x)?;
        finite("erasedPoints.y", point.y)?;
    }
    Ok(())
}

/// Euclidean distance between `a` and `b` is at most `tolerance`.
#[inline]
pub fn within(a: Point, b: Point, tolerance: f64) -> bool {
    (a - b).hypot2() <= tolerance * tolerance
}

/// Bounding box of a set of points, `None` when empty.
pub fn points_bounds(points: &[Point]) -> Option<Rect> {
    let first = points.first()?;
    let mut bounds = Rect::from_points(*first, *first);
    for point in &points[1..] {
        bounds = bounds.union_pt(*point);
    }
    Some(bounds)
}

/// Closed-interval containment (kurbo's `Rect::contains` is half-open).
#[inline]
fn contains_closed(rect: Rect, point: Point) -> bool {
    point.x >= rect.x0 && point.x <= rect.x1 && point.y >= rect.y0 && point.y <= rect.y1
}

/// The points of a stroke that no query point reaches, in original order.
pub fn surviving_points(points: &[Point], query: &[Point], tolerance: f64) -> Vec<Point> {
    let Some(reach) = points_bounds(query).map(|b| b.inflate(tolerance, tolerance)) else {
        return points.to_vec();
    };
    points
        .iter()
        .copied()
        .filter(|p| !contains_closed(reach, *p) || !query.iter().any(|q| within(*p, *q, tolerance)))
        .collect()
}

/// Any query point inside `rect` grown by `tolerance` on every side.
pub fn any_in_expanded_rect(query: &[Point], rect: Rect, tolerance: f64) -> bool {
    let expanded = rect.inflate(tolerance, tolerance);
    query.iter().any(|q| contains_closed(expanded, *q))
}

/// Any query point within `radius + tolerance` of `center`.
pub fn any_in_expanded_circle(query: &[Point], center: Point, radius: f64, tolerance: f64) -> bool {
    let reach = radius + tolerance;
    query.iter().any(|q| within(*q, center, reach))
}

/// Approximate box occupied by a text run whose top-left corner is `origin`.
pub fn approx_text_bounds(origin: Point, text: &str, font_size: f64) -> Rect {
    let width = text.chars().count() as f64 * font_size * TEXT_WIDTH_FACTOR;
    Rect::new(origin.x, origin.y, origin.x + width, origin.y + font_size)
}
