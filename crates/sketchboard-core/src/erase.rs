//! Proximity eraser.

use crate::elements::{Element, ElementId, HitTest, Path, Shape};
use crate::error::ValidationError;
use crate::geometry::validate_query;
use crate::scene::Scene;
use kurbo::Point;

/// Eraser radius used when a request does not specify one.
pub const DEFAULT_ERASER_SIZE: f64 = 10.0;

/// What an erase pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EraseOutcome {
    /// Paths that lost some, but not all, of their points.
    pub trimmed: usize,
    /// Elements dropped entirely, in scene order.
    pub removed: Vec<ElementId>,
}

impl EraseOutcome {
    pub fn is_noop(&self) -> bool {
        self.trimmed == 0 && self.removed.is_empty()
    }
}

/// Erase everything within `eraser_size` of `erased_points`.
///
/// Paths lose the points that are reached and disappear when none are
/// left. Rectangles, circles and text are dropped as a whole when struck.
/// Images are never touched. Survivors keep their order and identity.
pub fn erase(
    scene: &Scene,
    erased_points: &[Point],
    eraser_size: f64,
) -> Result<(Scene, EraseOutcome), ValidationError> {
    validate_query(erased_points, eraser_size)?;

    let mut outcome = EraseOutcome::default();
    if erased_points.is_empty() {
        return Ok((scene.clone(), outcome));
    }

    let mut survivors = Vec::with_capacity(scene.len());
    for element in scene.iter() {
        let kept = match &element.shape {
            Shape::Path(path) => {
                let points = path.surviving_points(erased_points, eraser_size);
                if points.is_empty() {
                    None
                } else if points.len() == path.len() {
                    Some(element.clone())
                } else {
                    outcome.trimmed += 1;
                    Some(Element {
                        id: element.id,
                        shape: Shape::Path(Path { points, ..path.clone() }),
                    })
                }
            }
            Shape::Rectangle(s) => keep_unless_struck(element, s, erased_points, eraser_size),
            Shape::Circle(s) => keep_unless_struck(element, s, erased_points, eraser_size),
            Shape::Text(s) => keep_unless_struck(element, s, erased_points, eraser_size),
            Shape::Image(_) => Some(element.clone()),
        };
        match kept {
            Some(element) => survivors.push(element),
            None => outcome.removed.push(element.id),
        }
    }

    log::debug!(
        "erase on scene {}: {} trimmed, {} removed",
        scene.id(),
        outcome.trimmed,
        outcome.removed.len()
    );
    Ok((scene.with_elements(survivors), outcome))
}

fn keep_unless_struck(
    element: &Element,
    shape: &impl HitTest,
    query: &[Point],
    tolerance: f64,
) -> Option<Element> {
    if shape.is_struck(query, tolerance) {
        None
    } else {
        Some(element.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{Circle, Image, Rectangle, Text};

    fn stroke(coords: &[(f64, f64)]) -> Shape {
        Shape::Path(Path::from_points(coords.iter().map(|&(x, y)| Point::new(x, y)).collect()))
    }

    fn mixed_scene() -> Scene {
        let mut scene = Scene::new("Erase", 500, 500).unwrap();
        scene.append(stroke(&[(0.0, 0.0), (20.0, 0.0), (40.0, 0.0), (60.0, 0.0)])).unwrap();
        scene.append(Shape::Rectangle(Rectangle::new(100.0, 100.0, 50.0, 30.0))).unwrap();
        scene.append(Shape::Circle(Circle::new(Point::new(300.0, 300.0), 20.0))).unwrap();
        scene.append(Shape::Text(Text::new(Point::new(10.0, 400.0), "note".into()))).unwrap();
        scene
            .append(Shape::Image(Image::new("/assets/a.png", Point::new(100.0, 100.0), 50.0, 30.0)))
            .unwrap();
        scene
    }

    #[test]
    fn test_empty_query_is_noop() {
        let scene = mixed_scene();
        let (erased, outcome) = erase(&scene, &[], 50.0).unwrap();
        assert_eq!(erased, scene);
        assert!(outcome.is_noop());
    }

    #[test]
    fn test_negative_size_rejected() {
        let scene = mixed_scene();
        assert!(erase(&scene, &[Point::ZERO], -1.0).is_err());
    }

    #[test]
    fn test_path_is_trimmed_in_place() {
        let scene = mixed_scene();
        let path_id = scene.elements()[0].id;
        let (erased, outcome) = erase(&scene, &[Point::new(20.0, 0.0)], 5.0).unwrap();
        assert_eq!(outcome.trimmed, 1);
        assert!(outcome.removed.is_empty());
        let Shape::Path(path) = &erased.get(path_id).unwrap().shape else {
            panic!("expected a path");
        };
        assert_eq!(path.points, vec![Point::new(0.0, 0.0), Point::new(40.0, 0.0), Point::new(60.0, 0.0)]);
    }

    #[test]
    fn test_fully_covered_path_is_removed() {
        let scene = mixed_scene();
        let path_id = scene.elements()[0].id;
        let query = [Point::new(0.0, 0.0), Point::new(40.0, 0.0), Point::new(60.0, 0.0)];
        let (erased, outcome) = erase(&scene, &query, 20.0).unwrap();
        assert!(erased.get(path_id).is_none());
        assert_eq!(outcome.removed, vec![path_id]);
    }

    #[test]
    fn test_untouched_path_is_identical() {
        let scene = mixed_scene();
        let (erased, _) = erase(&scene, &[Point::new(250.0, 20.0)], 5.0).unwrap();
        assert_eq!(erased.elements()[0], scene.elements()[0]);
    }

    #[test]
    fn test_rectangle_all_or_nothing() {
        let scene = mixed_scene();
        let rect_id = scene.elements()[1].id;

        let (erased, _) = erase(&scene, &[Point::new(151.0, 115.0)], 2.0).unwrap();
        assert!(erased.get(rect_id).is_none());

        let (erased, _) = erase(&scene, &[Point::new(160.0, 115.0)], 2.0).unwrap();
        assert_eq!(erased.get(rect_id), scene.get(rect_id));
    }

    #[test]
    fn test_images_are_immune() {
        let scene = mixed_scene();
        let image_id = scene.elements()[4].id;
        // Dead center of the image, which overlaps the rectangle.
        let (erased, outcome) = erase(&scene, &[Point::new(125.0, 115.0)], 10.0).unwrap();
        assert!(erased.get(image_id).is_some());
        assert_eq!(outcome.removed, vec![scene.elements()[1].id]);
    }

    #[test]
    fn test_order_and_ids_preserved() {
        let scene = mixed_scene();
        let (erased, _) = erase(&scene, &[Point::new(300.0, 300.0)], 1.0).unwrap();
        let before: Vec<_> = scene.iter().map(|e| e.id).filter(|id| *id != scene.elements()[2].id).collect();
        let after: Vec<_> = erased.iter().map(|e| e.id).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_idempotent() {
        let scene = mixed_scene();
        let query = [Point::new(20.0, 1.0), Point::new(120.0, 110.0), Point::new(15.0, 405.0)];
        let (once, _) = erase(&scene, &query, 6.0).unwrap();
        let (twice, outcome) = erase(&once, &query, 6.0).unwrap();
        assert_eq!(once, twice);
        assert!(outcome.is_noop());
    }

    #[test]
    fn test_input_scene_is_not_modified() {
        let scene = mixed_scene();
        let snapshot = scene.clone();
        let _ = erase(&scene, &[Point::new(0.0, 0.0)], 100.0).unwrap();
        assert_eq!(scene, snapshot);
    }

    #[test]
    fn test_ids_not_reused_after_erase() {
        let scene = mixed_scene();
        let last = scene.elements()[4].id;
        let (mut erased, _) = erase(&scene, &[Point::new(300.0, 300.0)], 1.0).unwrap();
        let id = erased.append(Shape::Circle(Circle::new(Point::ZERO, 1.0))).unwrap();
        assert!(id > last);
    }
}
