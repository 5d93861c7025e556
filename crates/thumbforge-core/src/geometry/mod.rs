//! Pure geometry derived from object state.

pub mod arrow;
pub mod fit;
pub mod text;

pub use arrow::{
    ArrowBody, ArrowGeometry, Arrowhead, arrow_geometry, arrowhead, body_half_width,
    catmull_rom_path,
    head_half_width, head_length, sample_catmull_rom, tapered_half_width_at, tapered_outline,
    truncated_body, unit_direction,
};
pub use fit::{centered_origin, fit_contain, fit_cover};
pub use text::{TextMetrics, measure_text, text_block_rect, text_outer_rect};

use crate::objects::Object;
use kurbo::{Affine, Point, Rect, Vec2};

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = a + seg * t;
    point.distance(proj)
}

/// Minimum distance from a point to a polyline.
pub fn point_to_polyline_dist(point: Point, points: &[Point]) -> f64 {
    points
        .windows(2)
        .map(|w| point_to_segment_dist(point, w[0], w[1]))
        .fold(f64::INFINITY, f64::min)
}

/// Axis-aligned bounds of a rectangle rotated about `center`.
pub fn rotated_bounds(rect: Rect, degrees: f64, center: Point) -> Rect {
    if degrees.abs() < 1e-9 {
        return rect;
    }
    let rot = Affine::rotate_about(degrees.to_radians(), center);
    let corners = [
        Point::new(rect.x0, rect.y0),
        Point::new(rect.x1, rect.y0),
        Point::new(rect.x1, rect.y1),
        Point::new(rect.x0, rect.y1),
    ];
    bounds_of(corners.iter().map(|&p| rot * p)).unwrap_or(rect)
}

/// Bounding box of a set of points.
pub fn bounds_of(points: impl IntoIterator<Item = Point>) -> Option<Rect> {
    let mut iter = points.into_iter();
    let first = iter.next()?;
    Some(iter.fold(Rect::from_points(first, first), |r, p| {
        r.union_pt(p)
    }))
}

/// Unrotated box of a text, image or shape object in document space.
fn unrotated_box(object: &Object) -> Option<Rect> {
    match object {
        Object::Text(t) => Some(text_block_rect(t)),
        Object::Image(i) => Some(i.as_rect()),
        Object::Shape(s) => Some(s.as_rect()),
        Object::Arrow(_) => None,
    }
}

/// Local-to-document transform of an object.
///
/// Boxed objects rotate about their center. Arrow points are offsets from the
/// arrow position, and the arrow rotates about that position.
pub fn object_transform(object: &Object) -> Affine {
    let base = object.base();
    let radians = base.rotation.to_radians();
    match object {
        Object::Arrow(_) => Affine::translate(Vec2::new(base.x, base.y)) * Affine::rotate(radians),
        _ => {
            let center = unrotated_box(object).map(|r| r.center()).unwrap_or(base.position());
            Affine::rotate_about(radians, center)
        }
    }
}

/// Axis-aligned document-space bounds of an object.
pub fn object_bounds(object: &Object) -> Rect {
    match object {
        Object::Arrow(a) => {
            let geom = arrow_geometry(a);
            let local: Vec<Point> = a
                .local_points()
                .into_iter()
                .chain(
                    [geom.start_head, geom.end_head]
                        .into_iter()
                        .flatten()
                        .flat_map(|h| [h.left, h.right]),
                )
                .collect();
            let transform = object_transform(object);
            let half = body_half_width(a);
            bounds_of(local.into_iter().map(|p| transform * p))
                .map(|r| r.inflate(half, half))
                .unwrap_or_else(|| Rect::from_origin_size(a.base.position(), (0.0, 0.0)))
        }
        Object::Text(t) => {
            let outer = text_outer_rect(t);
            rotated_bounds(outer, t.base.rotation, text_block_rect(t).center())
        }
        Object::Image(_) | Object::Shape(_) => {
            let rect = unrotated_box(object).unwrap_or_default();
            rotated_bounds(rect, object.base().rotation, rect.center())
        }
    }
}

/// Check if a document-space point hits an object.
pub fn hit_test(object: &Object, point: Point, tolerance: f64) -> bool {
    let local = object_transform(object).inverse() * point;
    match object {
        Object::Arrow(a) => {
            let points = a.local_points();
            if point_to_polyline_dist(local, &points) <= tolerance + body_half_width(a) {
                return true;
            }
            let geom = arrow_geometry(a);
            [geom.start_head, geom.end_head]
                .into_iter()
                .flatten()
                .any(|h| h.contains(local))
        }
        Object::Text(t) => text_outer_rect(t).inflate(tolerance, tolerance).contains(local),
        Object::Image(_) | Object::Shape(_) => unrotated_box(object)
            .map(|r| r.inflate(tolerance, tolerance).contains(local))
            .unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{ArrowObject, ShapeKind, ShapeObject};

    #[test]
    fn test_segment_distance() {
        let d = point_to_segment_dist(Point::new(50.0, 10.0), Point::ZERO, Point::new(100.0, 0.0));
        assert!((d - 10.0).abs() < 1e-9);
        let d = point_to_segment_dist(Point::new(-3.0, 4.0), Point::ZERO, Point::new(100.0, 0.0));
        assert!((d - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_rotated_shape_bounds() {
        let mut shape = ShapeObject::new(ShapeKind::Rectangle, Point::new(0.0, 0.0), 100.0, 100.0, 1);
        shape.base.rotation = 45.0;
        let bounds = object_bounds(&Object::Shape(shape));
        let half_diag = 50.0 * 2f64.sqrt();
        assert!((bounds.x0 - (50.0 - half_diag)).abs() < 1e-6);
        assert!((bounds.x1 - (50.0 + half_diag)).abs() < 1e-6);
    }

    #[test]
    fn test_arrow_bounds_include_head() {
        let arrow = ArrowObject::new(Point::new(10.0, 10.0), vec![0.0, 0.0, 100.0, 0.0], 1);
        let half_width = head_half_width(arrow.thickness, arrow.arrowhead_size);
        let bounds = object_bounds(&Object::Arrow(arrow));
        assert!(bounds.y0 <= 10.0 - half_width);
        assert!(bounds.y1 >= 10.0 + half_width);
        assert!(bounds.x1 >= 110.0);
    }

    #[test]
    fn test_hit_test_rotated_arrow() {
        let mut arrow = ArrowObject::new(Point::new(0.0, 0.0), vec![0.0, 0.0, 100.0, 0.0], 1);
        arrow.base.rotation = 90.0;
        let object = Object::Arrow(arrow);
        assert!(hit_test(&object, Point::new(0.0, 50.0), 1.0));
        assert!(!hit_test(&object, Point::new(50.0, 0.0), 1.0));
    }

    #[test]
    fn test_tapered_arrow_hit_covers_full_base() {
        use crate::objects::ArrowStyle;
        let points = vec![0.0, 0.0, 200.0, 0.0];
        let tapered = ArrowObject::with_style(Point::ZERO, points.clone(), ArrowStyle::Tapered, 1);
        assert!((body_half_width(&tapered) - tapered.thickness).abs() < 1e-9);
        let near_base = Point::new(5.0, tapered.thickness * 0.75);
        assert!(hit_test(&Object::Arrow(tapered), near_base, 0.0));

        let mut classic = ArrowObject::new(Point::ZERO, points, 1);
        classic.thickness = 16.0;
        assert!(!hit_test(&Object::Arrow(classic), near_base, 0.0));
    }

    #[test]
    fn test_hit_test_shape() {
        let shape = ShapeObject::new(ShapeKind::Ellipse, Point::new(10.0, 10.0), 20.0, 20.0, 1);
        let object = Object::Shape(shape);
        assert!(hit_test(&object, Point::new(15.0, 15.0), 0.0));
        assert!(!hit_test(&object, Point::new(45.0, 15.0), 2.0));
    }
}
