//! Arrow geometry: arrowheads, truncated bodies, curves and tapered outlines.
//!
//! Everything here works in the arrow's local space (point offsets relative
//! to the arrow position). Callers place the result with the arrow's
//! translation and rotation.

use crate::objects::ArrowObject;
use kurbo::{BezPath, CubicBez, ParamCurve, Point, Vec2};

/// Head length as a multiple of `thickness * arrowhead_size`.
pub const HEAD_LENGTH_FACTOR: f64 = 1.5;

/// Width at the tip of a tapered body as a fraction of the base width.
pub const TAPER_TIP_RATIO: f64 = 0.3;

/// Samples per spline segment when a curved body has to become a polyline.
pub const CURVE_SAMPLES_PER_SEGMENT: usize = 12;

const CATMULL_ROM_TENSION: f64 = 0.5;

/// Filled triangular arrowhead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arrowhead {
    /// Point of the head; always the terminal point of the path.
    pub tip: Point,
    /// Center of the head's back edge, where the body stops.
    pub base: Point,
    pub left: Point,
    pub right: Point,
}

impl Arrowhead {
    /// Closed triangle path.
    pub fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        path.move_to(self.tip);
        path.line_to(self.left);
        path.line_to(self.right);
        path.close_path();
        path
    }

    /// Check whether a point lies inside the head triangle.
    pub fn contains(&self, point: Point) -> bool {
        fn sign(p1: Point, p2: Point, p3: Point) -> f64 {
            (p1.x - p3.x) * (p2.y - p3.y) - (p2.x - p3.x) * (p1.y - p3.y)
        }

        let d1 = sign(point, self.tip, self.left);
        let d2 = sign(point, self.left, self.right);
        let d3 = sign(point, self.right, self.tip);

        let has_neg = (d1 < 0.0) || (d2 < 0.0) || (d3 < 0.0);
        let has_pos = (d1 > 0.0) || (d2 > 0.0) || (d3 > 0.0);

        !(has_neg && has_pos)
    }
}

/// Normalized direction from `from` to `to`, or +x when the points coincide.
pub fn unit_direction(from: Point, to: Point) -> Vec2 {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let len = (dx * dx + dy * dy).sqrt();
    if len < f64::EPSILON {
        Vec2::new(1.0, 0.0)
    } else {
        Vec2::new(dx / len, dy / len)
    }
}

/// Left-hand perpendicular of a unit direction.
fn perpendicular(dir: Vec2) -> Vec2 {
    Vec2::new(-dir.y, dir.x)
}

pub fn head_length(thickness: f64, arrowhead_size: f64) -> f64 {
    thickness * arrowhead_size * HEAD_LENGTH_FACTOR
}

pub fn head_half_width(thickness: f64, arrowhead_size: f64) -> f64 {
    thickness * arrowhead_size
}

/// Compute the head whose tip sits on `tip`, pointing away from `from`.
pub fn arrowhead(from: Point, tip: Point, thickness: f64, arrowhead_size: f64) -> Arrowhead {
    let dir = unit_direction(from, tip);
    let perp = perpendicular(dir);
    let length = head_length(thickness, arrowhead_size);
    let half_width = head_half_width(thickness, arrowhead_size);

    let base = tip - dir * length;
    Arrowhead {
        tip,
        base,
        left: base + perp * half_width,
        right: base - perp * half_width,
    }
}

/// Body points with the ends pulled back to the head bases.
///
/// Returns the truncated points together with the start and end heads.
pub fn truncated_body(
    points: &[Point],
    thickness: f64,
    arrowhead_size: f64,
    start_head: bool,
    end_head: bool,
) -> (Vec<Point>, Option<Arrowhead>, Option<Arrowhead>) {
    let mut body = points.to_vec();
    if body.len() < 2 {
        return (body, None, None);
    }
    let n = body.len();

    let end = end_head.then(|| arrowhead(points[n - 2], points[n - 1], thickness, arrowhead_size));
    let start = start_head.then(|| arrowhead(points[1], points[0], thickness, arrowhead_size));

    if let Some(head) = &end {
        body[n - 1] = head.base;
    }
    if let Some(head) = &start {
        body[0] = head.base;
    }
    (body, start, end)
}

/// Control points of the Catmull-Rom segment between `points[i]` and `points[i + 1]`.
fn catmull_rom_segment(points: &[Point], i: usize) -> CubicBez {
    let last = points.len() - 1;
    let p0 = points[if i == 0 { 0 } else { i - 1 }];
    let p1 = points[i];
    let p2 = points[i + 1];
    let p3 = points[if i + 2 > last { last } else { i + 2 }];

    let t1 = (p2 - p0) * CATMULL_ROM_TENSION;
    let t2 = (p3 - p1) * CATMULL_ROM_TENSION;

    CubicBez::new(p1, p1 + t1 / 3.0, p2 - t2 / 3.0, p2)
}

/// Smooth path passing through every point.
pub fn catmull_rom_path(points: &[Point]) -> BezPath {
    let mut path = BezPath::new();
    let Some(first) = points.first() else {
        return path;
    };
    path.move_to(*first);
    for i in 0..points.len().saturating_sub(1) {
        let seg = catmull_rom_segment(points, i);
        path.curve_to(seg.p1, seg.p2, seg.p3);
    }
    path
}

/// Polyline approximation of [`catmull_rom_path`].
pub fn sample_catmull_rom(points: &[Point], samples_per_segment: usize) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }
    let samples = samples_per_segment.max(1);
    let mut out = vec![points[0]];
    for i in 0..points.len() - 1 {
        let seg = catmull_rom_segment(points, i);
        for s in 1..=samples {
            out.push(seg.eval(s as f64 / samples as f64));
        }
    }
    out
}

/// Open polyline path.
pub fn polyline_path(points: &[Point]) -> BezPath {
    let mut path = BezPath::new();
    if let Some(first) = points.first() {
        path.move_to(*first);
        for p in &points[1..] {
            path.line_to(*p);
        }
    }
    path
}

/// Half-width of a tapered body at fraction `t` of the path.
pub fn tapered_half_width_at(thickness: f64, t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    thickness * (1.0 - t) + thickness * TAPER_TIP_RATIO * t
}

/// Widest distance from the centerline to the edge of an arrow body.
pub fn body_half_width(arrow: &ArrowObject) -> f64 {
    if arrow.style.is_tapered() {
        tapered_half_width_at(arrow.thickness, 0.0)
    } else {
        arrow.thickness / 2.0
    }
}

/// Closed outline of a body whose half-width narrows from `thickness` to
/// `thickness * TAPER_TIP_RATIO`.
///
/// `t` advances by point index, not arc length. The polygon walks the left
/// side forward and the right side backward.
pub fn tapered_outline(points: &[Point], thickness: f64) -> Vec<Point> {
    let n = points.len();
    if n < 2 {
        return Vec::new();
    }

    let mut left = Vec::with_capacity(n);
    let mut right = Vec::with_capacity(n);
    for (i, p) in points.iter().enumerate() {
        let (a, b) = if i + 1 < n {
            (points[i], points[i + 1])
        } else {
            (points[i - 1], points[i])
        };
        let perp = perpendicular(unit_direction(a, b));
        let t = i as f64 / (n - 1) as f64;
        let half = tapered_half_width_at(thickness, t);
        left.push(*p + perp * half);
        right.push(*p - perp * half);
    }

    left.extend(right.into_iter().rev());
    left
}

/// Closed path through the polygon vertices.
pub fn polygon_path(vertices: &[Point]) -> BezPath {
    let mut path = polyline_path(vertices);
    if !vertices.is_empty() {
        path.close_path();
    }
    path
}

/// How the arrow body is painted.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrowBody {
    /// Stroked centerline with the arrow thickness.
    Stroke(BezPath),
    /// Filled variable-width polygon.
    Tapered(BezPath),
}

impl ArrowBody {
    pub fn path(&self) -> &BezPath {
        match self {
            ArrowBody::Stroke(path) | ArrowBody::Tapered(path) => path,
        }
    }
}

/// Derived render geometry of an arrow, in local space.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrowGeometry {
    pub body: ArrowBody,
    pub start_head: Option<Arrowhead>,
    pub end_head: Option<Arrowhead>,
}

/// Compute the body and heads for an arrow object.
pub fn arrow_geometry(arrow: &ArrowObject) -> ArrowGeometry {
    let points = arrow.local_points();
    let (body_points, start_head, end_head) = truncated_body(
        &points,
        arrow.thickness,
        arrow.arrowhead_size,
        arrow.start_arrowhead,
        arrow.end_arrowhead,
    );

    let curved = arrow.is_curved && body_points.len() >= 3;
    let body = if arrow.style.is_tapered() {
        let centerline = if curved {
            sample_catmull_rom(&body_points, CURVE_SAMPLES_PER_SEGMENT)
        } else {
            body_points
        };
        ArrowBody::Tapered(polygon_path(&tapered_outline(&centerline, arrow.thickness)))
    } else if curved {
        ArrowBody::Stroke(catmull_rom_path(&body_points))
    } else {
        ArrowBody::Stroke(polyline_path(&body_points))
    };

    ArrowGeometry {
        body,
        start_head,
        end_head,
    }
}
