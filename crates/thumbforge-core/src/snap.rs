//! Center snapping for moving objects.

use crate::document::{CANVAS_HEIGHT, CANVAS_WIDTH};
use kurbo::{Point, Rect, Vec2};

/// Distance (document pixels) within which an axis snaps to its target.
pub const CENTER_SNAP_THRESHOLD: f64 = 8.0;

/// Result of a snap operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapResult {
    /// The snapped point.
    pub point: Point,
    /// Whether the X coordinate was snapped.
    pub snapped_x: bool,
    /// Whether the Y coordinate was snapped.
    pub snapped_y: bool,
}

impl SnapResult {
    /// Create a result with no snapping.
    pub fn none(point: Point) -> Self {
        Self {
            point,
            snapped_x: false,
            snapped_y: false,
        }
    }

    /// Check if any snapping occurred.
    pub fn is_snapped(&self) -> bool {
        self.snapped_x || self.snapped_y
    }
}

/// Center of the fixed document canvas.
pub fn canvas_center() -> Point {
    Point::new(CANVAS_WIDTH / 2.0, CANVAS_HEIGHT / 2.0)
}

/// Snap each axis of `candidate` to `target` independently when within `threshold`.
pub fn snap_to_target(candidate: Point, target: Point, threshold: f64) -> SnapResult {
    let snapped_x = (candidate.x - target.x).abs() <= threshold;
    let snapped_y = (candidate.y - target.y).abs() <= threshold;
    SnapResult {
        point: Point::new(
            if snapped_x { target.x } else { candidate.x },
            if snapped_y { target.y } else { candidate.y },
        ),
        snapped_x,
        snapped_y,
    }
}

/// Snap a box so its center lands on the canvas center.
///
/// Returns the snap result for the box center and the translation to apply
/// to the box origin.
pub fn snap_box_to_canvas_center(bounds: Rect, threshold: f64) -> (SnapResult, Vec2) {
    let center = bounds.center();
    let result = snap_to_target(center, canvas_center(), threshold);
    (result, result.point - center)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snaps_each_axis_independently() {
        let result = snap_to_target(Point::new(645.0, 500.0), canvas_center(), CENTER_SNAP_THRESHOLD);
        assert!(result.snapped_x);
        assert!(!result.snapped_y);
        assert_eq!(result.point, Point::new(640.0, 500.0));
    }

    #[test]
    fn test_not_a_radius() {
        // 7px off on both axes is ~9.9px away, still snaps per axis.
        let result = snap_to_target(Point::new(647.0, 353.0), canvas_center(), CENTER_SNAP_THRESHOLD);
        assert!(result.snapped_x && result.snapped_y);
        assert_eq!(result.point, canvas_center());
    }

    #[test]
    fn test_outside_threshold_unchanged() {
        let p = Point::new(600.0, 300.0);
        let result = snap_to_target(p, canvas_center(), CENTER_SNAP_THRESHOLD);
        assert!(!result.is_snapped());
        assert_eq!(result.point, p);
    }

    #[test]
    fn test_box_snap_offset() {
        let bounds = Rect::new(538.0, 0.0, 738.0, 100.0);
        let (result, delta) = snap_box_to_canvas_center(bounds, CENTER_SNAP_THRESHOLD);
        assert!(result.snapped_x);
        assert!((delta.x - 2.0).abs() < 1e-9);
        assert_eq!(delta.y, 0.0);
    }
}
