//! Vector shape object (ellipse, rectangle, triangle).

use super::{ObjectBase, Rgba, Shadow, check_display_size};
use crate::error::ModelResult;
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Geometric sub-kind of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Ellipse,
    #[default]
    Rectangle,
    Triangle,
}

/// Interior paint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub enabled: bool,
    pub color: Rgba,
}

impl Default for Fill {
    fn default() -> Self {
        Self {
            enabled: true,
            color: Rgba::rgb(239, 68, 68),
        }
    }
}

/// Outline paint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeStroke {
    pub enabled: bool,
    pub color: Rgba,
    pub width: f64,
}

impl Default for ShapeStroke {
    fn default() -> Self {
        Self {
            enabled: false,
            color: Rgba::white(),
            width: 6.0,
        }
    }
}

impl ShapeStroke {
    pub fn is_visible(&self) -> bool {
        self.enabled && self.width > 0.0
    }
}

/// A filled/stroked vector shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeObject {
    #[serde(flatten)]
    pub base: ObjectBase,
    pub shape_type: ShapeKind,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub fill: Fill,
    #[serde(default)]
    pub stroke: ShapeStroke,
    /// Only meaningful for rectangles.
    #[serde(default)]
    pub corner_radius: f64,
    #[serde(default)]
    pub shadow: Shadow,
}

impl ShapeObject {
    pub fn new(kind: ShapeKind, position: Point, width: f64, height: f64, z_index: i64) -> Self {
        Self {
            base: ObjectBase::new(position, z_index),
            shape_type: kind,
            width,
            height,
            fill: Fill::default(),
            stroke: ShapeStroke::default(),
            corner_radius: 0.0,
            shadow: Shadow::default(),
        }
    }

    /// Unrotated box in document space.
    pub fn as_rect(&self) -> Rect {
        Rect::new(
            self.base.x,
            self.base.y,
            self.base.x + self.width,
            self.base.y + self.height,
        )
    }

    pub(crate) fn validate(&self) -> ModelResult<()> {
        check_display_size(&self.base.id, self.width, self.height)
    }

    /// Corner radius clamped to what fits the box; zero for non-rectangles.
    pub fn effective_corner_radius(&self) -> f64 {
        match self.shape_type {
            ShapeKind::Rectangle => self
                .corner_radius
                .max(0.0)
                .min(self.width.abs() / 2.0)
                .min(self.height.abs() / 2.0),
            ShapeKind::Ellipse | ShapeKind::Triangle => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corner_radius_rectangle_only() {
        let mut rect = ShapeObject::new(ShapeKind::Rectangle, Point::ZERO, 100.0, 40.0, 1);
        rect.corner_radius = 50.0;
        assert!((rect.effective_corner_radius() - 20.0).abs() < f64::EPSILON);

        let mut ellipse = rect.clone();
        ellipse.shape_type = ShapeKind::Ellipse;
        assert_eq!(ellipse.effective_corner_radius(), 0.0);
    }

    #[test]
    fn test_shape_type_tag() {
        let shape = ShapeObject::new(ShapeKind::Triangle, Point::ZERO, 10.0, 10.0, 1);
        let value = serde_json::to_value(&shape).unwrap();
        assert_eq!(value["shapeType"], "triangle");
    }
}
