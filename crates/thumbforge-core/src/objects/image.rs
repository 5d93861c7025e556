//! Image object referencing an uploaded raster asset.

use super::{ObjectBase, check_display_size};
use crate::error::{ModelError, ModelResult};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Crop rectangle in natural image pixels.
///
/// A zero width or height means "no crop".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Crop {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Crop {
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// A raster image placed on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageObject {
    #[serde(flatten)]
    pub base: ObjectBase,
    /// URL of the asset.
    pub src: String,
    /// Natural pixel size, captured once at load time.
    pub original_width: f64,
    pub original_height: f64,
    /// Display size in document units.
    pub width: f64,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop: Option<Crop>,
}

impl ImageObject {
    /// Create an image displayed at its natural size.
    pub fn new(
        position: Point,
        src: impl Into<String>,
        original_width: f64,
        original_height: f64,
        z_index: i64,
    ) -> Self {
        Self {
            base: ObjectBase::new(position, z_index),
            src: src.into(),
            original_width,
            original_height,
            width: original_width,
            height: original_height,
            crop: None,
        }
    }

    /// Set the display size.
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// The crop region to sample from, or `None` for the full image.
    pub fn effective_crop(&self) -> Option<&Crop> {
        self.crop.as_ref().filter(|c| !c.is_empty())
    }

    /// Aspect ratio (width / height) of the displayed source region.
    pub fn source_aspect(&self) -> f64 {
        let (w, h) = match self.effective_crop() {
            Some(crop) => (crop.width, crop.height),
            None => (self.original_width, self.original_height),
        };
        if h.abs() < f64::EPSILON { 1.0 } else { w / h }
    }

    /// Resize keeping the current aspect ratio, driven by the new width.
    pub fn resize_proportional(&mut self, new_width: f64) {
        let aspect = if self.height.abs() < f64::EPSILON {
            self.source_aspect()
        } else {
            self.width / self.height
        };
        self.width = new_width;
        self.height = new_width / aspect;
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
        let natural = |v: f64| v.is_finite() && v > 0.0;
        if !natural(self.original_width) || !natural(self.original_height) {
            return Err(ModelError::InvalidObject(format!(
                "image {} has non-positive natural size",
                self.base.id
            )));
        }
        check_display_size(&self.base.id, self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_crop_means_full_image() {
        let mut img = ImageObject::new(Point::ZERO, "a.png", 400.0, 200.0, 1);
        img.crop = Some(Crop { x: 10.0, y: 10.0, width: 0.0, height: 50.0 });
        assert!(img.effective_crop().is_none());
        assert!((img.source_aspect() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_resize_proportional() {
        let mut img = ImageObject::new(Point::ZERO, "a.png", 400.0, 200.0, 1);
        img.resize_proportional(100.0);
        assert!((img.width - 100.0).abs() < f64::EPSILON);
        assert!((img.height - 50.0).abs() < f64::EPSILON);
        assert!((img.original_width - 400.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_bounds() {
        let img = ImageObject::new(Point::new(10.0, 20.0), "a.png", 100.0, 50.0, 1);
        let rect = img.as_rect();
        assert!((rect.x1 - 110.0).abs() < f64::EPSILON);
        assert!((rect.y1 - 70.0).abs() < f64::EPSILON);
    }
}
