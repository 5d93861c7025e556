//! Object definitions for the thumbnail document.

mod arrow;
mod image;
mod shape;
mod text;

pub use arrow::{ArrowObject, ArrowStyle, Dash, Outline, StylePreset};
pub use image::{Crop, ImageObject};
pub use shape::{Fill, ShapeKind, ShapeObject, ShapeStroke};
pub use text::{TextAlign, TextBackground, TextObject, TextStroke};

use crate::error::{ModelError, ModelResult};
use kurbo::{Point, Rect};
use peniko::Color;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for objects.
pub type ObjectId = String;

/// Generate a fresh object identifier.
pub fn new_object_id() -> ObjectId {
    Uuid::new_v4().to_string()
}

/// Serializable color, persisted as a `#rrggbb` / `#rrggbbaa` hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub const fn black() -> Self {
        Self::rgb(0, 0, 0)
    }

    pub const fn white() -> Self {
        Self::rgb(255, 255, 255)
    }

    pub const fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Alpha as a 0-1 fraction.
    pub fn alpha(&self) -> f64 {
        self.a as f64 / 255.0
    }

    /// Hex form without alpha, as used by SVG paint attributes.
    pub fn to_hex_rgb(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl FromStr for Rgba {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("transparent") {
            return Ok(Self::transparent());
        }
        let hex = s
            .strip_prefix('#')
            .ok_or_else(|| ModelError::InvalidColor(s.to_string()))?;
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| ModelError::InvalidColor(s.to_string()))
        };
        let short = |idx: usize| {
            u8::from_str_radix(&hex[idx..idx + 1], 16)
                .map(|v| v * 17)
                .map_err(|_| ModelError::InvalidColor(s.to_string()))
        };
        if !hex.is_ascii() {
            return Err(ModelError::InvalidColor(s.to_string()));
        }
        match hex.len() {
            3 => Ok(Self::rgb(short(0)?, short(1)?, short(2)?)),
            6 => Ok(Self::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
            8 => Ok(Self::new(
                channel(0..2)?,
                channel(2..4)?,
                channel(4..6)?,
                channel(6..8)?,
            )),
            _ => Err(ModelError::InvalidColor(s.to_string())),
        }
    }
}

impl TryFrom<String> for Rgba {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgba> for String {
    fn from(color: Rgba) -> Self {
        color.to_string()
    }
}

impl From<Color> for Rgba {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self::new(rgba.r, rgba.g, rgba.b, rgba.a)
    }
}

impl From<Rgba> for Color {
    fn from(color: Rgba) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Drop shadow / glow settings shared by several object kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shadow {
    pub enabled: bool,
    pub color: Rgba,
    pub blur: f64,
    #[serde(default)]
    pub offset_x: f64,
    #[serde(default)]
    pub offset_y: f64,
}

impl Default for Shadow {
    fn default() -> Self {
        Self {
            enabled: false,
            color: Rgba::new(0, 0, 0, 160),
            blur: 10.0,
            offset_x: 4.0,
            offset_y: 4.0,
        }
    }
}

impl Shadow {
    /// A centered glow in the given color.
    pub fn glow(color: Rgba, blur: f64) -> Self {
        Self {
            enabled: true,
            color,
            blur,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }
}

/// Reject display sizes that are negative or not finite.
pub(crate) fn check_display_size(id: &str, width: f64, height: f64) -> ModelResult<()> {
    let valid = |v: f64| v.is_finite() && v >= 0.0;
    if valid(width) && valid(height) {
        Ok(())
    } else {
        Err(ModelError::InvalidObject(format!(
            "{id} has invalid size {width}x{height}"
        )))
    }
}

fn default_opacity() -> f64 {
    1.0
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Fields shared by every object variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectBase {
    pub id: ObjectId,
    /// Position in document space.
    pub x: f64,
    pub y: f64,
    /// Rotation in degrees.
    #[serde(default)]
    pub rotation: f64,
    /// Paint order; higher paints on top.
    pub z_index: i64,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default, skip_serializing_if = "is_false")]
    pub locked: bool,
}

impl ObjectBase {
    /// Create a base record with a fresh identifier.
    pub fn new(position: Point, z_index: i64) -> Self {
        Self {
            id: new_object_id(),
            x: position.x,
            y: position.y,
            rotation: 0.0,
            z_index,
            opacity: 1.0,
            locked: false,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Discriminant of an object, without its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Text,
    Arrow,
    Image,
    Shape,
}

impl ObjectKind {
    /// The persisted `type` tag.
    pub fn tag(self) -> &'static str {
        match self {
            ObjectKind::Text => "text",
            ObjectKind::Arrow => "arrow",
            ObjectKind::Image => "image",
            ObjectKind::Shape => "shape",
        }
    }
}

/// One placed element of the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Object {
    Text(TextObject),
    Arrow(ArrowObject),
    Image(ImageObject),
    Shape(ShapeObject),
}

impl Object {
    pub fn base(&self) -> &ObjectBase {
        match self {
            Object::Text(o) => &o.base,
            Object::Arrow(o) => &o.base,
            Object::Image(o) => &o.base,
            Object::Shape(o) => &o.base,
        }
    }

    pub fn base_mut(&mut self) -> &mut ObjectBase {
        match self {
            Object::Text(o) => &mut o.base,
            Object::Arrow(o) => &mut o.base,
            Object::Image(o) => &mut o.base,
            Object::Shape(o) => &mut o.base,
        }
    }

    pub fn id(&self) -> &str {
        &self.base().id
    }

    pub fn kind(&self) -> ObjectKind {
        match self {
            Object::Text(_) => ObjectKind::Text,
            Object::Arrow(_) => ObjectKind::Arrow,
            Object::Image(_) => ObjectKind::Image,
            Object::Shape(_) => ObjectKind::Shape,
        }
    }

    pub fn z_index(&self) -> i64 {
        self.base().z_index
    }

    pub fn position(&self) -> Point {
        self.base().position()
    }

    pub fn is_locked(&self) -> bool {
        self.base().locked
    }

    /// Axis-aligned bounds in document space (rotation included).
    pub fn bounds(&self) -> Rect {
        crate::geometry::object_bounds(self)
    }

    /// Check if a document-space point hits this object.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        crate::geometry::hit_test(self, point, tolerance)
    }

    /// Replace the identifier (used when duplicating).
    pub fn regenerate_id(&mut self) {
        self.base_mut().id = new_object_id();
    }

    /// Check the invariants each variant must hold.
    pub fn validate(&self) -> ModelResult<()> {
        let base = self.base();
        if base.id.is_empty() {
            return Err(ModelError::InvalidObject("empty id".to_string()));
        }
        if !(0.0..=1.0).contains(&base.opacity) {
            return Err(ModelError::InvalidObject(format!(
                "opacity {} out of range for {}",
                base.opacity, base.id
            )));
        }
        match self {
            Object::Arrow(arrow) => arrow.validate(),
            Object::Image(image) => image.validate(),
            Object::Shape(shape) => shape.validate(),
            Object::Text(_) => Ok(()),
        }
    }
}
