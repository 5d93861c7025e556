//! Text object.

use super::{ObjectBase, Rgba, Shadow};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Horizontal alignment of text lines inside the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl TextAlign {
    /// SVG `text-anchor` value.
    pub fn anchor(self) -> &'static str {
        match self {
            TextAlign::Left => "start",
            TextAlign::Center => "middle",
            TextAlign::Right => "end",
        }
    }
}

/// Outline drawn around glyphs. A width of zero disables it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStroke {
    pub color: Rgba,
    pub width: f64,
}

impl Default for TextStroke {
    fn default() -> Self {
        Self {
            color: Rgba::black(),
            width: 0.0,
        }
    }
}

impl TextStroke {
    pub fn is_enabled(&self) -> bool {
        self.width > 0.0
    }
}

/// Rounded "pill" drawn behind the text block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextBackground {
    pub enabled: bool,
    pub color: Rgba,
    pub padding: f64,
    pub corner_radius: f64,
}

impl Default for TextBackground {
    fn default() -> Self {
        Self {
            enabled: false,
            color: Rgba::rgb(255, 214, 0),
            padding: 16.0,
            corner_radius: 12.0,
        }
    }
}

/// A block of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextObject {
    #[serde(flatten)]
    pub base: ObjectBase,
    /// The text content; `\n` separates lines.
    pub text: String,
    pub font_family: String,
    /// Font size in document pixels.
    pub font_size: f64,
    /// CSS-style numeric weight (400 regular, 700 bold).
    pub font_weight: u16,
    #[serde(default)]
    pub letter_spacing: f64,
    /// Line height as a multiple of the font size.
    pub line_height: f64,
    #[serde(default)]
    pub align: TextAlign,
    pub fill: Rgba,
    #[serde(default)]
    pub stroke: TextStroke,
    #[serde(default)]
    pub shadow: Shadow,
    #[serde(default)]
    pub background: TextBackground,
}

impl TextObject {
    pub const DEFAULT_FONT_SIZE: f64 = 72.0;
    pub const DEFAULT_FONT_FAMILY: &'static str = "Inter";
    pub const DEFAULT_LINE_HEIGHT: f64 = 1.2;

    /// Create a new text object with default typography.
    pub fn new(position: Point, text: impl Into<String>, z_index: i64) -> Self {
        Self {
            base: ObjectBase::new(position, z_index),
            text: text.into(),
            font_family: Self::DEFAULT_FONT_FAMILY.to_string(),
            font_size: Self::DEFAULT_FONT_SIZE,
            font_weight: 800,
            letter_spacing: 0.0,
            line_height: Self::DEFAULT_LINE_HEIGHT,
            align: TextAlign::Left,
            fill: Rgba::white(),
            stroke: TextStroke::default(),
            shadow: Shadow::default(),
            background: TextBackground::default(),
        }
    }

    /// Lines of the text content.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.split('\n')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_defaults() {
        let text = TextObject::new(Point::new(1.0, 2.0), "Hello", 4);
        assert_eq!(text.base.z_index, 4);
        assert_eq!(text.fill, Rgba::white());
        assert!(!text.stroke.is_enabled());
        assert!(!text.background.enabled);
    }

    #[test]
    fn test_lines() {
        let text = TextObject::new(Point::ZERO, "one\ntwo", 1);
        assert_eq!(text.lines().collect::<Vec<_>>(), vec!["one", "two"]);
    }

    #[test]
    fn test_missing_optional_sections_default() {
        let json = r##"{
            "id": "t1", "x": 0, "y": 0, "zIndex": 1,
            "text": "x", "fontFamily": "Inter", "fontSize": 40,
            "fontWeight": 400, "lineHeight": 1.2, "fill": "#ffffff"
        }"##;
        let text: TextObject = serde_json::from_str(json).unwrap();
        assert_eq!(text.base.opacity, 1.0);
        assert_eq!(text.stroke, TextStroke::default());
        assert_eq!(text.align, TextAlign::Left);
    }
}
