//! Arrow object and its named style presets.

use super::{ObjectBase, Rgba, Shadow};
use crate::error::{ModelError, ModelResult};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Outline drawn around the arrow body and head.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    pub color: Rgba,
    pub width: f64,
}

/// Dash pattern for the arrow body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dash {
    pub length: f64,
    pub gap: f64,
}

/// Named arrow styles. Each one is a bundle of defaults, see [`ArrowStyle::preset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrowStyle {
    #[default]
    Classic,
    Tapered,
    Thick,
    Outlined,
    Glow,
    Neon,
    Sketch,
    Double,
}

/// Values an [`ArrowStyle`] assigns when applied.
#[derive(Debug, Clone, PartialEq)]
pub struct StylePreset {
    pub thickness: f64,
    pub arrowhead_size: f64,
    pub start_arrowhead: bool,
    pub outline: Option<Outline>,
    /// Glow blur; the glow takes the arrow color.
    pub glow: Option<f64>,
    pub drop_shadow: bool,
    pub dash: Option<Dash>,
    /// Color forced by the style.
    pub color: Option<Rgba>,
}

impl ArrowStyle {
    pub fn all() -> &'static [ArrowStyle] {
        &[
            ArrowStyle::Classic,
            ArrowStyle::Tapered,
            ArrowStyle::Thick,
            ArrowStyle::Outlined,
            ArrowStyle::Glow,
            ArrowStyle::Neon,
            ArrowStyle::Sketch,
            ArrowStyle::Double,
        ]
    }

    pub fn preset(self) -> StylePreset {
        let base = StylePreset {
            thickness: 10.0,
            arrowhead_size: 2.0,
            start_arrowhead: false,
            outline: None,
            glow: None,
            drop_shadow: false,
            dash: None,
            color: None,
        };
        match self {
            ArrowStyle::Classic => base,
            ArrowStyle::Tapered => StylePreset {
                thickness: 16.0,
                arrowhead_size: 1.8,
                ..base
            },
            ArrowStyle::Thick => StylePreset {
                thickness: 22.0,
                arrowhead_size: 1.6,
                drop_shadow: true,
                ..base
            },
            ArrowStyle::Outlined => StylePreset {
                thickness: 12.0,
                outline: Some(Outline {
                    color: Rgba::black(),
                    width: 5.0,
                }),
                ..base
            },
            ArrowStyle::Glow => StylePreset {
                thickness: 10.0,
                glow: Some(18.0),
                ..base
            },
            ArrowStyle::Neon => StylePreset {
                thickness: 8.0,
                glow: Some(26.0),
                color: Some(Rgba::rgb(57, 255, 20)),
                outline: Some(Outline {
                    color: Rgba::white(),
                    width: 2.0,
                }),
                ..base
            },
            ArrowStyle::Sketch => StylePreset {
                thickness: 6.0,
                arrowhead_size: 2.5,
                dash: Some(Dash {
                    length: 18.0,
                    gap: 10.0,
                }),
                ..base
            },
            ArrowStyle::Double => StylePreset {
                start_arrowhead: true,
                ..base
            },
        }
    }

    pub fn is_tapered(self) -> bool {
        self == ArrowStyle::Tapered
    }
}

/// An arrow defined by a flat coordinate list relative to its position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrowObject {
    #[serde(flatten)]
    pub base: ObjectBase,
    /// `[x1, y1, x2, y2, ...]`; even length, at least two points.
    pub points: Vec<f64>,
    #[serde(default)]
    pub is_curved: bool,
    #[serde(default)]
    pub style: ArrowStyle,
    pub color: Rgba,
    pub thickness: f64,
    pub arrowhead_size: f64,
    #[serde(default)]
    pub start_arrowhead: bool,
    #[serde(default = "default_true")]
    pub end_arrowhead: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outline: Option<Outline>,
    #[serde(default)]
    pub shadow: Shadow,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dash: Option<Dash>,
}

fn default_true() -> bool {
    true
}

impl ArrowObject {
    pub const DEFAULT_COLOR: Rgba = Rgba::rgb(239, 68, 68);

    /// Create a classic arrow.
    pub fn new(position: Point, points: Vec<f64>, z_index: i64) -> Self {
        Self::with_style(position, points, ArrowStyle::Classic, z_index)
    }

    /// Create an arrow with a style preset applied.
    pub fn with_style(position: Point, points: Vec<f64>, style: ArrowStyle, z_index: i64) -> Self {
        let mut arrow = Self {
            base: ObjectBase::new(position, z_index),
            points,
            is_curved: false,
            style,
            color: Self::DEFAULT_COLOR,
            thickness: 10.0,
            arrowhead_size: 2.0,
            start_arrowhead: false,
            end_arrowhead: true,
            outline: None,
            shadow: Shadow::default(),
            dash: None,
        };
        arrow.apply_style(style);
        arrow
    }

    /// Switch style, overwriting the fields the preset controls.
    pub fn apply_style(&mut self, style: ArrowStyle) {
        let preset = style.preset();
        self.style = style;
        self.thickness = preset.thickness;
        self.arrowhead_size = preset.arrowhead_size;
        self.start_arrowhead = preset.start_arrowhead;
        self.end_arrowhead = true;
        self.outline = preset.outline;
        self.dash = preset.dash;
        if let Some(color) = preset.color {
            self.color = color;
        }
        self.shadow = match preset.glow {
            Some(blur) => Shadow::glow(self.color, blur),
            None => Shadow {
                enabled: preset.drop_shadow,
                ..Shadow::default()
            },
        };
    }

    /// Points as relative (to the arrow position) coordinates.
    pub fn local_points(&self) -> Vec<Point> {
        self.points
            .chunks_exact(2)
            .map(|c| Point::new(c[0], c[1]))
            .collect()
    }

    /// Points in document space.
    pub fn document_points(&self) -> Vec<Point> {
        let (ox, oy) = (self.base.x, self.base.y);
        self.points
            .chunks_exact(2)
            .map(|c| Point::new(c[0] + ox, c[1] + oy))
            .collect()
    }

    pub(crate) fn validate(&self) -> ModelResult<()> {
        if self.points.len() < 4 || self.points.len() % 2 != 0 {
            return Err(ModelError::InvalidObject(format!(
                "arrow {} needs an even number (>= 4) of coordinates, got {}",
                self.base.id,
                self.points.len()
            )));
        }
        if self.thickness < 0.0 || self.arrowhead_size < 0.0 {
            return Err(ModelError::InvalidObject(format!(
                "arrow {} has negative thickness or head size",
                self.base.id
            )));
        }
        Ok(())
    }
}
