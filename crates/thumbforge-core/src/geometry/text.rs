//! Estimated text layout.
//!
//! Fonts are not loaded by the core, so block sizes are estimated from the
//! character count. The estimate drives bounds, background pills and snapping;
//! the rasterizer lays out the real glyphs.

use crate::objects::{TextAlign, TextObject};
use kurbo::Rect;

/// Average advance of a glyph as a fraction of the font size.
pub const AVERAGE_GLYPH_ADVANCE: f64 = 0.56;

/// Extra advance applied to heavy weights (>= 600).
const BOLD_ADVANCE_FACTOR: f64 = 1.08;

/// Estimated layout of a text block.
#[derive(Debug, Clone, PartialEq)]
pub struct TextMetrics {
    pub width: f64,
    pub height: f64,
    pub line_widths: Vec<f64>,
    /// Distance between consecutive baselines.
    pub line_advance: f64,
}

impl TextMetrics {
    /// Horizontal offset of a line inside the block for the given alignment.
    pub fn line_offset(&self, line: usize, align: TextAlign) -> f64 {
        let line_width = self.line_widths.get(line).copied().unwrap_or(0.0);
        match align {
            TextAlign::Left => 0.0,
            TextAlign::Center => (self.width - line_width) / 2.0,
            TextAlign::Right => self.width - line_width,
        }
    }
}

/// Estimate the block size of a text object.
pub fn measure_text(text: &TextObject) -> TextMetrics {
    let advance = text.font_size
        * AVERAGE_GLYPH_ADVANCE
        * if text.font_weight >= 600 { BOLD_ADVANCE_FACTOR } else { 1.0 };

    let line_widths: Vec<f64> = text
        .lines()
        .map(|line| {
            let chars = line.chars().count();
            if chars == 0 {
                0.0
            } else {
                chars as f64 * advance + text.letter_spacing * (chars - 1) as f64
            }
        })
        .collect();

    let line_advance = text.font_size * text.line_height;
    let width = line_widths.iter().copied().fold(0.0, f64::max);
    let height = line_advance * line_widths.len() as f64;

    TextMetrics {
        width,
        height,
        line_widths,
        line_advance,
    }
}

/// Unrotated text block in document space.
pub fn text_block_rect(text: &TextObject) -> Rect {
    let metrics = measure_text(text);
    Rect::new(
        text.base.x,
        text.base.y,
        text.base.x + metrics.width,
        text.base.y + metrics.height,
    )
}

/// The block plus the background pill, when enabled.
pub fn text_outer_rect(text: &TextObject) -> Rect {
    let block = text_block_rect(text);
    if text.background.enabled {
        block.inflate(text.background.padding, text.background.padding)
    } else {
        block
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    #[test]
    fn test_multiline_height() {
        let mut text = TextObject::new(Point::ZERO, "ab\ncdef", 1);
        text.font_size = 10.0;
        text.font_weight = 400;
        text.line_height = 1.5;
        let metrics = measure_text(&text);
        assert!((metrics.height - 30.0).abs() < 1e-9);
        assert!((metrics.line_widths[1] - 4.0 * 5.6).abs() < 1e-9);
        assert!((metrics.width - metrics.line_widths[1]).abs() < 1e-9);
    }

    #[test]
    fn test_letter_spacing_between_glyphs() {
        let mut text = TextObject::new(Point::ZERO, "abc", 1);
        text.font_size = 10.0;
        text.font_weight = 400;
        let plain = measure_text(&text).width;
        text.letter_spacing = 2.0;
        assert!((measure_text(&text).width - plain - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_alignment_offsets() {
        let mut text = TextObject::new(Point::ZERO, "a\nabc", 1);
        text.font_weight = 400;
        let metrics = measure_text(&text);
        let diff = metrics.width - metrics.line_widths[0];
        assert_eq!(metrics.line_offset(0, TextAlign::Left), 0.0);
        assert!((metrics.line_offset(0, TextAlign::Center) - diff / 2.0).abs() < 1e-9);
        assert!((metrics.line_offset(0, TextAlign::Right) - diff).abs() < 1e-9);
    }

    #[test]
    fn test_pill_inflates_bounds() {
        let mut text = TextObject::new(Point::new(100.0, 100.0), "Hi", 1);
        text.background.enabled = true;
        text.background.padding = 10.0;
        let outer = text_outer_rect(&text);
        let block = text_block_rect(&text);
        assert!((outer.x0 - (block.x0 - 10.0)).abs() < 1e-9);
        assert!((outer.y1 - (block.y1 + 10.0)).abs() < 1e-9);
    }
}
