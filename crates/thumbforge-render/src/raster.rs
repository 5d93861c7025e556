//! SVG to pixmap rasterization.

use crate::error::{RenderError, RenderResult};
use std::sync::Arc;
use tiny_skia::Pixmap;

/// Font setup for the rasterizer.
#[derive(Debug, Clone, Default)]
pub struct FontConfig {
    /// Load fonts installed on the host.
    pub load_system_fonts: bool,
    /// Extra font files (TTF/OTF bytes).
    pub font_data: Vec<Vec<u8>>,
}

/// Parses SVG scenes and renders them with resvg.
pub struct Rasterizer {
    options: usvg::Options<'static>,
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new(&FontConfig::default())
    }
}

impl Rasterizer {
    pub fn new(fonts: &FontConfig) -> Self {
        let mut options = usvg::Options {
            font_family: "sans-serif".to_string(),
            ..usvg::Options::default()
        };
        let fontdb = Arc::make_mut(&mut options.fontdb);
        if fonts.load_system_fonts {
            fontdb.load_system_fonts();
        }
        for data in &fonts.font_data {
            fontdb.load_font_data(data.clone());
        }
        log::debug!("Rasterizer ready with {} font faces", fontdb.len());
        Self { options }
    }

    /// Number of font faces available to text rendering.
    pub fn font_count(&self) -> usize {
        self.options.fontdb.len()
    }

    /// Render an SVG string into a pixmap of exactly `width` × `height`.
    pub fn rasterize(&self, svg: &str, width: u32, height: u32) -> RenderResult<Pixmap> {
        let tree =
            usvg::Tree::from_str(svg, &self.options).map_err(|e| RenderError::Svg(e.to_string()))?;

        let mut pixmap = Pixmap::new(width, height).ok_or(RenderError::Surface { width, height })?;
        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());
        Ok(pixmap)
    }
}
