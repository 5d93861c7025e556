//! Document export to PNG and JPEG.
//!
//! Exports always cover the full 1280×720 canvas at scale 1, independent of
//! any live viewport.

use crate::assets::AssetLoader;
use crate::error::{RenderError, RenderResult};
use crate::raster::{FontConfig, Rasterizer};
use crate::scene::{SceneOptions, build_svg};
use image::ImageEncoder;
use thumbforge_core::Document;
use thumbforge_core::objects::Rgba;
use tiny_skia::Pixmap;

/// Default JPEG quality (0.92 on a 0..1 scale).
pub const DEFAULT_JPEG_QUALITY: u8 = 92;

/// Export output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExportFormat {
    /// Lossless PNG with alpha.
    #[default]
    Png,
    /// Lossy JPEG, flattened onto the background.
    Jpeg,
}

impl ExportFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Jpeg => "image/jpeg",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpg",
        }
    }

    /// Guess the format from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(ExportFormat::Png),
            "jpg" | "jpeg" => Some(ExportFormat::Jpeg),
            _ => None,
        }
    }
}

/// Configuration for export.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// JPEG quality 1-100.
    pub jpeg_quality: u8,
    pub fonts: FontConfig,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            fonts: FontConfig {
                load_system_fonts: true,
                font_data: Vec::new(),
            },
        }
    }
}

/// Encoded image handed to the consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutput {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: ExportFormat,
}

impl ExportOutput {
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }
}

/// Color JPEG output is flattened onto. Transparent documents go onto black.
pub fn flatten_color(document: &Document) -> Rgba {
    if document.settings.transparent_background {
        Rgba::black()
    } else {
        document.settings.background_color
    }
}

/// Encode a premultiplied pixmap as RGBA8 PNG.
pub fn encode_png(pixmap: &Pixmap) -> RenderResult<Vec<u8>> {
    let mut rgba = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }

    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, pixmap.width(), pixmap.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder.write_header().map_err(|e| {
            log::error!("Failed to write PNG header: {:?}", e);
            RenderError::Png(e.to_string())
        })?;
        writer.write_image_data(&rgba).map_err(|e| {
            log::error!("Failed to write PNG data: {:?}", e);
            RenderError::Png(e.to_string())
        })?;
    }
    Ok(png_data)
}

/// Encode a premultiplied pixmap as JPEG over `background`.
pub fn encode_jpeg(pixmap: &Pixmap, background: Rgba, quality: u8) -> RenderResult<Vec<u8>> {
    let (width, height) = (pixmap.width(), pixmap.height());
    let bg = [background.r, background.g, background.b];
    let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
    for pixel in pixmap.data().chunks_exact(4) {
        let inv = 255 - u16::from(pixel[3]);
        for channel in 0..3 {
            // Premultiplied source-over onto an opaque color.
            let value = u16::from(pixel[channel]) + (u16::from(bg[channel]) * inv + 127) / 255;
            rgb.push(value.min(255) as u8);
        }
    }

    let mut buf = std::io::Cursor::new(Vec::new());
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
    encoder
        .write_image(&rgb, width, height, image::ColorType::Rgb8.into())
        .map_err(|e| RenderError::Jpeg(e.to_string()))?;
    Ok(buf.into_inner())
}

/// Encode a rendered canvas frame.
pub fn encode(
    pixmap: &Pixmap,
    document: &Document,
    format: ExportFormat,
    config: &ExportConfig,
) -> RenderResult<ExportOutput> {
    let bytes = match format {
        ExportFormat::Png => encode_png(pixmap)?,
        ExportFormat::Jpeg => encode_jpeg(pixmap, flatten_color(document), config.jpeg_quality)?,
    };
    Ok(ExportOutput {
        bytes,
        width: pixmap.width(),
        height: pixmap.height(),
        format,
    })
}

/// Render `document` offscreen and encode it.
pub fn export(
    document: &Document,
    assets: &mut AssetLoader,
    format: ExportFormat,
    config: &ExportConfig,
) -> RenderResult<ExportOutput> {
    export_with(document, assets, &Rasterizer::new(&config.fonts), format, config)
}

/// Like [`export`], reusing an existing rasterizer.
pub fn export_with(
    document: &Document,
    assets: &mut AssetLoader,
    rasterizer: &Rasterizer,
    format: ExportFormat,
    config: &ExportConfig,
) -> RenderResult<ExportOutput> {
    let failed = assets.preload(document);
    if failed > 0 {
        log::warn!("{} image(s) unavailable, exporting placeholders", failed);
    }
    let options = SceneOptions::export();
    let svg = build_svg(document, assets, &options);
    let pixmap = rasterizer.rasterize(&svg, options.width, options.height)?;
    let output = encode(&pixmap, document, format, config)?;
    log::info!(
        "Exported {}x{} {} ({} bytes)",
        output.width,
        output.height,
        format.extension(),
        output.bytes.len()
    );
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(color: tiny_skia::Color, w: u32, h: u32) -> Pixmap {
        let mut pixmap = Pixmap::new(w, h).unwrap();
        pixmap.fill(color);
        pixmap
    }

    #[test]
    fn test_format_metadata() {
        assert_eq!(ExportFormat::Png.mime_type(), "image/png");
        assert_eq!(ExportFormat::Jpeg.mime_type(), "image/jpeg");
        assert_eq!(ExportFormat::Jpeg.extension(), "jpg");
        assert_eq!(ExportFormat::from_extension("JPEG"), Some(ExportFormat::Jpeg));
        assert_eq!(ExportFormat::from_extension("gif"), None);
    }

    #[test]
    fn test_png_is_demultiplied() {
        let pixmap = solid(tiny_skia::Color::from_rgba8(200, 100, 0, 128), 2, 2);
        let bytes = encode_png(&pixmap).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        let p = decoded.get_pixel(0, 0);
        assert_eq!(p[3], 128);
        assert!((i32::from(p[0]) - 200).abs() <= 2);
        assert!((i32::from(p[1]) - 100).abs() <= 2);
    }

    #[test]
    fn test_jpeg_flattens_onto_background() {
        let pixmap = Pixmap::new(8, 8).unwrap();
        let bytes = encode_jpeg(&pixmap, Rgba::rgb(255, 255, 255), 92).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (8, 8));
        assert!(decoded.get_pixel(4, 4)[0] > 245);
    }

    #[test]
    fn test_flatten_color_follows_transparency() {
        let mut doc = Document::new();
        assert_eq!(flatten_color(&doc), doc.settings.background_color);
        doc.settings.transparent_background = true;
        assert_eq!(flatten_color(&doc), Rgba::black());
    }
}
