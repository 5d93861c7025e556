//! Live render surface.
//!
//! Holds the on-screen viewport, display size and the last painted frame.
//! Exports temporarily force the surface to the canvas size at scale 1 and
//! put everything back afterwards, even when encoding fails.

use crate::assets::AssetLoader;
use crate::error::{RenderError, RenderResult};
use crate::export::{self, ExportConfig, ExportFormat, ExportOutput};
use crate::raster::Rasterizer;
use crate::scene::{SceneOptions, build_svg};
use kurbo::Size;
use thumbforge_core::{CANVAS_HEIGHT, CANVAS_WIDTH, Document, Viewport, ViewportState};
use tiny_skia::Pixmap;

/// The editor's drawing surface.
pub struct RenderSurface {
    pub viewport: Viewport,
    /// Display size in pixels.
    size: Size,
    pub assets: AssetLoader,
    rasterizer: Rasterizer,
    config: ExportConfig,
    /// Last painted frame.
    frame: Option<Pixmap>,
    /// Draw the safe-area guide on live frames.
    pub show_guides: bool,
}

impl RenderSurface {
    pub fn new(size: Size, assets: AssetLoader, config: ExportConfig) -> Self {
        let mut viewport = Viewport::default();
        viewport.fit_container(size);
        Self {
            viewport,
            size,
            assets,
            rasterizer: Rasterizer::new(&config.fonts),
            config,
            frame: None,
            show_guides: true,
        }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Change the display size. The base scale follows the new width.
    pub fn resize(&mut self, size: Size) {
        self.size = size;
        self.viewport.set_container_width(size.width);
    }

    pub fn frame(&self) -> Option<&Pixmap> {
        self.frame.as_ref()
    }

    /// Paint `document` at the current size and viewport.
    pub fn repaint(&mut self, document: &Document) -> RenderResult<()> {
        self.assets.preload(document);
        let options = SceneOptions {
            width: self.size.width.round().max(1.0) as u32,
            height: self.size.height.round().max(1.0) as u32,
            transform: self.viewport.transform(),
            show_guides: self.show_guides,
        };
        let svg = build_svg(document, &self.assets, &options);
        self.frame = Some(self.rasterizer.rasterize(&svg, options.width, options.height)?);
        Ok(())
    }

    /// Export `document` at 1280×720 with the configured encoder.
    pub fn export(&mut self, document: &Document, format: ExportFormat) -> RenderResult<ExportOutput> {
        let config = self.config.clone();
        self.export_with(document, |pixmap| export::encode(pixmap, document, format, &config))
    }

    /// Export using a custom encoder for the canvas-sized frame.
    ///
    /// The live viewport and size are restored and repainted before this
    /// returns, whatever `encode` does.
    pub fn export_with<T>(
        &mut self,
        document: &Document,
        encode: impl FnOnce(&Pixmap) -> RenderResult<T>,
    ) -> RenderResult<T> {
        let mut guard = RestoreGuard::new(self, document);
        let surface = &mut *guard.surface;
        surface.size = Size::new(CANVAS_WIDTH, CANVAS_HEIGHT);
        surface.viewport.restore(ViewportState::default());
        let show_guides = std::mem::replace(&mut surface.show_guides, false);
        let painted = surface.repaint(document);
        surface.show_guides = show_guides;
        painted?;

        let pixmap = surface.frame.as_ref().ok_or(RenderError::Surface {
            width: CANVAS_WIDTH as u32,
            height: CANVAS_HEIGHT as u32,
        })?;
        encode(pixmap)
    }
}

/// Puts the live view back when an export scope ends.
struct RestoreGuard<'a> {
    surface: &'a mut RenderSurface,
    document: &'a Document,
    state: ViewportState,
    size: Size,
}

impl<'a> RestoreGuard<'a> {
    fn new(surface: &'a mut RenderSurface, document: &'a Document) -> Self {
        let state = surface.viewport.snapshot();
        let size = surface.size;
        Self {
            surface,
            document,
            state,
            size,
        }
    }
}

impl Drop for RestoreGuard<'_> {
    fn drop(&mut self) {
        self.surface.viewport.restore(self.state);
        self.surface.size = self.size;
        if let Err(e) = self.surface.repaint(self.document) {
            log::warn!("Failed to repaint after export: {}", e);
        }
    }
}
