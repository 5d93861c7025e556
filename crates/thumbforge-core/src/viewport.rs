//! Viewport module for pan/zoom transforms.
//!
//! Maps between screen pixels and the fixed 1280×720 document space:
//! `document = (screen - pan) / (base_scale * zoom)`.

use crate::document::{CANVAS_HEIGHT, CANVAS_WIDTH};
use kurbo::{Affine, Point, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Multiplicative zoom change for one wheel notch.
pub const ZOOM_STEP: f64 = 1.1;

/// Zoom limits and step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportConfig {
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub zoom_step: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_zoom: 0.25,
            max_zoom: 4.0,
            zoom_step: ZOOM_STEP,
        }
    }
}

/// Saved zoom, pan and base scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportState {
    pub zoom: f64,
    pub pan: Vec2,
    pub base_scale: f64,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: Vec2::ZERO,
            base_scale: 1.0,
        }
    }
}

/// The editor's view onto the document.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    state: ViewportState,
    config: ViewportConfig,
    /// `pointer - pan` recorded at the start of a drag.
    pan_anchor: Option<Vec2>,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(ViewportConfig::default())
    }
}

impl Viewport {
    pub fn new(config: ViewportConfig) -> Self {
        Self {
            state: ViewportState::default(),
            config,
            pan_anchor: None,
        }
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    pub fn zoom(&self) -> f64 {
        self.state.zoom
    }

    pub fn pan(&self) -> Vec2 {
        self.state.pan
    }

    pub fn base_scale(&self) -> f64 {
        self.state.base_scale
    }

    /// Effective document-to-screen scale.
    pub fn scale(&self) -> f64 {
        self.state.base_scale * self.state.zoom
    }

    /// Get the affine transform for rendering (document to screen).
    pub fn transform(&self) -> Affine {
        Affine::translate(self.state.pan) * Affine::scale(self.scale())
    }

    /// Get the inverse transform for input handling (screen to document).
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.scale()) * Affine::translate(-self.state.pan)
    }

    /// Convert a screen point to document coordinates.
    pub fn screen_to_document(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    /// Convert a document point to screen coordinates.
    pub fn document_to_screen(&self, document_point: Point) -> Point {
        self.transform() * document_point
    }

    /// Set zoom directly, clamped to the configured range.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.state.zoom = zoom.clamp(self.config.min_zoom, self.config.max_zoom);
    }

    pub fn set_pan(&mut self, pan: Vec2) {
        self.state.pan = pan;
    }

    /// Zoom by `factor`, keeping the document point under `pointer` fixed.
    pub fn zoom_at(&mut self, pointer: Point, factor: f64) {
        let new_zoom = (self.state.zoom * factor).clamp(self.config.min_zoom, self.config.max_zoom);
        if (new_zoom - self.state.zoom).abs() < f64::EPSILON {
            return;
        }

        let anchor = self.screen_to_document(pointer);
        self.state.zoom = new_zoom;

        // Solve pan so the anchor maps back onto the pointer.
        let scaled = anchor.to_vec2() * self.scale();
        self.state.pan = pointer.to_vec2() - scaled;
    }

    /// Apply a wheel event. Negative `delta_y` (wheel up) zooms in.
    pub fn wheel_zoom(&mut self, pointer: Point, delta_y: f64) {
        if delta_y == 0.0 {
            return;
        }
        let factor = if delta_y < 0.0 {
            self.config.zoom_step
        } else {
            1.0 / self.config.zoom_step
        };
        self.zoom_at(pointer, factor);
    }

    /// Start a drag pan at `pointer`.
    pub fn begin_pan(&mut self, pointer: Point) {
        self.pan_anchor = Some(pointer.to_vec2() - self.state.pan);
    }

    /// Continue a drag pan. Ignored when no pan is active.
    pub fn pan_to(&mut self, pointer: Point) {
        if let Some(anchor) = self.pan_anchor {
            self.state.pan = pointer.to_vec2() - anchor;
        }
    }

    /// Release a drag pan.
    pub fn end_pan(&mut self) {
        self.pan_anchor = None;
    }

    pub fn is_panning(&self) -> bool {
        self.pan_anchor.is_some()
    }

    /// Pan the viewport by a delta in screen coordinates.
    pub fn pan_by(&mut self, delta: Vec2) {
        self.state.pan += delta;
    }

    /// Scale factor keeping handles a constant on-screen size.
    pub fn handle_scale(&self) -> f64 {
        1.0 / self.scale()
    }

    /// Recompute the base scale from the container width.
    pub fn set_container_width(&mut self, width: f64) {
        if width > 0.0 {
            self.state.base_scale = width / CANVAS_WIDTH;
        }
    }

    /// Fit the document inside `container`, centered, at zoom 1.
    pub fn fit_container(&mut self, container: Size) {
        if container.width <= 0.0 || container.height <= 0.0 {
            return;
        }
        self.state.base_scale = (container.width / CANVAS_WIDTH).min(container.height / CANVAS_HEIGHT);
        self.state.zoom = 1.0_f64.clamp(self.config.min_zoom, self.config.max_zoom);
        let scale = self.scale();
        self.state.pan = Vec2::new(
            (container.width - CANVAS_WIDTH * scale) / 2.0,
            (container.height - CANVAS_HEIGHT * scale) / 2.0,
        );
    }

    /// Reset zoom and pan, keeping the base scale.
    pub fn reset(&mut self) {
        self.state.zoom = 1.0;
        self.state.pan = Vec2::ZERO;
        self.pan_anchor = None;
    }

    /// Capture the current zoom, pan and base scale.
    pub fn snapshot(&self) -> ViewportState {
        self.state
    }

    /// Restore a captured state.
    pub fn restore(&mut self, state: ViewportState) {
        self.state = state;
        self.pan_anchor = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_identity() {
        let viewport = Viewport::default();
        let p = Point::new(100.0, 200.0);
        assert_eq!(viewport.screen_to_document(p), p);
    }

    #[test]
    fn test_screen_to_document_formula() {
        let mut viewport = Viewport::default();
        viewport.set_container_width(640.0);
        viewport.set_zoom(2.0);
        viewport.set_pan(Vec2::new(10.0, 20.0));
        let doc = viewport.screen_to_document(Point::new(110.0, 220.0));
        assert!((doc.x - 100.0).abs() < 1e-9);
        assert!((doc.y - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_roundtrip_conversion() {
        let mut viewport = Viewport::default();
        viewport.set_pan(Vec2::new(30.0, -20.0));
        viewport.set_zoom(1.5);
        viewport.set_container_width(900.0);

        let original = Point::new(123.0, 456.0);
        let back = viewport.document_to_screen(viewport.screen_to_document(original));
        assert!((back.x - original.x).abs() < 1e-10);
        assert!((back.y - original.y).abs() < 1e-10);
    }

    #[test]
    fn test_wheel_zoom_keeps_pointer_anchor() {
        let mut viewport = Viewport::default();
        viewport.set_container_width(1000.0);
        viewport.set_pan(Vec2::new(40.0, 15.0));
        let pointer = Point::new(300.0, 250.0);
        let before = viewport.screen_to_document(pointer);

        viewport.wheel_zoom(pointer, -120.0);
        assert!((viewport.zoom() - ZOOM_STEP).abs() < 1e-12);
        let after = viewport.screen_to_document(pointer);
        assert!((before.x - after.x).abs() < 1e-9);
        assert!((before.y - after.y).abs() < 1e-9);

        viewport.wheel_zoom(pointer, 120.0);
        assert!((viewport.zoom() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zoom_clamp() {
        let mut viewport = Viewport::default();
        for _ in 0..100 {
            viewport.wheel_zoom(Point::ZERO, 1.0);
        }
        assert!((viewport.zoom() - 0.25).abs() < f64::EPSILON);
        for _ in 0..100 {
            viewport.wheel_zoom(Point::ZERO, -1.0);
        }
        assert!((viewport.zoom() - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_drag_pan() {
        let mut viewport = Viewport::default();
        viewport.set_pan(Vec2::new(5.0, 5.0));
        viewport.pan_to(Point::new(100.0, 100.0));
        assert_eq!(viewport.pan(), Vec2::new(5.0, 5.0));

        viewport.begin_pan(Point::new(10.0, 10.0));
        viewport.pan_to(Point::new(30.0, 50.0));
        assert_eq!(viewport.pan(), Vec2::new(25.0, 45.0));
        viewport.end_pan();
        viewport.pan_to(Point::new(0.0, 0.0));
        assert_eq!(viewport.pan(), Vec2::new(25.0, 45.0));
    }

    #[test]
    fn test_handle_scale() {
        let mut viewport = Viewport::default();
        viewport.set_container_width(640.0);
        viewport.set_zoom(2.0);
        assert!((viewport.handle_scale() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_fit_container_centers() {
        let mut viewport = Viewport::default();
        viewport.fit_container(Size::new(1280.0, 1000.0));
        assert!((viewport.base_scale() - 1.0).abs() < 1e-12);
        assert!((viewport.pan().y - 140.0).abs() < 1e-9);
    }

    #[test]
    fn test_snapshot_restore() {
        let mut viewport = Viewport::default();
        viewport.set_zoom(3.0);
        viewport.set_pan(Vec2::new(500.0, 500.0));
        let saved = viewport.snapshot();
        viewport.reset();
        viewport.restore(saved);
        assert_eq!(viewport.snapshot(), saved);
    }
}
