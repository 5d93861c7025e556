//! End-to-end export tests: document -> SVG -> pixmap -> encoded bytes.

use kurbo::{Point, Size, Vec2};
use std::io::Cursor;
use thumbforge_core::objects::{ImageObject, Object, Rgba, ShapeKind, ShapeObject, TextObject};
use thumbforge_core::{Document, ViewportState};
use thumbforge_render::{
    AssetLoader, ExportConfig, ExportFormat, FontConfig, MemoryAssetSource, RenderError,
    RenderSurface, export,
};

fn config() -> ExportConfig {
    ExportConfig {
        fonts: FontConfig::default(),
        ..ExportConfig::default()
    }
}

fn sample_document() -> Document {
    let mut doc = Document::new();
    let mut shape = ShapeObject::new(ShapeKind::Rectangle, Point::new(100.0, 100.0), 200.0, 100.0, 1);
    shape.fill.color = Rgba::rgb(255, 0, 0);
    doc.insert(Object::Shape(shape));
    doc.insert(Object::Text(TextObject::new(Point::new(400.0, 300.0), "Hello", 2)));
    doc
}

fn surface() -> RenderSurface {
    RenderSurface::new(Size::new(800.0, 450.0), AssetLoader::offline(), config())
}

fn decode(bytes: &[u8]) -> image::RgbaImage {
    image::load_from_memory(bytes).unwrap().to_rgba8()
}

fn png_bytes(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(color));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

#[test]
fn test_export_is_canvas_sized_when_zoomed_in() {
    let doc = sample_document();
    let mut surface = surface();
    surface.viewport.set_zoom(3.0);
    surface.viewport.set_pan(Vec2::new(500.0, 500.0));
    let before = surface.viewport.snapshot();

    let output = surface.export(&doc, ExportFormat::Png).unwrap();
    assert_eq!((output.width, output.height), (1280, 720));
    assert_eq!(decode(&output.bytes).dimensions(), (1280, 720));

    assert_eq!(surface.viewport.snapshot(), before);
    assert_eq!(surface.size(), Size::new(800.0, 450.0));
    let frame = surface.frame().unwrap();
    assert_eq!((frame.width(), frame.height()), (800, 450));
}

#[test]
fn test_export_is_canvas_sized_when_zoomed_out() {
    let doc = sample_document();
    let mut surface = surface();
    surface.viewport.restore(ViewportState {
        zoom: 0.25,
        pan: Vec2::ZERO,
        base_scale: 0.625,
    });
    let before = surface.viewport.snapshot();

    let output = surface.export(&doc, ExportFormat::Jpeg).unwrap();
    assert_eq!(output.format, ExportFormat::Jpeg);
    assert_eq!(output.mime_type(), "image/jpeg");
    assert_eq!(decode(&output.bytes).dimensions(), (1280, 720));
    assert_eq!(surface.viewport.snapshot(), before);
}

#[test]
fn test_viewport_restored_when_encoding_fails() {
    let doc = sample_document();
    let mut surface = surface();
    surface.viewport.set_zoom(2.0);
    surface.viewport.set_pan(Vec2::new(-40.0, 12.0));
    let before = surface.viewport.snapshot();

    let mut seen = None;
    let result: Result<(), RenderError> = surface.export_with(&doc, |pixmap| {
        seen = Some((pixmap.width(), pixmap.height()));
        Err(RenderError::Png("disk full".to_string()))
    });

    assert!(matches!(result, Err(RenderError::Png(_))));
    assert_eq!(seen, Some((1280, 720)));
    assert_eq!(surface.viewport.snapshot(), before);
    let frame = surface.frame().unwrap();
    assert_eq!((frame.width(), frame.height()), (800, 450));
}

#[test]
fn test_export_ignores_viewport_transform() {
    let doc = sample_document();
    let mut surface = surface();
    surface.viewport.set_zoom(4.0);
    surface.viewport.set_pan(Vec2::new(-900.0, -300.0));

    let output = surface.export(&doc, ExportFormat::Png).unwrap();
    let img = decode(&output.bytes);
    // Inside the red rectangle at document coordinates.
    assert_eq!(img.get_pixel(200, 150).0, [255, 0, 0, 255]);
    // Background elsewhere.
    assert_eq!(img.get_pixel(20, 20).0, [17, 17, 17, 255]);
}

#[test]
fn test_transparent_background_png() {
    let mut doc = sample_document();
    doc.settings.transparent_background = true;
    let mut assets = AssetLoader::offline();
    let output = export(&doc, &mut assets, ExportFormat::Png, &config()).unwrap();
    let img = decode(&output.bytes);
    assert_eq!(img.get_pixel(20, 20)[3], 0);
    assert_eq!(img.get_pixel(200, 150)[3], 255);
}

#[test]
fn test_safe_area_never_exported() {
    let mut doc = Document::new();
    doc.settings.safe_area.enabled = true;
    let mut surface = surface();
    let output = surface.export(&doc, ExportFormat::Png).unwrap();
    let img = decode(&output.bytes);
    let guide = doc.settings.safe_area.rect();
    let x = guide.x0.round() as u32;
    let y = guide.center().y.round() as u32;
    assert_eq!(img.get_pixel(x, y).0, [17, 17, 17, 255]);
}

#[test]
fn test_missing_image_exports_placeholder() {
    let mut doc = Document::new();
    doc.insert(Object::Image(
        ImageObject::new(Point::new(0.0, 0.0), "https://cdn.example/gone.png", 400.0, 300.0, 1),
    ));
    let mut assets = AssetLoader::offline();
    let output = export(&doc, &mut assets, ExportFormat::Png, &config()).unwrap();
    let img = decode(&output.bytes);
    assert_eq!((output.width, output.height), (1280, 720));
    // Placeholder fill differs from the document background.
    assert_ne!(img.get_pixel(100, 50).0, [17, 17, 17, 255]);
}

#[test]
fn test_loaded_image_is_drawn_after_cors_retry() {
    let url = "https://cdn.example/blue.png";
    let mut source = MemoryAssetSource::new();
    source.insert(url, png_bytes(16, 16, [0, 0, 255, 255]));
    source.block_cors(url);

    let mut doc = Document::new();
    doc.insert(Object::Image(
        ImageObject::new(Point::new(0.0, 0.0), url, 16.0, 16.0, 1).with_size(320.0, 320.0),
    ));
    let mut assets = AssetLoader::new(source);
    let output = export(&doc, &mut assets, ExportFormat::Png, &config()).unwrap();
    let p = decode(&output.bytes).get_pixel(160, 160).0;
    assert!(p[2] > 240 && p[0] < 15, "unexpected pixel {p:?}");
    // Outside the image the background shows.
    assert_eq!(decode(&output.bytes).get_pixel(400, 400).0, [17, 17, 17, 255]);
}
