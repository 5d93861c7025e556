//! SVG scene building.
//!
//! A document is rendered to an SVG string in paint order and handed to the
//! rasterizer. Geometry comes from `thumbforge_core::geometry` so on-canvas
//! hit-testing and exported pixels agree.

use crate::assets::AssetLoader;
use kurbo::{Affine, BezPath, Point, Rect};
use std::fmt::Write;
use thumbforge_core::geometry::{
    ArrowBody, arrow_geometry, measure_text, object_transform, text_block_rect,
};
use thumbforge_core::objects::{
    ArrowObject, ImageObject, Object, Rgba, Shadow, ShapeKind, ShapeObject, TextObject,
};
use thumbforge_core::{CANVAS_HEIGHT, CANVAS_WIDTH, Document};

/// Color of the safe-area guide drawn on live frames.
const GUIDE_COLOR: Rgba = Rgba::new(255, 255, 255, 140);
const PLACEHOLDER_FILL: Rgba = Rgba::rgb(42, 42, 42);
const PLACEHOLDER_STROKE: Rgba = Rgba::rgb(110, 110, 110);

/// Output size and view transform for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneOptions {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Document-to-pixel transform.
    pub transform: Affine,
    /// Draw editor-only guides (safe area).
    pub show_guides: bool,
}

impl SceneOptions {
    /// Full canvas at scale 1 without guides.
    pub fn export() -> Self {
        Self {
            width: CANVAS_WIDTH as u32,
            height: CANVAS_HEIGHT as u32,
            transform: Affine::IDENTITY,
            show_guides: false,
        }
    }
}

/// Escape text for XML content and attribute values.
pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn matrix(affine: Affine) -> String {
    let [a, b, c, d, e, f] = affine.as_coeffs();
    format!("matrix({a} {b} {c} {d} {e} {f})")
}

/// `fill="#rrggbb" fill-opacity="a"` style attribute pair.
fn paint(attr: &str, color: Rgba) -> String {
    if color.a == 255 {
        format!("{attr}=\"{}\"", color.to_hex_rgb())
    } else {
        format!(
            "{attr}=\"{}\" {attr}-opacity=\"{}\"",
            color.to_hex_rgb(),
            color.alpha()
        )
    }
}

/// Builds the SVG markup for one frame.
pub struct SceneBuilder<'a> {
    assets: &'a AssetLoader,
    defs: String,
    body: String,
    next_def: usize,
}

impl<'a> SceneBuilder<'a> {
    pub fn new(assets: &'a AssetLoader) -> Self {
        Self {
            assets,
            defs: String::new(),
            body: String::new(),
            next_def: 0,
        }
    }

    fn def_id(&mut self, prefix: &str) -> String {
        self.next_def += 1;
        format!("{prefix}{}", self.next_def)
    }

    /// Render `document` into a complete SVG string.
    pub fn build(mut self, document: &Document, options: &SceneOptions) -> String {
        let settings = &document.settings;
        if !settings.transparent_background {
            let _ = write!(
                self.body,
                "<rect x=\"0\" y=\"0\" width=\"{CANVAS_WIDTH}\" height=\"{CANVAS_HEIGHT}\" {}/>",
                paint("fill", settings.background_color)
            );
        }

        for object in document.ordered() {
            self.render_object(object);
        }

        if options.show_guides && settings.safe_area.enabled {
            self.render_safe_area(settings.safe_area.rect());
        }

        let (w, h) = (options.width, options.height);
        let mut svg = String::with_capacity(self.body.len() + self.defs.len() + 256);
        let _ = write!(
            svg,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" \
             width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">"
        );
        if !self.defs.is_empty() {
            let _ = write!(svg, "<defs>{}</defs>", self.defs);
        }
        let _ = write!(
            svg,
            "<g transform=\"{}\">{}</g></svg>",
            matrix(options.transform),
            self.body
        );
        svg
    }

    /// Register a drop-shadow filter and return its `filter` attribute.
    fn shadow_filter(&mut self, shadow: &Shadow) -> String {
        if !shadow.enabled {
            return String::new();
        }
        let id = self.def_id("shadow");
        let _ = write!(
            self.defs,
            "<filter id=\"{id}\" x=\"-50%\" y=\"-50%\" width=\"200%\" height=\"200%\">\
             <feDropShadow dx=\"{}\" dy=\"{}\" stdDeviation=\"{}\" flood-color=\"{}\" flood-opacity=\"{}\"/>\
             </filter>",
            shadow.offset_x,
            shadow.offset_y,
            shadow.blur / 2.0,
            shadow.color.to_hex_rgb(),
            shadow.color.alpha()
        );
        format!(" filter=\"url(#{id})\"")
    }

    fn render_object(&mut self, object: &Object) {
        let base = object.base();
        let shadow = match object {
            Object::Text(t) => Some(&t.shadow),
            Object::Arrow(a) => Some(&a.shadow),
            Object::Shape(s) => Some(&s.shadow),
            Object::Image(_) => None,
        };
        let filter = shadow.map(|s| self.shadow_filter(s)).unwrap_or_default();
        let _ = write!(
            self.body,
            "<g transform=\"{}\" opacity=\"{}\"{filter}>",
            matrix(object_transform(object)),
            base.opacity
        );
        match object {
            Object::Text(text) => self.render_text(text),
            Object::Arrow(arrow) => self.render_arrow(arrow),
            Object::Image(image) => self.render_image(image),
            Object::Shape(shape) => self.render_shape(shape),
        }
        self.body.push_str("</g>");
    }

    fn render_shape(&mut self, shape: &ShapeObject) {
        let fill = if shape.fill.enabled {
            paint("fill", shape.fill.color)
        } else {
            "fill=\"none\"".to_string()
        };
        let stroke = if shape.stroke.is_visible() {
            format!(
                " {} stroke-width=\"{}\" stroke-linejoin=\"round\"",
                paint("stroke", shape.stroke.color),
                shape.stroke.width
            )
        } else {
            String::new()
        };
        let r = shape.as_rect();
        match shape.shape_type {
            ShapeKind::Rectangle => {
                let radius = shape.effective_corner_radius();
                let _ = write!(
                    self.body,
                    "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"{radius}\" ry=\"{radius}\" {fill}{stroke}/>",
                    r.x0,
                    r.y0,
                    r.width(),
                    r.height()
                );
            }
            ShapeKind::Ellipse => {
                let c = r.center();
                let _ = write!(
                    self.body,
                    "<ellipse cx=\"{}\" cy=\"{}\" rx=\"{}\" ry=\"{}\" {fill}{stroke}/>",
                    c.x,
                    c.y,
                    r.width() / 2.0,
                    r.height() / 2.0
                );
            }
            ShapeKind::Triangle => {
                let _ = write!(
                    self.body,
                    "<polygon points=\"{},{} {},{} {},{}\" {fill}{stroke}/>",
                    r.center().x,
                    r.y0,
                    r.x1,
                    r.y1,
                    r.x0,
                    r.y1
                );
            }
        }
    }

    fn render_arrow(&mut self, arrow: &ArrowObject) {
        let geometry = arrow_geometry(arrow);
        let heads: Vec<BezPath> = [geometry.start_head, geometry.end_head]
            .into_iter()
            .flatten()
            .map(|h| h.to_path())
            .collect();
        let dash = arrow
            .dash
            .as_ref()
            .map(|d| format!(" stroke-dasharray=\"{} {}\"", d.length, d.gap))
            .unwrap_or_default();

        // Outline pass sits underneath the main pass.
        if let Some(outline) = &arrow.outline {
            let extra = outline.width * 2.0;
            let stroke = paint("stroke", outline.color);
            match &geometry.body {
                ArrowBody::Stroke(path) => self.stroke_path(path, &stroke, arrow.thickness + extra, ""),
                ArrowBody::Tapered(path) => {
                    let _ = write!(
                        self.body,
                        "<path d=\"{}\" {} {stroke} stroke-width=\"{extra}\" stroke-linejoin=\"round\"/>",
                        path.to_svg(),
                        paint("fill", outline.color)
                    );
                }
            }
            for head in &heads {
                let _ = write!(
                    self.body,
                    "<path d=\"{}\" {} {stroke} stroke-width=\"{extra}\" stroke-linejoin=\"round\"/>",
                    head.to_svg(),
                    paint("fill", outline.color)
                );
            }
        }

        match &geometry.body {
            ArrowBody::Stroke(path) => {
                let stroke = paint("stroke", arrow.color);
                self.stroke_path(path, &stroke, arrow.thickness, &dash);
            }
            ArrowBody::Tapered(path) => {
                let _ = write!(
                    self.body,
                    "<path d=\"{}\" {}/>",
                    path.to_svg(),
                    paint("fill", arrow.color)
                );
            }
        }
        for head in &heads {
            let _ = write!(
                self.body,
                "<path d=\"{}\" {} stroke-linejoin=\"round\"/>",
                head.to_svg(),
                paint("fill", arrow.color)
            );
        }
    }

    fn stroke_path(&mut self, path: &BezPath, stroke: &str, width: f64, dash: &str) {
        if path.elements().len() < 2 {
            return;
        }
        let _ = write!(
            self.body,
            "<path d=\"{}\" fill=\"none\" {stroke} stroke-width=\"{width}\" \
             stroke-linecap=\"round\" stroke-linejoin=\"round\"{dash}/>",
            path.to_svg()
        );
    }

    fn render_image(&mut self, image: &ImageObject) {
        let Some(asset) = self.assets.get(&image.src) else {
            self.render_image_placeholder(image);
            return;
        };
        let dest = image.as_rect();
        let (cx, cy, cw, ch) = match image.effective_crop() {
            Some(crop) => (crop.x, crop.y, crop.width, crop.height),
            None => (0.0, 0.0, image.original_width, image.original_height),
        };
        let sx = dest.width() / cw;
        let sy = dest.height() / ch;
        let placement = Affine::new([sx, 0.0, 0.0, sy, dest.x0 - cx * sx, dest.y0 - cy * sy]);

        let clip = self.def_id("clip");
        let _ = write!(
            self.defs,
            "<clipPath id=\"{clip}\"><rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\"/></clipPath>",
            dest.x0,
            dest.y0,
            dest.width(),
            dest.height()
        );
        // Sized to the natural pixel box so crop coordinates apply directly.
        let _ = write!(
            self.body,
            "<g clip-path=\"url(#{clip})\"><image transform=\"{}\" x=\"0\" y=\"0\" width=\"{}\" height=\"{}\" \
             preserveAspectRatio=\"none\" xlink:href=\"{}\"/></g>",
            matrix(placement),
            image.original_width,
            image.original_height,
            asset.data_url
        );
    }

    /// Render a placeholder for images that couldn't be loaded.
    fn render_image_placeholder(&mut self, image: &ImageObject) {
        let r = image.as_rect();
        let _ = write!(
            self.body,
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" {} {} stroke-width=\"2\"/>\
             <path d=\"M{},{} L{},{} M{},{} L{},{}\" {} stroke-width=\"2\"/>",
            r.x0,
            r.y0,
            r.width(),
            r.height(),
            paint("fill", PLACEHOLDER_FILL),
            paint("stroke", PLACEHOLDER_STROKE),
            r.x0,
            r.y0,
            r.x1,
            r.y1,
            r.x1,
            r.y0,
            r.x0,
            r.y1,
            paint("stroke", PLACEHOLDER_STROKE)
        );
    }

    fn render_text(&mut self, text: &TextObject) {
        let metrics = measure_text(text);
        let block = text_block_rect(text);

        if text.background.enabled {
            let pill = block.inflate(text.background.padding, text.background.padding);
            let radius = text
                .background
                .corner_radius
                .min(pill.width() / 2.0)
                .min(pill.height() / 2.0)
                .max(0.0);
            let _ = write!(
                self.body,
                "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"{radius}\" ry=\"{radius}\" {}/>",
                pill.x0,
                pill.y0,
                pill.width(),
                pill.height(),
                paint("fill", text.background.color)
            );
        }

        let anchor_x = match text.align.anchor() {
            "middle" => block.center().x,
            "end" => block.x1,
            _ => block.x0,
        };
        let stroke = if text.stroke.is_enabled() {
            format!(
                " {} stroke-width=\"{}\" stroke-linejoin=\"round\" paint-order=\"stroke\"",
                paint("stroke", text.stroke.color),
                text.stroke.width
            )
        } else {
            String::new()
        };
        let _ = write!(
            self.body,
            "<text font-family=\"{}, sans-serif\" font-size=\"{}\" font-weight=\"{}\" \
             letter-spacing=\"{}\" text-anchor=\"{}\" {}{stroke} xml:space=\"preserve\">",
            escape_xml(&text.font_family),
            text.font_size,
            text.font_weight,
            text.letter_spacing,
            text.align.anchor(),
            paint("fill", text.fill)
        );
        // Baseline sits ~80% down the em box, centered in the line advance.
        let leading = (metrics.line_advance - text.font_size) / 2.0;
        for (i, line) in text.lines().enumerate() {
            let baseline = block.y0 + metrics.line_advance * i as f64 + leading + text.font_size * 0.8;
            let _ = write!(
                self.body,
                "<tspan x=\"{anchor_x}\" y=\"{baseline}\">{}</tspan>",
                escape_xml(line)
            );
        }
        self.body.push_str("</text>");
    }

    fn render_safe_area(&mut self, rect: Rect) {
        let _ = write!(
            self.body,
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"none\" {} stroke-width=\"2\" stroke-dasharray=\"12 8\"/>",
            rect.x0,
            rect.y0,
            rect.width(),
            rect.height(),
            paint("stroke", GUIDE_COLOR)
        );
        let center = Point::new(CANVAS_WIDTH / 2.0, CANVAS_HEIGHT / 2.0);
        let _ = write!(
            self.body,
            "<path d=\"M{},{} L{},{} M{},{} L{},{}\" fill=\"none\" {} stroke-width=\"1\"/>",
            center.x - 12.0,
            center.y,
            center.x + 12.0,
            center.y,
            center.x,
            center.y - 12.0,
            center.x,
            center.y + 12.0,
            paint("stroke", GUIDE_COLOR)
        );
    }
}

/// Render `document` to SVG markup.
pub fn build_svg(document: &Document, assets: &AssetLoader, options: &SceneOptions) -> String {
    SceneBuilder::new(assets).build(document, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use thumbforge_core::objects::{ArrowStyle, Outline};

    fn doc_with(objects: Vec<Object>) -> Document {
        let mut doc = Document::new();
        for object in objects {
            doc.insert(object);
        }
        doc
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("<b>&\"'"), "&lt;b&gt;&amp;&quot;&apos;");
    }

    #[test]
    fn test_background_omitted_when_transparent() {
        let assets = AssetLoader::offline();
        let mut doc = Document::new();
        let svg = build_svg(&doc, &assets, &SceneOptions::export());
        assert!(svg.contains("width=\"1280\" height=\"720\""));
        assert!(svg.contains("fill=\"#111111\""));

        doc.settings.transparent_background = true;
        let svg = build_svg(&doc, &assets, &SceneOptions::export());
        assert!(!svg.contains("fill=\"#111111\""));
    }

    #[test]
    fn test_paint_order_follows_z_index() {
        let assets = AssetLoader::offline();
        let back = ShapeObject::new(ShapeKind::Ellipse, Point::ZERO, 10.0, 10.0, 5);
        let front = ShapeObject::new(ShapeKind::Triangle, Point::ZERO, 10.0, 10.0, 9);
        let doc = doc_with(vec![Object::Shape(front), Object::Shape(back)]);
        let svg = build_svg(&doc, &assets, &SceneOptions::export());
        let ellipse = svg.find("<ellipse").unwrap();
        let polygon = svg.find("<polygon").unwrap();
        assert!(ellipse < polygon);
    }

    #[test]
    fn test_text_is_escaped_and_split() {
        let assets = AssetLoader::offline();
        let text = TextObject::new(Point::ZERO, "A < B\nline two", 1);
        let svg = build_svg(&doc_with(vec![Object::Text(text)]), &assets, &SceneOptions::export());
        assert!(svg.contains(">A &lt; B</tspan>"));
        assert!(svg.contains(">line two</tspan>"));
    }

    #[test]
    fn test_missing_image_renders_placeholder() {
        let assets = AssetLoader::offline();
        let image = ImageObject::new(Point::ZERO, "https://cdn/missing.png", 100.0, 50.0, 1);
        let svg = build_svg(&doc_with(vec![Object::Image(image)]), &assets, &SceneOptions::export());
        assert!(!svg.contains("<image"));
        assert!(svg.contains(&PLACEHOLDER_STROKE.to_hex_rgb()));
    }

    #[test]
    fn test_outlined_arrow_draws_outline_first() {
        let assets = AssetLoader::offline();
        let mut arrow =
            ArrowObject::with_style(Point::ZERO, vec![0.0, 0.0, 200.0, 0.0], ArrowStyle::Outlined, 1);
        arrow.outline = Some(Outline {
            color: Rgba::rgb(1, 2, 3),
            width: 4.0,
        });
        let svg = build_svg(&doc_with(vec![Object::Arrow(arrow)]), &assets, &SceneOptions::export());
        let outline = svg.find("stroke=\"#010203\"").unwrap();
        let main = svg.find("stroke=\"#ef4444\"").unwrap();
        assert!(outline < main);
    }

    #[test]
    fn test_shadow_registers_filter() {
        let assets = AssetLoader::offline();
        let mut shape = ShapeObject::new(ShapeKind::Rectangle, Point::ZERO, 10.0, 10.0, 1);
        shape.shadow.enabled = true;
        let svg = build_svg(&doc_with(vec![Object::Shape(shape)]), &assets, &SceneOptions::export());
        assert!(svg.contains("<feDropShadow"));
        assert!(svg.contains("filter=\"url(#shadow1)\""));
    }

    #[test]
    fn test_guides_only_when_requested() {
        let assets = AssetLoader::offline();
        let mut doc = Document::new();
        doc.settings.safe_area.enabled = true;
        let export = build_svg(&doc, &assets, &SceneOptions::export());
        assert!(!export.contains("stroke-dasharray=\"12 8\""));
        let live = SceneOptions {
            show_guides: true,
            ..SceneOptions::export()
        };
        assert!(build_svg(&doc, &assets, &live).contains("stroke-dasharray=\"12 8\""));
    }
}
