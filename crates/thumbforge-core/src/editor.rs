//! Editor facade: the document history, the viewport and the selection.
//!
//! Every mutation builds a new document and commits it to history, so each
//! call is one undo step.

use crate::document::{Document, Settings, canvas_size};
use crate::error::{ModelError, ModelResult};
use crate::geometry::{centered_origin, fit_contain, measure_text};
use crate::history::History;
use crate::migrate::{load_document, load_document_str, to_storage_value};
use crate::objects::{
    ArrowObject, ArrowStyle, ImageObject, Object, ObjectId, ShapeKind, ShapeObject, TextObject,
};
use crate::snap::{CENTER_SNAP_THRESHOLD, SnapResult, snap_box_to_canvas_center};
use crate::viewport::Viewport;
use kurbo::{Point, Rect, Size, Vec2};
use serde_json::{Map, Value};

/// Offset applied to duplicated objects.
pub const DUPLICATE_OFFSET: f64 = 20.0;

/// Document-space hit tolerance for selection, before handle scaling.
const HIT_TOLERANCE: f64 = 4.0;

/// Runtime editor state (not persisted).
#[derive(Debug, Clone, Default)]
pub struct Editor {
    history: History,
    /// View onto the document.
    pub viewport: Viewport,
    selection: Option<ObjectId>,
}

impl Editor {
    /// Create an editor with an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an editor with an existing document.
    pub fn with_document(document: Document) -> Self {
        Self {
            history: History::new(document),
            ..Self::default()
        }
    }

    /// The current document.
    pub fn document(&self) -> &Document {
        self.history.present()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    fn commit(&mut self, document: Document, description: &str) -> bool {
        let changed = self.history.commit(document, Some(description));
        if changed {
            self.prune_selection();
        }
        changed
    }

    fn prune_selection(&mut self) {
        if let Some(id) = &self.selection {
            if self.history.present().get(id).is_none() {
                self.selection = None;
            }
        }
    }

    fn add_object(&mut self, object: Object, description: &str) -> ObjectId {
        let id = object.id().to_string();
        let mut doc = self.document().clone();
        doc.insert(object);
        self.commit(doc, description);
        self.selection = Some(id.clone());
        id
    }

    /// Add a text object. Without a position it is centered on the canvas.
    pub fn add_text(&mut self, text: &str, position: Option<Point>) -> ObjectId {
        let z = self.document().next_z_index();
        let mut object = TextObject::new(Point::ZERO, text, z);
        let position = position.unwrap_or_else(|| {
            let metrics = measure_text(&object);
            centered_origin(Size::new(metrics.width, metrics.height), canvas_size())
        });
        object.base.x = position.x;
        object.base.y = position.y;
        self.add_object(Object::Text(object), "Add text")
    }

    /// Add an arrow with the given style preset.
    pub fn add_arrow(
        &mut self,
        position: Point,
        points: Vec<f64>,
        style: ArrowStyle,
    ) -> ModelResult<ObjectId> {
        let z = self.document().next_z_index();
        let object = Object::Arrow(ArrowObject::with_style(position, points, style, z));
        object.validate()?;
        Ok(self.add_object(object, "Add arrow"))
    }

    /// Add a shape filling `rect`.
    pub fn add_shape(&mut self, kind: ShapeKind, rect: Rect) -> ObjectId {
        let z = self.document().next_z_index();
        let rect = rect.abs();
        let shape = ShapeObject::new(kind, rect.origin(), rect.width(), rect.height(), z);
        self.add_object(Object::Shape(shape), "Add shape")
    }

    /// Add an image of known natural size, fitted inside the canvas and centered.
    pub fn add_image(&mut self, src: &str, natural: Size) -> ModelResult<ObjectId> {
        if !natural.is_finite() || natural.width <= 0.0 || natural.height <= 0.0 {
            return Err(ModelError::InvalidObject(format!(
                "image {} has no natural size",
                src
            )));
        }
        let fitted = fit_contain(natural, canvas_size());
        let origin = centered_origin(fitted, canvas_size());
        let z = self.document().next_z_index();
        let image = ImageObject::new(origin, src, natural.width, natural.height, z)
            .with_size(fitted.width, fitted.height);
        Ok(self.add_object(Object::Image(image), "Add image"))
    }

    /// Shallow-merge `patch` into an object. Returns whether anything changed.
    pub fn apply(&mut self, id: &str, patch: &Map<String, Value>) -> ModelResult<bool> {
        let doc = self.document().apply(id, patch)?;
        Ok(self.commit(doc, "Edit properties"))
    }

    /// Edit an object in place. Returns whether anything changed.
    pub fn update(&mut self, id: &str, description: &str, f: impl FnOnce(&mut Object)) -> bool {
        let doc = self.document().update(id, f);
        self.commit(doc, description)
    }

    /// Edit the document settings.
    pub fn update_settings(&mut self, f: impl FnOnce(&mut Settings)) -> bool {
        let mut doc = self.document().clone();
        f(&mut doc.settings);
        self.commit(doc, "Edit settings")
    }

    /// Move an object's position, optionally snapping its center to the canvas center.
    ///
    /// Locked and unknown objects are left alone and yield `None`.
    pub fn move_object(&mut self, id: &str, position: Point, snap: bool) -> Option<SnapResult> {
        let object = self.document().get(id)?;
        if object.is_locked() {
            log::debug!("Object {} is locked, not moving", id);
            return None;
        }

        let mut moved = object.clone();
        moved.base_mut().x = position.x;
        moved.base_mut().y = position.y;

        let mut result = SnapResult::none(position);
        if snap {
            let (snapped, delta) = snap_box_to_canvas_center(moved.bounds(), CENTER_SNAP_THRESHOLD);
            let target = position + delta;
            moved.base_mut().x = target.x;
            moved.base_mut().y = target.y;
            result = SnapResult {
                point: target,
                ..snapped
            };
        }

        let doc = self.document().update(id, |o| *o = moved);
        self.commit(doc, "Move");
        Some(result)
    }

    /// Move an object by a delta.
    pub fn nudge(&mut self, id: &str, delta: Vec2) -> bool {
        let Some(position) = self.document().get(id).map(Object::position) else {
            return false;
        };
        self.move_object(id, position + delta, false).is_some()
    }

    /// Resize an image to `width`, keeping its aspect ratio.
    pub fn resize_image(&mut self, id: &str, width: f64) -> bool {
        let doc = self.document().update(id, |o| {
            if let Object::Image(image) = o {
                if !image.base.locked {
                    image.resize_proportional(width);
                }
            }
        });
        self.commit(doc, "Resize image")
    }

    /// Remove an object.
    pub fn delete(&mut self, id: &str) -> bool {
        let mut doc = self.document().clone();
        if doc.remove(id).is_none() {
            return false;
        }
        self.commit(doc, "Delete")
    }

    /// Copy an object on top of the stack, offset from the original.
    pub fn duplicate(&mut self, id: &str) -> Option<ObjectId> {
        let mut copy = self.document().get(id)?.clone();
        copy.regenerate_id();
        let z = self.document().next_z_index();
        let base = copy.base_mut();
        base.x += DUPLICATE_OFFSET;
        base.y += DUPLICATE_OFFSET;
        base.z_index = z;
        base.locked = false;
        Some(self.add_object(copy, "Duplicate"))
    }

    /// Move an object one layer towards the front.
    pub fn bring_forward(&mut self, id: &str) -> bool {
        let mut doc = self.document().clone();
        doc.bring_forward(id) && self.commit(doc, "Bring forward")
    }

    /// Move an object one layer towards the back.
    pub fn send_backward(&mut self, id: &str) -> bool {
        let mut doc = self.document().clone();
        doc.send_backward(id) && self.commit(doc, "Send backward")
    }

    pub fn undo(&mut self) -> bool {
        let done = self.history.undo();
        self.prune_selection();
        done
    }

    pub fn redo(&mut self) -> bool {
        let done = self.history.redo();
        self.prune_selection();
        done
    }

    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    /// Select an object. Unknown ids clear the selection.
    pub fn select(&mut self, id: &str) {
        self.selection = self.document().get(id).map(|o| o.id().to_string());
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Select the topmost object under a screen point.
    pub fn select_at(&mut self, screen_point: Point) -> Option<&str> {
        let point = self.viewport.screen_to_document(screen_point);
        let tolerance = HIT_TOLERANCE * self.viewport.handle_scale();
        self.selection = self
            .document()
            .objects_at_point(point, tolerance)
            .into_iter()
            .next();
        self.selection.as_deref()
    }

    /// Replace the document with a stored value of any version; history restarts.
    pub fn load_value(&mut self, value: Value) {
        self.history.reset(load_document(value));
        self.selection = None;
    }

    /// Replace the document with stored JSON of any version; history restarts.
    pub fn load_json(&mut self, json: &str) {
        self.history.reset(load_document_str(json));
        self.selection = None;
    }

    /// The value to hand to storage.
    pub fn to_storage_json(&self) -> ModelResult<Value> {
        to_storage_value(self.document())
    }
}
