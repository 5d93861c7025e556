//! Thumbnail document: settings plus the objects placed on the canvas.

use crate::error::{ModelError, ModelResult};
use crate::objects::{Object, ObjectId, Rgba};
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Fixed document width in document units.
pub const CANVAS_WIDTH: f64 = 1280.0;
/// Fixed document height in document units.
pub const CANVAS_HEIGHT: f64 = 720.0;
/// Version written by [`Document::to_json`].
pub const DOCUMENT_VERSION: u32 = 2;

/// Size of the fixed canvas.
pub fn canvas_size() -> Size {
    Size::new(CANVAS_WIDTH, CANVAS_HEIGHT)
}

/// Patch keys that a partial-field update never touches.
const PROTECTED_KEYS: &[&str] = &["id", "type", "zIndex"];
/// Natural image size is captured once at load time.
const IMAGE_PROTECTED_KEYS: &[&str] = &["originalWidth", "originalHeight"];

/// Safe-area guide shown while editing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeArea {
    pub enabled: bool,
    /// Inset from each edge, as a percentage of the canvas dimension.
    pub margin_percent: f64,
}

impl Default for SafeArea {
    fn default() -> Self {
        Self {
            enabled: false,
            margin_percent: 5.0,
        }
    }
}

impl SafeArea {
    /// The guide rectangle in document space.
    pub fn rect(&self) -> Rect {
        let mx = CANVAS_WIDTH * self.margin_percent / 100.0;
        let my = CANVAS_HEIGHT * self.margin_percent / 100.0;
        Rect::new(mx, my, CANVAS_WIDTH - mx, CANVAS_HEIGHT - my)
    }
}

/// Global document settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub background_color: Rgba,
    #[serde(default)]
    pub transparent_background: bool,
    #[serde(default)]
    pub safe_area: SafeArea,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            background_color: Rgba::rgb(17, 17, 17),
            transparent_background: false,
            safe_area: SafeArea::default(),
        }
    }
}

/// The persisted editor state.
///
/// Objects are kept in insertion order; paint order comes from `zIndex`
/// with insertion order breaking ties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub version: u32,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub objects: Vec<Object>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self {
            version: DOCUMENT_VERSION,
            settings: Settings::default(),
            objects: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.objects.iter().position(|o| o.id() == id)
    }

    /// Get an object by ID.
    pub fn get(&self, id: &str) -> Option<&Object> {
        self.objects.iter().find(|o| o.id() == id)
    }

    /// Get a mutable reference to an object by ID.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Object> {
        self.objects.iter_mut().find(|o| o.id() == id)
    }

    /// The `zIndex` a newly created object receives.
    pub fn next_z_index(&self) -> i64 {
        self.objects
            .iter()
            .map(Object::z_index)
            .max()
            .map_or(1, |max| max + 1)
    }

    /// Add an object.
    pub fn insert(&mut self, object: Object) {
        self.objects.push(object);
    }

    /// Remove an object, returning it if it existed.
    pub fn remove(&mut self, id: &str) -> Option<Object> {
        let idx = self.index_of(id)?;
        Some(self.objects.remove(idx))
    }

    /// Objects in paint order (back to front).
    pub fn ordered(&self) -> Vec<&Object> {
        let mut ordered: Vec<&Object> = self.objects.iter().collect();
        // Stable sort keeps insertion order for equal zIndex values.
        ordered.sort_by_key(|o| o.z_index());
        ordered
    }

    /// Return a copy with the object's fields shallow-merged from `patch`.
    ///
    /// Keys use the persisted camelCase names. `id`, `type` and `zIndex` are
    /// never patched, nor an image's natural size. An unknown `id` yields an
    /// unchanged copy.
    pub fn apply(&self, id: &str, patch: &Map<String, Value>) -> ModelResult<Document> {
        let Some(idx) = self.index_of(id) else {
            log::debug!("Ignoring patch for unknown object {}", id);
            return Ok(self.clone());
        };

        let target = &self.objects[idx];
        let is_image = matches!(target, Object::Image(_));
        let mut value = serde_json::to_value(target)?;
        let Value::Object(fields) = &mut value else {
            return Err(ModelError::InvalidPatch {
                id: id.to_string(),
                reason: "object did not serialize to a map".to_string(),
            });
        };

        for (key, v) in patch {
            let protected = PROTECTED_KEYS.contains(&key.as_str())
                || (is_image && IMAGE_PROTECTED_KEYS.contains(&key.as_str()));
            if protected {
                log::debug!("Skipping protected key {} in patch for {}", key, id);
                continue;
            }
            fields.insert(key.clone(), v.clone());
        }

        let patched: Object = serde_json::from_value(value).map_err(|e| ModelError::InvalidPatch {
            id: id.to_string(),
            reason: e.to_string(),
        })?;
        patched.validate().map_err(|e| ModelError::InvalidPatch {
            id: id.to_string(),
            reason: e.to_string(),
        })?;

        let mut doc = self.clone();
        doc.objects[idx] = patched;
        Ok(doc)
    }

    /// Return a copy with `f` applied to the object. Unknown ids are a no-op.
    pub fn update(&self, id: &str, f: impl FnOnce(&mut Object)) -> Document {
        let mut doc = self.clone();
        match doc.get_mut(id) {
            Some(object) => f(object),
            None => log::debug!("Ignoring update for unknown object {}", id),
        }
        doc
    }

    /// Exchange the `zIndex` values of two objects.
    /// Returns false if either object is missing.
    pub fn swap_z(&mut self, a: &str, b: &str) -> bool {
        let (Some(ia), Some(ib)) = (self.index_of(a), self.index_of(b)) else {
            return false;
        };
        if ia == ib {
            return false;
        }
        let za = self.objects[ia].z_index();
        let zb = self.objects[ib].z_index();
        if za == zb {
            // Equal values: paint order comes from insertion order.
            self.objects.swap(ia, ib);
        } else {
            self.objects[ia].base_mut().z_index = zb;
            self.objects[ib].base_mut().z_index = za;
        }
        true
    }

    fn neighbor_in_paint_order(&self, id: &str, forward: bool) -> Option<ObjectId> {
        let ordered = self.ordered();
        let pos = ordered.iter().position(|o| o.id() == id)?;
        let neighbor = if forward {
            ordered.get(pos + 1)
        } else {
            pos.checked_sub(1).and_then(|p| ordered.get(p))
        };
        neighbor.map(|o| o.id().to_string())
    }

    /// Move an object one layer towards the front.
    /// Returns true if the object was moved, false if already at front.
    pub fn bring_forward(&mut self, id: &str) -> bool {
        match self.neighbor_in_paint_order(id, true) {
            Some(other) => self.swap_z(id, &other),
            None => false,
        }
    }

    /// Move an object one layer towards the back.
    /// Returns true if the object was moved, false if already at back.
    pub fn send_backward(&mut self, id: &str) -> bool {
        match self.neighbor_in_paint_order(id, false) {
            Some(other) => self.swap_z(id, &other),
            None => false,
        }
    }

    /// Objects under a document-space point, front to back.
    pub fn objects_at_point(&self, point: Point, tolerance: f64) -> Vec<ObjectId> {
        self.ordered()
            .into_iter()
            .rev()
            .filter(|o| o.hit_test(point, tolerance))
            .map(|o| o.id().to_string())
            .collect()
    }

    /// Get the bounding box of all objects.
    pub fn bounds(&self) -> Option<Rect> {
        self.objects
            .iter()
            .map(Object::bounds)
            .reduce(|a, b| a.union(b))
    }

    /// Check every object's invariants and that ids are unique.
    pub fn validate(&self) -> ModelResult<()> {
        let mut seen = HashSet::new();
        for object in &self.objects {
            object.validate()?;
            if !seen.insert(object.id()) {
                return Err(ModelError::InvalidObject(format!(
                    "duplicate id {}",
                    object.id()
                )));
            }
        }
        Ok(())
    }

    /// Serialize the document to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize a current-version document from JSON.
    ///
    /// See [`crate::migrate::load_document`] for tolerant loading of any version.
    pub fn from_json(json: &str) -> ModelResult<Self> {
        let doc: Document = serde_json::from_str(json)?;
        if doc.version != DOCUMENT_VERSION {
            return Err(ModelError::UnsupportedVersion(doc.version as u64));
        }
        doc.validate()?;
        Ok(doc)
    }
}
