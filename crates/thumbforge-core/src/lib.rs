//! Thumbforge Core Library
//!
//! Platform-agnostic document model, history, geometry and viewport logic for
//! the Thumbforge thumbnail editor. Rendering lives in `thumbforge-render`.

pub mod document;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod history;
pub mod migrate;
pub mod objects;
pub mod snap;
pub mod storage;
pub mod viewport;

pub use document::{CANVAS_HEIGHT, CANVAS_WIDTH, Document, SafeArea, Settings, canvas_size};
pub use editor::Editor;
pub use error::{ModelError, ModelResult};
pub use history::{History, Snapshot};
pub use migrate::{load_document, load_document_str, to_storage_value};
pub use objects::{
    ArrowObject, ArrowStyle, ImageObject, Object, ObjectId, ObjectKind, Rgba, Shadow, ShapeKind,
    ShapeObject, TextObject,
};
pub use snap::{CENTER_SNAP_THRESHOLD, SnapResult};
pub use storage::{AutoSaver, MemoryStorage, SaveOutcome, Storage, StorageError, StorageResult};
pub use viewport::{Viewport, ViewportConfig, ViewportState, ZOOM_STEP};

#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileStorage;
