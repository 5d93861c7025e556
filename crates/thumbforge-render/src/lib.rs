//! Thumbforge Render Library
//!
//! Turns documents into pixels: SVG scene building, resvg rasterization,
//! PNG/JPEG encoding, image asset loading and the live render surface.

pub mod assets;
mod error;
pub mod export;
pub mod raster;
pub mod scene;
mod surface;

pub use assets::{
    AssetLoader, AssetSource, AssetState, FetchMode, FileAssetSource, LoadedAsset,
    MemoryAssetSource, OfflineAssetSource,
};
pub use error::{AssetError, RenderError, RenderResult};
pub use export::{DEFAULT_JPEG_QUALITY, ExportConfig, ExportFormat, ExportOutput, export};
pub use raster::{FontConfig, Rasterizer};
pub use scene::{SceneOptions, build_svg};
pub use surface::RenderSurface;
