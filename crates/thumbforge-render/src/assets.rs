//! Image asset loading.
//!
//! `data:` URLs are decoded inline. Any other URL goes through an
//! [`AssetSource`], first in CORS mode and, if that fails, once more in plain
//! mode. A URL that fails both ways is remembered as failed and rendered as a
//! placeholder.

use crate::error::AssetError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use kurbo::Size;
use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use thumbforge_core::{Document, Object};

/// How a remote asset is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Cross-origin request; a readable canvas requires it.
    Cors,
    /// Opaque request without CORS headers.
    Plain,
}

/// Fetches raw asset bytes by URL.
pub trait AssetSource {
    fn fetch(&self, url: &str, mode: FetchMode) -> Result<Vec<u8>, AssetError>;
}

impl<T: AssetSource + ?Sized> AssetSource for Arc<T> {
    fn fetch(&self, url: &str, mode: FetchMode) -> Result<Vec<u8>, AssetError> {
        (**self).fetch(url, mode)
    }
}

/// A decoded-enough asset: bytes plus natural dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedAsset {
    pub mime: &'static str,
    pub width: u32,
    pub height: u32,
    /// `data:` URL embedding the original bytes.
    pub data_url: String,
}

impl LoadedAsset {
    /// Sniff the format and read the dimensions of encoded image bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, AssetError> {
        let format = image::guess_format(bytes).map_err(|e| AssetError::Decode(e.to_string()))?;
        let (width, height) = image::ImageReader::with_format(Cursor::new(bytes), format)
            .into_dimensions()
            .map_err(|e| AssetError::Decode(e.to_string()))?;
        let mime = format.to_mime_type();
        Ok(Self {
            mime,
            width,
            height,
            data_url: format!("data:{};base64,{}", mime, STANDARD.encode(bytes)),
        })
    }

    pub fn natural_size(&self) -> Size {
        Size::new(self.width as f64, self.height as f64)
    }
}

/// Cached outcome of loading one URL.
#[derive(Debug, Clone, PartialEq)]
pub enum AssetState {
    Ready(LoadedAsset),
    Failed(AssetError),
}

/// Decode the payload of a `data:` URL.
pub fn decode_data_url(url: &str) -> Result<Vec<u8>, AssetError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| AssetError::DataUrl("missing data: prefix".to_string()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| AssetError::DataUrl("missing payload separator".to_string()))?;
    if meta.ends_with(";base64") {
        STANDARD
            .decode(payload.trim())
            .map_err(|e| AssetError::DataUrl(e.to_string()))
    } else {
        Ok(payload.as_bytes().to_vec())
    }
}

/// Loads and caches image assets by URL.
pub struct AssetLoader {
    source: Box<dyn AssetSource>,
    cache: HashMap<String, AssetState>,
}

impl Default for AssetLoader {
    fn default() -> Self {
        Self::offline()
    }
}

impl AssetLoader {
    pub fn new(source: impl AssetSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            cache: HashMap::new(),
        }
    }

    /// A loader that only resolves `data:` URLs.
    pub fn offline() -> Self {
        Self::new(OfflineAssetSource)
    }

    fn fetch_with_fallback(&self, url: &str) -> Result<Vec<u8>, AssetError> {
        match self.source.fetch(url, FetchMode::Cors) {
            Ok(bytes) => Ok(bytes),
            Err(err) => {
                log::debug!("CORS fetch of {} failed ({}), retrying without CORS", url, err);
                self.source.fetch(url, FetchMode::Plain)
            }
        }
    }

    fn resolve(&self, url: &str) -> AssetState {
        let bytes = if url.starts_with("data:") {
            decode_data_url(url)
        } else {
            self.fetch_with_fallback(url)
        };
        match bytes.and_then(|b| LoadedAsset::decode(&b)) {
            Ok(asset) => AssetState::Ready(asset),
            Err(err) => {
                log::warn!("Image {} unavailable, using placeholder: {}", truncate_url(url), err);
                AssetState::Failed(err)
            }
        }
    }

    /// Load `url` unless it was already attempted.
    pub fn load(&mut self, url: &str) -> &AssetState {
        if !self.cache.contains_key(url) {
            let state = self.resolve(url);
            self.cache.insert(url.to_string(), state);
        }
        &self.cache[url]
    }

    /// Natural pixel size of `url`, loading it if needed.
    pub fn natural_size(&mut self, url: &str) -> Result<Size, AssetError> {
        match self.load(url) {
            AssetState::Ready(asset) => Ok(asset.natural_size()),
            AssetState::Failed(err) => Err(err.clone()),
        }
    }

    /// Load every image the document references. Returns how many are unavailable.
    pub fn preload(&mut self, document: &Document) -> usize {
        let urls: HashSet<&str> = document
            .objects
            .iter()
            .filter_map(|o| match o {
                Object::Image(image) => Some(image.src.as_str()),
                _ => None,
            })
            .collect();
        urls.into_iter()
            .filter(|url| matches!(self.load(url), AssetState::Failed(_)))
            .count()
    }

    /// A ready asset, if `url` loaded successfully.
    pub fn get(&self, url: &str) -> Option<&LoadedAsset> {
        match self.cache.get(url) {
            Some(AssetState::Ready(asset)) => Some(asset),
            _ => None,
        }
    }

    pub fn state(&self, url: &str) -> Option<&AssetState> {
        self.cache.get(url)
    }

    /// Drop a cached outcome so the next load retries.
    pub fn forget(&mut self, url: &str) {
        self.cache.remove(url);
    }
}

fn truncate_url(url: &str) -> &str {
    match url.char_indices().nth(64) {
        Some((idx, _)) => &url[..idx],
        None => url,
    }
}

/// Source with no network access.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineAssetSource;

impl AssetSource for OfflineAssetSource {
    fn fetch(&self, url: &str, _mode: FetchMode) -> Result<Vec<u8>, AssetError> {
        Err(AssetError::Fetch {
            url: url.to_string(),
            reason: "no asset source configured".to_string(),
        })
    }
}

/// Serves assets from a local directory. Accepts `file://` URLs, absolute
/// paths and paths relative to the root.
#[derive(Debug, Clone)]
pub struct FileAssetSource {
    root: PathBuf,
}

impl FileAssetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetSource for FileAssetSource {
    fn fetch(&self, url: &str, _mode: FetchMode) -> Result<Vec<u8>, AssetError> {
        if url.starts_with("http://") || url.starts_with("https://") {
            return Err(AssetError::Fetch {
                url: url.to_string(),
                reason: "remote URLs are not served from disk".to_string(),
            });
        }
        let path = url.strip_prefix("file://").unwrap_or(url);
        let path = self.root.join(path);
        std::fs::read(&path).map_err(|e| AssetError::Fetch {
            url: url.to_string(),
            reason: format!("{}: {}", path.display(), e),
        })
    }
}

/// In-memory source for tests and previews.
///
/// URLs in the CORS-blocked set fail in [`FetchMode::Cors`] and succeed in
/// [`FetchMode::Plain`]. Every request is recorded.
#[derive(Debug, Default)]
pub struct MemoryAssetSource {
    assets: HashMap<String, Vec<u8>>,
    cors_blocked: HashSet<String>,
    requests: Mutex<Vec<(String, FetchMode)>>,
}

impl MemoryAssetSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, url: impl Into<String>, bytes: Vec<u8>) {
        self.assets.insert(url.into(), bytes);
    }

    pub fn block_cors(&mut self, url: impl Into<String>) {
        self.cors_blocked.insert(url.into());
    }

    /// Requests seen so far, in order.
    pub fn requests(&self) -> Vec<(String, FetchMode)> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl AssetSource for MemoryAssetSource {
    fn fetch(&self, url: &str, mode: FetchMode) -> Result<Vec<u8>, AssetError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push((url.to_string(), mode));
        }
        if mode == FetchMode::Cors && self.cors_blocked.contains(url) {
            return Err(AssetError::Fetch {
                url: url.to_string(),
                reason: "blocked by CORS policy".to_string(),
            });
        }
        self.assets.get(url).cloned().ok_or_else(|| AssetError::Fetch {
            url: url.to_string(),
            reason: "404".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([255, 0, 0, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_data_url_natural_size() {
        let url = format!("data:image/png;base64,{}", STANDARD.encode(png_bytes(7, 3)));
        let mut loader = AssetLoader::offline();
        let size = loader.natural_size(&url).unwrap();
        assert_eq!(size, Size::new(7.0, 3.0));
        assert_eq!(loader.get(&url).unwrap().mime, "image/png");
    }

    #[test]
    fn test_malformed_data_url() {
        assert!(matches!(decode_data_url("data:image/png;base64"), Err(AssetError::DataUrl(_))));
        let mut loader = AssetLoader::offline();
        assert!(loader.natural_size("data:image/png;base64,%%%").is_err());
    }

    #[test]
    fn test_cors_failure_retries_plain() {
        let mut source = MemoryAssetSource::new();
        source.insert("https://cdn/a.png", png_bytes(4, 4));
        source.block_cors("https://cdn/a.png");
        let source = Arc::new(source);
        let mut loader = AssetLoader::new(source.clone());

        assert_eq!(loader.natural_size("https://cdn/a.png").unwrap(), Size::new(4.0, 4.0));
        assert_eq!(
            source.requests(),
            vec![
                ("https://cdn/a.png".to_string(), FetchMode::Cors),
                ("https://cdn/a.png".to_string(), FetchMode::Plain),
            ]
        );
    }

    #[test]
    fn test_failure_cached_as_failed() {
        let source = Arc::new(MemoryAssetSource::new());
        let mut loader = AssetLoader::new(source.clone());

        assert!(matches!(loader.load("https://cdn/missing.png"), AssetState::Failed(_)));
        loader.load("https://cdn/missing.png");
        // One CORS attempt and one plain retry, then cached.
        assert_eq!(source.requests().len(), 2);
        assert!(loader.get("https://cdn/missing.png").is_none());

        loader.forget("https://cdn/missing.png");
        loader.load("https://cdn/missing.png");
        assert_eq!(source.requests().len(), 4);
    }

    #[test]
    fn test_undecodable_bytes() {
        let mut source = MemoryAssetSource::new();
        source.insert("https://cdn/bad.png", b"not an image".to_vec());
        let mut loader = AssetLoader::new(source);
        assert!(matches!(
            loader.natural_size("https://cdn/bad.png"),
            Err(AssetError::Decode(_))
        ));
    }

    #[test]
    fn test_file_source() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("logo.png"), png_bytes(2, 5)).unwrap();

        let mut loader = AssetLoader::new(FileAssetSource::new(dir.path()));
        assert_eq!(loader.natural_size("logo.png").unwrap(), Size::new(2.0, 5.0));
        assert!(loader.natural_size("https://example.com/x.png").is_err());
    }
}
