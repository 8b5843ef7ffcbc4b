//! Asset Collaborators - Reference Resolution and OCR
//!
//! The core never interprets a reference's scheme itself; it asks an
//! [`AssetResolver`] for bytes and treats "not found" as absent input.

use base64::Engine;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Resolves an image reference (path, URL, data URI) to raw bytes.
pub trait AssetResolver: Send + Sync {
    fn resolve(&self, reference: &str) -> Option<Vec<u8>>;
}

/// Extracts lowercased text from image bytes. Empty means "no text or unavailable".
pub trait TextRecognizer: Send + Sync {
    fn extract_text(&self, image: &[u8]) -> String;
}

/// Recognizer used when no OCR backend is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOcr;

impl TextRecognizer for NoOcr {
    fn extract_text(&self, _image: &[u8]) -> String {
        String::new()
    }
}

/// Filesystem resolver with `data:` URI support.
///
/// Relative paths resolve against `root` when one is set. Static URLs of the
/// form `/static/assets/<name>` resolve to `<root>/<name>`.
#[derive(Debug, Default, Clone)]
pub struct FsAssetResolver {
    root: Option<PathBuf>,
}

const STATIC_ASSETS_PREFIX: &str = "/static/assets/";

impl FsAssetResolver {
    pub fn new() -> Self {
        Self { root: None }
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: Some(root.into()) }
    }

    fn candidate_paths(&self, reference: &str) -> Vec<PathBuf> {
        let mut paths = vec![];
        if let Some(root) = &self.root {
            if let Some(name) = reference.strip_prefix(STATIC_ASSETS_PREFIX) {
                paths.push(root.join(name));
            }
            let path = Path::new(reference);
            if path.is_relative() {
                paths.push(root.join(path));
            }
        }
        paths.push(PathBuf::from(reference));
        paths
    }
}

impl AssetResolver for FsAssetResolver {
    fn resolve(&self, reference: &str) -> Option<Vec<u8>> {
        if reference.starts_with("data:") {
            return decode_data_uri(reference);
        }
        self.candidate_paths(reference)
            .into_iter()
            .find(|p| p.is_file())
            .and_then(|p| match fs::read(&p) {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    tracing::debug!(path = %p.display(), error = %e, "asset unreadable");
                    None
                }
            })
    }
}

/// Decode a base64 `data:` URI. Non-base64 payloads are not supported.
pub fn decode_data_uri(uri: &str) -> Option<Vec<u8>> {
    let rest = uri.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    if !meta.ends_with(";base64") {
        return None;
    }
    base64::engine::general_purpose::STANDARD.decode(payload.trim()).ok()
}

/// In-memory resolver keyed by exact reference string.
#[derive(Debug, Default, Clone)]
pub struct MemoryAssets {
    assets: HashMap<String, Vec<u8>>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, reference: impl Into<String>, bytes: Vec<u8>) {
        self.assets.insert(reference.into(), bytes);
    }

    pub fn with(mut self, reference: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(reference, bytes);
        self
    }
}

impl AssetResolver for MemoryAssets {
    fn resolve(&self, reference: &str) -> Option<Vec<u8>> {
        self.assets.get(reference).cloned()
    }
}
