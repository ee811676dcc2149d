//! Shared stores handed to the pipeline at construction.
//!
//! Both stores are append-only for the duration of a build and cheap to
//! clone; every clone observes the same contents.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// In-memory generated modules, keyed by content hash.
///
/// The stylesheet pipeline writes extracted CSS here; redirection only
/// reads it back when it meets a `?css_virtual&hash=<key>` specifier.
#[derive(Debug, Clone, Default)]
pub struct VirtualModuleStore {
    inner: Arc<RwLock<FxHashMap<String, String>>>,
}

impl VirtualModuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register generated content. An existing key keeps its first value.
    pub fn insert(&self, key: impl Into<String>, contents: impl Into<String>) {
        self.inner
            .write()
            .entry(key.into())
            .or_insert_with(|| contents.into());
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.read().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

/// A file produced as a side effect of redirection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedAsset {
    /// Absolute output path
    pub file_name: PathBuf,

    /// Specifier or source path that caused the emission
    pub original_file_name: String,

    pub contents: Vec<u8>,
}

/// Registry of extra build outputs.
///
/// Emission is idempotent per output file name: the first registration
/// wins and later ones are ignored.
#[derive(Debug, Clone, Default)]
pub struct OutputRegistry {
    inner: Arc<RwLock<FxHashMap<PathBuf, EmittedAsset>>>,
}

impl OutputRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an output.
    ///
    /// Returns `true` if the file name was new.
    pub fn emit(&self, asset: EmittedAsset) -> bool {
        let mut inner = self.inner.write();
        if inner.contains_key(&asset.file_name) {
            tracing::trace!(file = %asset.file_name.display(), "Output already emitted");
            return false;
        }
        tracing::debug!(
            file = %asset.file_name.display(),
            from = %asset.original_file_name,
            bytes = asset.contents.len(),
            "Emitting output asset"
        );
        inner.insert(asset.file_name.clone(), asset);
        true
    }

    pub fn get(&self, file_name: &std::path::Path) -> Option<EmittedAsset> {
        self.inner.read().get(file_name).cloned()
    }

    /// All outputs, sorted by file name.
    pub fn all(&self) -> Vec<EmittedAsset> {
        let mut assets: Vec<_> = self.inner.read().values().cloned().collect();
        assets.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        assets
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}
