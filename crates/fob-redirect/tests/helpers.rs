//! Shared test utilities for fob-redirect tests

#![allow(dead_code)]

use async_trait::async_trait;
use fob_redirect::{
    AssetContents, AssetLoader, AssetResolver, BuildConfig, CssModuleDetector, RedirectPipeline,
    TransformArgs, TransformOutput,
};
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Temporary project directory with a `src/` tree.
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        fs::create_dir_all(dir.path().join("src")).expect("create src");
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Write a file, creating parent directories.
    pub fn write(&self, relative: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, contents).expect("write file");
        path
    }

    /// Config rooted at this project, with `overrides` merged on top.
    pub fn config(&self, overrides: serde_json::Value) -> BuildConfig {
        BuildConfig::from_value(overrides)
            .expect("valid config")
            .with_root(self.root())
    }
}

/// CSS-module predicate with a fixed answer.
#[derive(Debug)]
pub struct FixedCssModules(pub bool);

impl CssModuleDetector for FixedCssModules {
    fn is_css_module(&self, _name: &str) -> bool {
        self.0
    }
}

/// Asset resolver that records its calls and answers with a fixed loader.
#[derive(Debug)]
pub struct FakeAssetResolver {
    pub loader: AssetLoader,
    pub calls: Mutex<Vec<(PathBuf, PathBuf, bool)>>,
}

impl FakeAssetResolver {
    pub fn new(loader: AssetLoader) -> Arc<Self> {
        Arc::new(Self {
            loader,
            calls: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl AssetResolver for FakeAssetResolver {
    async fn get_asset_contents(
        &self,
        abs_path: &Path,
        output_dir: &Path,
        force_transform: bool,
    ) -> fob_redirect::Result<AssetContents> {
        self.calls
            .lock()
            .push((abs_path.to_path_buf(), output_dir.to_path_buf(), force_transform));
        let file = abs_path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(AssetContents {
            contents: format!("./static/{}", file),
            loader: self.loader,
        })
    }
}

/// Pipeline with default collaborators.
pub fn pipeline(config: BuildConfig) -> RedirectPipeline {
    RedirectPipeline::new(config).expect("pipeline")
}

/// Run `code` through `pipeline` as the module at `path`.
pub async fn transform(
    pipeline: &RedirectPipeline,
    code: &str,
    path: impl Into<PathBuf>,
) -> TransformOutput {
    pipeline
        .transform(TransformArgs::new(code, path))
        .await
        .expect("transform should succeed")
}
