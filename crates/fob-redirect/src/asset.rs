//! Static asset redirection.
//!
//! A specifier ending in a known asset extension is handed to an
//! [`AssetResolver`], which copies (or transforms) the file into the output
//! tree and tells us what the import should point at afterwards.

use crate::error::{RedirectError, Result};
use crate::paths::{extname, resolve, trim_extension};
use crate::store::{EmittedAsset, OutputRegistry};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;

/// Extensions handled as static assets.
pub const ASSET_EXTENSIONS: &[&str] = &[
    ".svg",
    ".png",
    ".jpg",
    ".jpeg",
    ".gif",
    ".bmp",
    ".webp",
    ".ico",
    ".apng",
    ".avif",
    ".tif",
    ".tiff",
    ".jfif",
    ".pjpeg",
    ".pjp",
    ".cur",
    ".mp4",
    ".webm",
    ".ogg",
    ".mp3",
    ".wav",
    ".flac",
    ".aac",
    ".woff",
    ".woff2",
    ".eot",
    ".ttf",
    ".otf",
    ".webmanifest",
    ".pdf",
    ".txt",
];

/// How the emitted asset should be imported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetLoader {
    /// Plain file reference
    Url,
    /// Asset was turned into a JS component module
    Jsx,
}

/// Result of resolving one asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetContents {
    /// Specifier of the emitted file, relative to the output directory
    pub contents: String,
    pub loader: AssetLoader,
}

/// Produces emitted content for an asset referenced from source.
#[async_trait]
pub trait AssetResolver: Send + Sync + std::fmt::Debug {
    /// Emit the asset at `abs_path` for a module whose output lives in
    /// `output_dir`.
    ///
    /// `force_transform` asks the resolver to run any on-load transform
    /// (such as SVG to component) even outside a bundling context.
    async fn get_asset_contents(
        &self,
        abs_path: &Path,
        output_dir: &Path,
        force_transform: bool,
    ) -> Result<AssetContents>;
}

/// Converts an asset into JavaScript module source.
pub trait ComponentTransform: Send + Sync + std::fmt::Debug {
    /// Extensions this transform accepts, e.g. `[".svg"]`
    fn extensions(&self) -> &[&str];

    fn transform(&self, path: &Path, contents: &[u8]) -> anyhow::Result<String>;
}

/// Whether `name` ends with a recognised asset extension.
pub fn is_asset(name: &str) -> bool {
    ASSET_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

/// Rewrite an asset specifier, emitting the asset through `resolver`.
///
/// Returns `None` for non-asset specifiers.
pub async fn redirect_asset(
    resolver: &dyn AssetResolver,
    name: &str,
    file_path: &Path,
    output_dir: &Path,
) -> Result<Option<String>> {
    if !is_asset(name) {
        return Ok(None);
    }

    let from_dir = file_path.parent().unwrap_or_else(|| Path::new(""));
    let abs_path = resolve(from_dir, name);
    let AssetContents { contents, loader } = resolver
        .get_asset_contents(&abs_path, output_dir, true)
        .await?;

    let edit = match loader {
        AssetLoader::Jsx => {
            format!("{}.js", trim_extension(name, extname(name)))
        }
        AssetLoader::Url => contents,
    };
    Ok(Some(edit))
}

/// Filesystem-backed resolver.
///
/// Assets are copied to `<output_dir>/<public_path>/<stem>-<hash8><ext>`
/// through the [`OutputRegistry`]. With a [`ComponentTransform`]
/// configured, matching files become `<output_dir>/<stem>.js` instead.
#[derive(Debug, Clone)]
pub struct FsAssetResolver {
    outputs: OutputRegistry,
    public_path: String,
    hash: bool,
    component: Option<Arc<dyn ComponentTransform>>,
}

impl FsAssetResolver {
    pub fn new(outputs: OutputRegistry) -> Self {
        Self {
            outputs,
            public_path: "assets".to_string(),
            hash: true,
            component: None,
        }
    }

    pub fn with_public_path(mut self, public_path: impl Into<String>) -> Self {
        self.public_path = public_path.into().trim_matches('/').to_string();
        self
    }

    pub fn with_hash(mut self, hash: bool) -> Self {
        self.hash = hash;
        self
    }

    pub fn with_component_transform(mut self, transform: Arc<dyn ComponentTransform>) -> Self {
        self.component = Some(transform);
        self
    }

    fn file_name(&self, path: &Path, contents: &[u8]) -> String {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        if self.hash {
            let hash = hash_content(contents);
            format!("{}-{}{}", stem, &hash[..8], ext)
        } else {
            format!("{}{}", stem, ext)
        }
    }

    fn component_for(&self, path: &Path) -> Option<&Arc<dyn ComponentTransform>> {
        let name = path.to_string_lossy();
        self.component
            .as_ref()
            .filter(|c| c.extensions().iter().any(|ext| name.ends_with(ext)))
    }
}

#[async_trait]
impl AssetResolver for FsAssetResolver {
    async fn get_asset_contents(
        &self,
        abs_path: &Path,
        output_dir: &Path,
        force_transform: bool,
    ) -> Result<AssetContents> {
        let bytes = tokio::fs::read(abs_path)
            .await
            .map_err(|e| RedirectError::asset(abs_path, e))?;

        if let Some(component) = self.component_for(abs_path).filter(|_| force_transform) {
            let code = component.transform(abs_path, &bytes).map_err(|e| {
                RedirectError::AssetTransform {
                    path: abs_path.to_path_buf(),
                    reason: format!("{:#}", e),
                }
            })?;
            let stem = abs_path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let file = format!("{}.js", stem);
            self.outputs.emit(EmittedAsset {
                file_name: output_dir.join(&file),
                original_file_name: abs_path.to_string_lossy().into_owned(),
                contents: code.into_bytes(),
            });
            return Ok(AssetContents {
                contents: format!("./{}", file),
                loader: AssetLoader::Jsx,
            });
        }

        let file = self.file_name(abs_path, &bytes);
        let relative = if self.public_path.is_empty() {
            file
        } else {
            format!("{}/{}", self.public_path, file)
        };

        self.outputs.emit(EmittedAsset {
            file_name: output_dir.join(&relative),
            original_file_name: abs_path.to_string_lossy().into_owned(),
            contents: bytes,
        });

        Ok(AssetContents {
            contents: format!("./{}", relative),
            loader: AssetLoader::Url,
        })
    }
}

/// Hex-encoded SHA-256 of `data`.
fn hash_content(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}
