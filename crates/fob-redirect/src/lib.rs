#![cfg_attr(docsrs, feature(doc_cfg))]

//! # fob-redirect
//!
//! Import specifier redirection for unbundled builds.
//!
//! When a library is compiled file-by-file instead of bundled, the
//! specifiers in each output module must still resolve against the output
//! tree. This crate rewrites them in place:
//!
//! - aliases (`@/utils`) become relative paths or their module-id target
//! - extensionless relative imports gain the output extension (`.mjs`/`.cjs`)
//!   and TypeScript suffixes are swapped for it
//! - stylesheets point at their emitted `.css` (or CSS-module companion)
//! - static assets are emitted and the import points at the copy
//!
//! Only the string literal of each specifier changes; everything else,
//! quotes included, is preserved and a source map is produced.
//!
//! ## Quick Start
//!
//! ```no_run
//! use fob_redirect::{BuildConfig, RedirectPipeline, TransformArgs};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = BuildConfig::from_value(serde_json::json!({
//!     "root": "/project",
//!     "autoExtension": true,
//!     "resolve": { "alias": { "@": "./src" } }
//! }))?;
//! let pipeline = RedirectPipeline::new(config)?;
//!
//! let output = pipeline
//!     .transform(TransformArgs::new(
//!         "import { format } from '@/utils/format';",
//!         "/project/src/pages/home.ts",
//!     ))
//!     .await?;
//! println!("{}", output.code);
//!
//! for asset in pipeline.outputs().all() {
//!     println!("emitted {}", asset.file_name.display());
//! }
//! # Ok(()) }
//! ```

pub mod alias;
pub mod asset;
pub mod config;
pub mod edit;
pub mod error;
pub mod extension;
pub mod matcher;
pub mod path_kind;
pub mod paths;
pub mod pipeline;
pub mod store;
pub mod style;
pub mod tsconfig;

#[cfg(feature = "logging")]
#[cfg_attr(docsrs, doc(cfg(feature = "logging")))]
pub mod logging;

pub use alias::AliasTable;
pub use asset::{AssetContents, AssetLoader, AssetResolver, ComponentTransform, FsAssetResolver};
pub use config::{
    AssetOptions, AutoModules, BuildConfig, ConfigDiscovery, OutputFormat, RedirectOptions,
    ResolveOptions, StyleOptions,
};
pub use edit::{EditBuffer, RenderedSource};
pub use error::{ConfigError, ConfigResult, RedirectError, Result};
pub use extension::OutputExtension;
pub use matcher::{ParseFailure, SpecifierMatch, find_specifiers, source_type_for_path};
pub use path_kind::PathKind;
pub use pipeline::{Loader, RedirectPipeline, RedirectPipelineBuilder, TransformArgs, TransformOutput};
pub use store::{EmittedAsset, OutputRegistry, VirtualModuleStore};
pub use style::{AutoModulesDetector, CssModuleDetector};
pub use tsconfig::{MatchPath, TsconfigPaths};
