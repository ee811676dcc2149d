//! Per-file specifier redirection.
//!
//! [`RedirectPipeline::transform`] is the build hook: it takes one module's
//! source, finds every import/export/require specifier and runs the
//! policies in a fixed order for each:
//!
//! 1. alias resolution (tsconfig paths, then configured aliases)
//! 2. output extension normalization
//! 3. stylesheet rewriting, including virtual CSS emission
//! 4. asset emission and rewriting
//!
//! Policies see the original span of their specifier; edits are collected
//! per match concurrently and applied to a single [`EditBuffer`] afterwards.
//! When several policies edit the same span, the last one wins.

use crate::alias::AliasTable;
use crate::asset::{AssetResolver, FsAssetResolver, redirect_asset};
use crate::config::BuildConfig;
use crate::edit::EditBuffer;
use crate::error::{RedirectError, Result};
use crate::extension::{OutputExtension, is_script_path, normalize_extension};
use crate::matcher::{SpecifierMatch, find_specifiers, source_type_for_path};
use crate::paths::{extname, to_slash};
use crate::store::{OutputRegistry, VirtualModuleStore};
use crate::style::{CssModuleDetector, StyleRedirector};
use crate::tsconfig::{MatchPath, TsconfigPaths};
use futures::future::try_join_all;
use oxc_sourcemap::SourceMap;
use oxc_span::SourceType;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Loader the build assigned to a module.
///
/// Only the script loaders are redirected; the rest pass through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Loader {
    /// JavaScript, JSX allowed
    Js,
    /// JavaScript with JSX
    Jsx,
    /// TypeScript
    Ts,
    /// TypeScript with JSX
    Tsx,
    /// Stylesheet
    Css,
    /// JSON module
    Json,
    /// Raw text
    Text,
    /// Copied file
    File,
}

impl Loader {
    pub fn is_script(self) -> bool {
        matches!(self, Loader::Js | Loader::Jsx | Loader::Ts | Loader::Tsx)
    }

    fn source_type(self) -> Option<SourceType> {
        match self {
            Loader::Js | Loader::Jsx => Some(SourceType::jsx()),
            Loader::Ts => Some(SourceType::ts()),
            Loader::Tsx => Some(SourceType::tsx()),
            _ => None,
        }
    }
}

/// Input of the transform hook.
#[derive(Debug, Clone)]
pub struct TransformArgs {
    /// Module source
    pub code: String,
    /// Absolute path of the module
    pub path: PathBuf,
    /// Loader override; otherwise the path extension decides
    pub loader: Option<Loader>,
}

impl TransformArgs {
    pub fn new(code: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            code: code.into(),
            path: path.into(),
            loader: None,
        }
    }

    pub fn with_loader(mut self, loader: Loader) -> Self {
        self.loader = Some(loader);
        self
    }
}

/// Output of the transform hook. `map` is `None` when nothing changed.
#[derive(Debug)]
pub struct TransformOutput {
    /// Rewritten source, or the input when nothing changed
    pub code: String,
    /// Map back to the input, embedding its content
    pub map: Option<SourceMap>,
}

impl TransformOutput {
    fn passthrough(code: String) -> Self {
        Self { code, map: None }
    }
}

/// Per-file state shared by every match.
struct FileContext<'a> {
    file_path: &'a Path,
    output_dir: PathBuf,
}

/// Import specifier redirection for one build target.
#[derive(Debug, Clone)]
pub struct RedirectPipeline {
    /// Config with `root` made absolute at build time
    config: BuildConfig,
    aliases: AliasTable,
    extension: OutputExtension,
    virtual_modules: VirtualModuleStore,
    outputs: OutputRegistry,
    css_modules: Arc<dyn CssModuleDetector>,
    asset_resolver: Arc<dyn AssetResolver>,
    match_path: Option<Arc<dyn MatchPath>>,
}

impl RedirectPipeline {
    /// Pipeline with default collaborators.
    pub fn new(config: BuildConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    pub fn builder(config: BuildConfig) -> RedirectPipelineBuilder {
        RedirectPipelineBuilder::new(config)
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn virtual_modules(&self) -> &VirtualModuleStore {
        &self.virtual_modules
    }

    pub fn outputs(&self) -> &OutputRegistry {
        &self.outputs
    }

    /// Output extension detected when the pipeline was built.
    pub fn output_extension(&self) -> &OutputExtension {
        &self.extension
    }

    /// Rewrite the specifiers of one module.
    ///
    /// Non-script modules, empty sources and bundle output formats pass
    /// through untouched, as do sources the parser rejects.
    ///
    /// # Errors
    ///
    /// Asset resolution and virtual CSS lookups fail the whole file.
    pub async fn transform(&self, args: TransformArgs) -> Result<TransformOutput> {
        let TransformArgs { code, path, loader } = args;

        let is_script = is_script_path(&to_slash(&path)) || loader.is_some_and(Loader::is_script);
        if !is_script {
            tracing::trace!(path = %path.display(), "Skipping non-script module");
            return Ok(TransformOutput::passthrough(code));
        }
        if code.is_empty() || self.config.format.is_bundle_format() {
            tracing::debug!(
                path = %path.display(),
                format = ?self.config.format,
                "Skipping redirect"
            );
            return Ok(TransformOutput::passthrough(code));
        }

        let source_type = loader
            .and_then(Loader::source_type)
            .unwrap_or_else(|| source_type_for_path(&path));

        let matches = match find_specifiers(&code, source_type) {
            Ok(matches) => matches,
            Err(failure) => {
                let err = RedirectError::parse(&path, &failure.diagnostics);
                tracing::error!(error = %err, "[parse error]");
                return Ok(TransformOutput::passthrough(code));
            }
        };
        if matches.is_empty() {
            return Ok(TransformOutput::passthrough(code));
        }

        let ctx = FileContext {
            file_path: &path,
            output_dir: self.config.output_dir_for(&path),
        };

        let edits = try_join_all(matches.iter().map(|m| self.redirect_match(m, &ctx))).await?;

        let mut buffer = EditBuffer::new(&code);
        for (specifier, replacements) in matches.iter().zip(edits) {
            for replacement in replacements {
                buffer.overwrite(specifier.start, specifier.end, replacement)?;
            }
        }
        if buffer.is_empty() {
            return Ok(TransformOutput::passthrough(code));
        }

        let rendered = buffer.render_with_map(&to_slash(&path));
        tracing::debug!(
            path = %path.display(),
            rewritten = buffer.len(),
            "Redirected specifiers"
        );
        Ok(TransformOutput {
            code: rendered.code,
            map: Some(rendered.map),
        })
    }

    /// Every replacement the policies propose for one specifier, in order.
    async fn redirect_match(
        &self,
        specifier: &SpecifierMatch,
        ctx: &FileContext<'_>,
    ) -> Result<Vec<String>> {
        let redirect = &self.config.redirect;
        let ext = extname(&specifier.text);
        let mut name = specifier.text.clone();
        let mut edits = Vec::new();

        if redirect.alias {
            if let Some(resolved) =
                self.aliases
                    .redirect(&name, ctx.file_path, self.match_path.as_deref())
            {
                tracing::debug!(from = %name, to = %resolved, "Resolved alias");
                edits.push(resolved.clone());
                name = resolved;
            }
        }

        if redirect.auto_extension {
            let OutputExtension {
                js_extension,
                is_module,
            } = &self.extension;
            if let Some(normalized) = normalize_extension(&name, ext, js_extension, *is_module) {
                tracing::debug!(from = %name, to = %normalized, "Normalized extension");
                edits.push(normalized);
                return Ok(edits);
            }
        }

        if redirect.style {
            let style = StyleRedirector {
                virtual_modules: &self.virtual_modules,
                outputs: &self.outputs,
                detector: self.css_modules.as_ref(),
            }
            .redirect(&name, ext, &ctx.output_dir)?;
            if let Some(last) = style.edits.last() {
                tracing::debug!(from = %name, to = %last, "Redirected stylesheet");
            }
            edits.extend(style.edits);
            if style.done {
                return Ok(edits);
            }
        }

        if redirect.asset {
            if let Some(asset) = redirect_asset(
                self.asset_resolver.as_ref(),
                &name,
                ctx.file_path,
                &ctx.output_dir,
            )
            .await?
            {
                tracing::debug!(from = %name, to = %asset, "Redirected asset");
                edits.push(asset);
            }
        }

        Ok(edits)
    }
}

/// Builder for [`RedirectPipeline`].
///
/// Unset collaborators fall back to defaults derived from the config:
/// fresh stores, the `style.autoModules` detector, a filesystem asset
/// resolver and the project's tsconfig paths when the file exists.
pub struct RedirectPipelineBuilder {
    config: BuildConfig,
    virtual_modules: Option<VirtualModuleStore>,
    outputs: Option<OutputRegistry>,
    css_modules: Option<Arc<dyn CssModuleDetector>>,
    asset_resolver: Option<Arc<dyn AssetResolver>>,
    match_path: Option<Option<Arc<dyn MatchPath>>>,
}

impl RedirectPipelineBuilder {
    pub fn new(config: BuildConfig) -> Self {
        Self {
            config,
            virtual_modules: None,
            outputs: None,
            css_modules: None,
            asset_resolver: None,
            match_path: None,
        }
    }

    pub fn virtual_modules(mut self, store: VirtualModuleStore) -> Self {
        self.virtual_modules = Some(store);
        self
    }

    pub fn outputs(mut self, registry: OutputRegistry) -> Self {
        self.outputs = Some(registry);
        self
    }

    pub fn css_module_detector(mut self, detector: Arc<dyn CssModuleDetector>) -> Self {
        self.css_modules = Some(detector);
        self
    }

    pub fn asset_resolver(mut self, resolver: Arc<dyn AssetResolver>) -> Self {
        self.asset_resolver = Some(resolver);
        self
    }

    /// Override tsconfig path matching; `None` disables it.
    pub fn match_path(mut self, matcher: Option<Arc<dyn MatchPath>>) -> Self {
        self.match_path = Some(matcher);
        self
    }

    /// The project root, aliases and output extension are fixed here for the
    /// lifetime of the pipeline.
    ///
    /// # Errors
    ///
    /// Fails when `style.autoModules` is not a valid regex.
    pub fn build(self) -> Result<RedirectPipeline> {
        let root = self.config.root_dir();
        let config = self.config.with_root(root);
        let aliases = config.alias_table();
        let extension = config.output_extension();

        let virtual_modules = self.virtual_modules.unwrap_or_default();
        let outputs = self.outputs.unwrap_or_default();

        let css_modules: Arc<dyn CssModuleDetector> = match self.css_modules {
            Some(detector) => detector,
            None => Arc::new(config.css_module_detector()?),
        };

        let asset_resolver: Arc<dyn AssetResolver> = match self.asset_resolver {
            Some(resolver) => resolver,
            None => Arc::new(
                FsAssetResolver::new(outputs.clone())
                    .with_public_path(config.asset.public_path.clone())
                    .with_hash(config.asset.hash),
            ),
        };

        let match_path = match self.match_path {
            Some(matcher) => matcher,
            None => load_tsconfig_paths(&config.tsconfig_path()),
        };

        tracing::debug!(
            root = %config.root.display(),
            js_extension = %extension.js_extension,
            is_module = extension.is_module,
            "Built redirect pipeline"
        );

        Ok(RedirectPipeline {
            config,
            aliases,
            extension,
            virtual_modules,
            outputs,
            css_modules,
            asset_resolver,
            match_path,
        })
    }
}

fn load_tsconfig_paths(tsconfig: &Path) -> Option<Arc<dyn MatchPath>> {
    if !tsconfig.exists() {
        return None;
    }
    match TsconfigPaths::load(tsconfig) {
        Ok(Some(paths)) => {
            tracing::debug!(
                tsconfig = %tsconfig.display(),
                base_url = %paths.base_url().display(),
                "Loaded tsconfig paths"
            );
            Some(Arc::new(paths))
        }
        Ok(None) => None,
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring tsconfig paths");
            None
        }
    }
}
