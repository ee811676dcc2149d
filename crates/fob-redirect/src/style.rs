//! Stylesheet specifier redirection.
//!
//! Stylesheets are always emitted as plain `.css`, whatever preprocessor
//! wrote them. CSS modules lose their extension entirely so the consumer
//! picks up the generated companion module. Extracted CSS that only
//! exists in memory arrives as `./x.module.css?css_virtual&hash=<key>`
//! and is written out as a sibling file of the transformed module.

use crate::config::AutoModules;
use crate::error::{ConfigError, RedirectError, Result};
use crate::paths::{basename_without_ext, extname, trim_extension};
use crate::store::{EmittedAsset, OutputRegistry, VirtualModuleStore};
use regex::{Regex, RegexBuilder};
use rustc_hash::FxHashMap;
use std::path::Path;

/// Extensions treated as stylesheets.
pub const STYLE_EXTENSIONS: &[&str] = &[".less", ".sass", ".scss", ".css"];

const DEFAULT_MODULE_PATTERN: &str = r"\.module\.\w+$";

/// Specifier split into its file part and query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecifierQuery<'a> {
    pub original_file_path: &'a str,
    /// `None` marks a key given without `=value`
    pub query: FxHashMap<&'a str, Option<&'a str>>,
}

impl<'a> SpecifierQuery<'a> {
    pub fn parse(specifier: &'a str) -> Self {
        let Some((path, raw_query)) = specifier.split_once('?') else {
            return Self {
                original_file_path: specifier,
                query: FxHashMap::default(),
            };
        };

        let query = raw_query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| match pair.split_once('=') {
                Some((key, value)) => (key, Some(value)),
                None => (pair, None),
            })
            .collect();

        Self {
            original_file_path: path,
            query,
        }
    }

    /// True for a bare key or a non-empty value.
    pub fn flag(&self, key: &str) -> bool {
        match self.query.get(key) {
            Some(None) => true,
            Some(Some(value)) => !value.is_empty(),
            None => false,
        }
    }

    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.query.get(key).copied().flatten()
    }
}

/// Decides whether a stylesheet specifier names a CSS module.
pub trait CssModuleDetector: Send + Sync + std::fmt::Debug {
    fn is_css_module(&self, name: &str) -> bool;
}

/// Detector driven by the `style.autoModules` option.
#[derive(Debug, Clone)]
pub struct AutoModulesDetector {
    pattern: Option<Regex>,
}

impl AutoModulesDetector {
    /// `false` never matches, `true` matches `*.module.<ext>` and a string
    /// is compiled as a regex.
    pub fn new(auto_modules: &AutoModules) -> std::result::Result<Self, ConfigError> {
        let source = match auto_modules {
            AutoModules::Enabled(false) => return Ok(Self { pattern: None }),
            AutoModules::Enabled(true) => DEFAULT_MODULE_PATTERN,
            AutoModules::Pattern(pattern) => pattern.as_str(),
        };

        let pattern = RegexBuilder::new(source)
            .case_insensitive(matches!(auto_modules, AutoModules::Enabled(true)))
            .build()
            .map_err(|e| ConfigError::InvalidAutoModules {
                pattern: source.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            pattern: Some(pattern),
        })
    }
}

impl CssModuleDetector for AutoModulesDetector {
    fn is_css_module(&self, name: &str) -> bool {
        self.pattern.as_ref().is_some_and(|p| p.is_match(name))
    }
}

/// Edits proposed for one specifier, in the order they were produced.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StyleRedirect {
    pub edits: Vec<String>,
    /// No later policy should look at this specifier
    pub done: bool,
}

/// Rewrites stylesheet specifiers and emits virtual CSS.
#[derive(Debug, Clone, Copy)]
pub struct StyleRedirector<'a> {
    pub virtual_modules: &'a VirtualModuleStore,
    pub outputs: &'a OutputRegistry,
    pub detector: &'a dyn CssModuleDetector,
}

impl StyleRedirector<'_> {
    /// Redirect `name`; `ext` is the extension of the specifier as written.
    ///
    /// # Errors
    ///
    /// [`RedirectError::VirtualModuleMissing`] when a `css_virtual`
    /// specifier points at a hash the store does not know.
    pub fn redirect(&self, name: &str, ext: &str, output_dir: &Path) -> Result<StyleRedirect> {
        let mut result = StyleRedirect::default();
        let parsed = SpecifierQuery::parse(name);

        if parsed.flag("css_virtual") {
            let edit = self.emit_virtual(name, &parsed, output_dir)?;
            result.edits.push(edit);
        }

        if !name.starts_with('.') {
            result.done = true;
            return Ok(result);
        }

        if STYLE_EXTENSIONS.contains(&ext) {
            let stem = trim_extension(name, ext);
            let edit = if self.detector.is_css_module(name) {
                stem.to_string()
            } else {
                format!("{}.css", stem)
            };
            result.edits.push(edit);
            result.done = true;
        }

        Ok(result)
    }

    fn emit_virtual(
        &self,
        name: &str,
        parsed: &SpecifierQuery<'_>,
        output_dir: &Path,
    ) -> Result<String> {
        let file = parsed.original_file_path;
        let stem = basename_without_ext(file, extname(file));
        let base = format!("{}.css", stem.replacen('.', "_", 1));

        let key = parsed.get("hash").unwrap_or_default();
        let contents =
            self.virtual_modules
                .get(key)
                .ok_or_else(|| RedirectError::VirtualModuleMissing {
                    key: key.to_string(),
                    specifier: name.to_string(),
                })?;

        self.outputs.emit(EmittedAsset {
            file_name: output_dir.join(&base),
            original_file_name: name.to_string(),
            contents: contents.into_bytes(),
        });

        Ok(format!("./{}", base))
    }
}
