//! Error types for specifier redirection and configuration loading.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while redirecting a module.
///
/// Parse failures never escape [`RedirectPipeline::transform`](crate::RedirectPipeline::transform);
/// they are logged and the module passes through untouched. Every other
/// variant fails the transform of the file that produced it.
#[derive(Error, Debug, Diagnostic)]
pub enum RedirectError {
    /// Source text could not be parsed
    #[error("Failed to parse {}: {message}", path.display())]
    #[diagnostic(code(fob::redirect::parse))]
    Parse { path: PathBuf, message: String },

    /// A referenced asset could not be read or emitted
    #[error("Failed to resolve asset {}", path.display())]
    #[diagnostic(
        code(fob::redirect::asset_resolution),
        help("check that the imported file exists relative to the importing module")
    )]
    AssetResolution {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A component transform (e.g. SVG to component) failed
    #[error("Failed to transform asset {} into a component: {reason}", path.display())]
    #[diagnostic(code(fob::redirect::asset_transform))]
    AssetTransform { path: PathBuf, reason: String },

    /// Generated stylesheet content was not registered under its hash key
    #[error("Virtual module '{key}' not found (imported as '{specifier}')")]
    #[diagnostic(code(fob::redirect::virtual_module_missing))]
    VirtualModuleMissing { key: String, specifier: String },

    /// Two edits touch intersecting, non-identical ranges
    #[error("Edit {start}..{end} overlaps existing edit {other_start}..{other_end}")]
    #[diagnostic(code(fob::redirect::overlapping_edit))]
    OverlappingEdit {
        start: usize,
        end: usize,
        other_start: usize,
        other_end: usize,
    },

    /// Edit range does not fit the original text
    #[error("Edit {start}..{end} is out of bounds for source of length {len}")]
    #[diagnostic(code(fob::redirect::edit_out_of_bounds))]
    EditOutOfBounds { start: usize, end: usize, len: usize },

    /// tsconfig.json exists but could not be read or understood
    #[error("Invalid tsconfig {}: {reason}", path.display())]
    #[diagnostic(code(fob::redirect::tsconfig))]
    Tsconfig { path: PathBuf, reason: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

impl RedirectError {
    /// Create a Parse error from a list of diagnostics
    pub fn parse(path: impl Into<PathBuf>, messages: &[String]) -> Self {
        Self::Parse {
            path: path.into(),
            message: messages.join(", "),
        }
    }

    /// Create an AssetResolution error
    pub fn asset(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::AssetResolution {
            path: path.into(),
            source,
        }
    }
}

/// Errors raised while discovering or deserializing [`BuildConfig`](crate::BuildConfig).
#[derive(Error, Debug, Diagnostic)]
pub enum ConfigError {
    #[error("config not found")]
    #[diagnostic(code(fob::redirect::config::not_found))]
    NotFound,

    #[error("invalid config value for '{field}'{}", hint.as_ref().map(|h| format!(": {}", h)).unwrap_or_default())]
    #[diagnostic(code(fob::redirect::config::invalid_value))]
    InvalidValue { field: String, hint: Option<String> },

    #[error("invalid style.autoModules pattern '{pattern}': {reason}")]
    #[diagnostic(code(fob::redirect::config::auto_modules))]
    InvalidAutoModules { pattern: String, reason: String },

    #[error("I/O error: {0}")]
    #[diagnostic(code(fob::redirect::config::io))]
    Io(#[from] std::io::Error),
}

/// Result type for redirect operations
pub type Result<T> = std::result::Result<T, RedirectError>;

/// Result type for configuration loading
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
