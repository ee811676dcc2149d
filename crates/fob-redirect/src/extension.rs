//! Output extension detection and relative-specifier normalization.

use crate::config::OutputFormat;
use std::path::Path;

/// TypeScript source suffixes rewritten to the output extension.
const TS_EXTENSIONS: &[&str] = &[".mtsx", ".ctsx", ".mts", ".cts", ".tsx", ".ts"];

/// Script suffixes a module must carry to be redirected.
const SCRIPT_EXTENSIONS: &[&str] = &[
    ".mjsx", ".cjsx", ".mtsx", ".ctsx", ".mjs", ".cjs", ".mts", ".cts", ".jsx", ".tsx", ".js",
    ".ts",
];

/// The extension emitted JavaScript files will carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputExtension {
    /// `.js`, `.mjs` or `.cjs`
    pub js_extension: String,

    /// Whether the nearest package.json declares `"type": "module"`
    pub is_module: bool,
}

impl Default for OutputExtension {
    fn default() -> Self {
        Self {
            js_extension: ".js".to_string(),
            is_module: false,
        }
    }
}

impl OutputExtension {
    /// Work out the output extension for `format` in the package at `root`.
    ///
    /// Without `auto_extension` every format emits `.js`. With it, a CommonJS
    /// build inside a `"type": "module"` package emits `.cjs` and an ESM
    /// build outside one emits `.mjs`.
    pub fn detect(format: OutputFormat, root: &Path, auto_extension: bool) -> Self {
        if !auto_extension {
            return Self::default();
        }

        let is_module = package_type_is_module(root);
        let js_extension = match format {
            OutputFormat::Cjs if is_module => ".cjs",
            OutputFormat::Esm if !is_module => ".mjs",
            _ => ".js",
        };

        Self {
            js_extension: js_extension.to_string(),
            is_module,
        }
    }
}

fn package_type_is_module(root: &Path) -> bool {
    let path = root.join("package.json");
    let Ok(content) = std::fs::read_to_string(&path) else {
        return false;
    };
    match serde_json::from_str::<serde_json::Value>(&content) {
        Ok(pkg) => pkg.get("type").and_then(|t| t.as_str()) == Some("module"),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Ignoring unparseable package.json");
            false
        }
    }
}

/// Matching TypeScript suffix of `name`, if any.
pub fn ts_extension(name: &str) -> Option<&'static str> {
    TS_EXTENSIONS.iter().copied().find(|ext| name.ends_with(ext))
}

/// Whether `path` names a JavaScript or TypeScript module.
pub fn is_script_path(path: &str) -> bool {
    SCRIPT_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// New text for a relative specifier, or `None` when it already fits.
///
/// `ext` is the extension of the specifier as written in the source.
/// Extensionless names gain `js_extension` when it differs from `.js` or
/// the package is ESM; TypeScript suffixes are swapped for it.
pub fn normalize_extension(
    name: &str,
    ext: &str,
    js_extension: &str,
    is_module: bool,
) -> Option<String> {
    if !name.starts_with('.') {
        return None;
    }

    if ext.is_empty() && (js_extension != ".js" || is_module) {
        return Some(format!("{}{}", name, js_extension));
    }

    let ts = ts_extension(name)?;
    Some(format!("{}{}", &name[..name.len() - ts.len()], js_extension))
}
