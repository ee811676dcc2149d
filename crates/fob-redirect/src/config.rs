//! Build configuration consumed by the redirect pipeline.
//!
//! Library users construct [`BuildConfig`] directly or through
//! [`BuildConfig::from_value`]. [`ConfigDiscovery`] covers the file-based
//! case: `fob-redirect.toml` first, then the `redirect` field of
//! `package.json`.
//!
//! Alias maps keep the order they were written in, since the first
//! matching alias wins.

use crate::alias::AliasTable;
use crate::error::{ConfigError, ConfigResult};
use crate::extension::OutputExtension;
use crate::paths::{relative, resolve};
use crate::style::AutoModulesDetector;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Module format of the emitted JavaScript.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Esm,
    Cjs,
    Iife,
    Umd,
}

impl OutputFormat {
    /// Self-contained bundle formats, where import specifiers no longer exist.
    pub fn is_bundle_format(self) -> bool {
        matches!(self, OutputFormat::Iife | OutputFormat::Umd)
    }
}

/// Which redirect policies run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RedirectOptions {
    pub alias: bool,
    pub style: bool,
    pub asset: bool,
    pub auto_extension: bool,
}

impl Default for RedirectOptions {
    fn default() -> Self {
        Self {
            alias: true,
            style: true,
            asset: true,
            auto_extension: true,
        }
    }
}

/// `style.autoModules`: a switch or a regex over the specifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AutoModules {
    Enabled(bool),
    Pattern(String),
}

impl Default for AutoModules {
    fn default() -> Self {
        AutoModules::Enabled(true)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StyleOptions {
    pub auto_modules: AutoModules,
}

/// Options for the built-in filesystem asset resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssetOptions {
    /// Directory under the module's output directory that receives assets
    pub public_path: String,

    /// Append a content hash to emitted file names
    pub hash: bool,
}

impl Default for AssetOptions {
    fn default() -> Self {
        Self {
            public_path: "assets".to_string(),
            hash: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolveOptions {
    /// Aliases that also enable bare module-id targets
    pub alias: IndexMap<String, String>,
}

/// Configuration for one build target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildConfig {
    /// Project root; other relative paths resolve against it
    pub root: PathBuf,
    pub source_dir: PathBuf,
    pub out_dir: PathBuf,
    pub format: OutputFormat,
    pub auto_extension: bool,
    pub tsconfig: PathBuf,

    /// Legacy aliases, used only when `resolve.alias` is empty
    pub alias: IndexMap<String, String>,
    pub resolve: ResolveOptions,
    pub redirect: RedirectOptions,
    pub style: StyleOptions,
    pub asset: AssetOptions,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            source_dir: PathBuf::from("src"),
            out_dir: PathBuf::from("dist"),
            format: OutputFormat::default(),
            auto_extension: false,
            tsconfig: PathBuf::from("tsconfig.json"),
            alias: IndexMap::new(),
            resolve: ResolveOptions::default(),
            redirect: RedirectOptions::default(),
            style: StyleOptions::default(),
            asset: AssetOptions::default(),
        }
    }
}

impl BuildConfig {
    /// Create config from a JSON value.
    ///
    /// # Example
    ///
    /// ```
    /// use fob_redirect::{BuildConfig, OutputFormat};
    /// use serde_json::json;
    ///
    /// let config = BuildConfig::from_value(json!({
    ///     "format": "cjs",
    ///     "resolve": { "alias": { "@": "./src" } }
    /// }))
    /// .unwrap();
    /// assert_eq!(config.format, OutputFormat::Cjs);
    /// assert!(config.module_id_alias_support());
    /// ```
    pub fn from_value(value: Value) -> ConfigResult<Self> {
        serde_json::from_value(value).map_err(|e| ConfigError::InvalidValue {
            field: "config".to_string(),
            hint: Some(e.to_string()),
        })
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Absolute project root, resolved against the working directory.
    pub fn root_dir(&self) -> PathBuf {
        if self.root.is_absolute() {
            return resolve(&self.root, ".");
        }
        match std::env::current_dir() {
            Ok(cwd) => resolve(&cwd, &self.root),
            Err(_) => self.root.clone(),
        }
    }

    pub fn source_dir_path(&self) -> PathBuf {
        resolve(&self.root_dir(), &self.source_dir)
    }

    pub fn out_dir_path(&self) -> PathBuf {
        resolve(&self.root_dir(), &self.out_dir)
    }

    pub fn tsconfig_path(&self) -> PathBuf {
        resolve(&self.root_dir(), &self.tsconfig)
    }

    /// Directory the compiled form of `file` is written to.
    ///
    /// `src/pages/home.ts` with the defaults lands in `dist/pages`.
    pub fn output_dir_for(&self, file: &Path) -> PathBuf {
        let rel = relative(&self.source_dir_path(), file);
        let output_path = resolve(&self.out_dir_path(), rel);
        output_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or(output_path)
    }

    /// Bare alias targets are module ids only when `resolve.alias` is set.
    pub fn module_id_alias_support(&self) -> bool {
        !self.resolve.alias.is_empty()
    }

    pub fn alias_table(&self) -> AliasTable {
        AliasTable::from_config(&self.resolve.alias, &self.alias, &self.root_dir())
    }

    pub fn output_extension(&self) -> OutputExtension {
        OutputExtension::detect(self.format, &self.root_dir(), self.auto_extension)
    }

    pub fn css_module_detector(&self) -> ConfigResult<AutoModulesDetector> {
        AutoModulesDetector::new(&self.style.auto_modules)
    }
}

/// File-based configuration discovery
///
/// # Example
///
/// ```no_run
/// use fob_redirect::ConfigDiscovery;
///
/// let config = ConfigDiscovery::new(".").load().unwrap();
/// ```
pub struct ConfigDiscovery {
    root: PathBuf,
}

impl ConfigDiscovery {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Find a config file in the root directory
    ///
    /// Searches in this order:
    /// 1. TOML config: fob-redirect.toml
    /// 2. package.json (redirect field)
    pub fn find(&self) -> Option<PathBuf> {
        let toml_path = self.root.join("fob-redirect.toml");
        if toml_path.exists() {
            return Some(toml_path);
        }

        let pkg_path = self.root.join("package.json");
        let content = fs::read_to_string(&pkg_path).ok()?;
        let parsed = serde_json::from_str::<Value>(&content).ok()?;
        match parsed.get("redirect") {
            Some(field) if !field.is_null() => Some(pkg_path),
            _ => None,
        }
    }

    /// Load config from the discovered file.
    ///
    /// A relative `root` in the file resolves against the discovery root.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if no config file is found.
    pub fn load(&self) -> ConfigResult<BuildConfig> {
        let path = self.find().ok_or(ConfigError::NotFound)?;
        let mut config = self.load_from(&path)?;
        config.root = resolve(&self.root, &config.root);
        tracing::debug!(path = %path.display(), root = %config.root.display(), "Loaded redirect config");
        Ok(config)
    }

    fn load_from(&self, path: &Path) -> ConfigResult<BuildConfig> {
        if path.file_name() == Some(std::ffi::OsStr::new("package.json")) {
            return self.load_from_package_json(path);
        }

        let content = fs::read_to_string(path)?;

        let toml_val: toml::Value =
            toml::from_str(&content).map_err(|e| ConfigError::InvalidValue {
                field: "toml".to_string(),
                hint: Some(format!("Invalid TOML syntax: {}", e)),
            })?;

        let value = serde_json::to_value(toml_val).map_err(|e| ConfigError::InvalidValue {
            field: "toml".to_string(),
            hint: Some(format!("TOML to JSON conversion failed: {}", e)),
        })?;

        BuildConfig::from_value(value)
    }

    fn load_from_package_json(&self, path: &Path) -> ConfigResult<BuildConfig> {
        let content = fs::read_to_string(path)?;

        let mut parsed: Value =
            serde_json::from_str(&content).map_err(|e| ConfigError::InvalidValue {
                field: "package.json".to_string(),
                hint: Some(format!("Invalid JSON: {}", e)),
            })?;

        let value = parsed
            .get_mut("redirect")
            .map(Value::take)
            .filter(|v| !v.is_null())
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "redirect".to_string(),
                hint: Some("Add a 'redirect' field to your package.json".to_string()),
            })?;

        BuildConfig::from_value(value)
    }
}
