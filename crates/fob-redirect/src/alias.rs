//! Alias tables and alias-based specifier resolution.
//!
//! An alias maps a short key (`@`, `@components`, `lodash`) to a target
//! path or module id. A specifier matches a key either exactly or as a
//! `key/` prefix. Entries are tried in insertion order and the first
//! match wins, so `{"@a": "/x", "@a/b": "/y"}` resolves `@a/b/c` to
//! `/x/b/c`.

use crate::path_kind::PathKind;
use crate::paths::{join, relative_specifier, resolve, to_slash};
use crate::tsconfig::MatchPath;
use indexmap::IndexMap;
use std::path::Path;

/// Extensions offered to the tsconfig path matcher when probing candidates.
pub const TSCONFIG_EXTENSIONS: &[&str] = &[".ts", ".tsx", ".js", ".jsx"];

/// Ordered alias → target mapping, built once per file.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    entries: IndexMap<String, String>,
    module_id_alias_support: bool,
}

impl AliasTable {
    /// Create a table from already-absolutized entries.
    ///
    /// Trailing slashes are trimmed from keys.
    pub fn new(
        entries: impl IntoIterator<Item = (String, String)>,
        module_id_alias_support: bool,
    ) -> Self {
        let entries = entries
            .into_iter()
            .map(|(key, target)| {
                let key = key.trim_end_matches('/').to_string();
                (key, target)
            })
            .collect();
        Self {
            entries,
            module_id_alias_support,
        }
    }

    /// Merge configured aliases and absolutize relative targets.
    ///
    /// `resolve_alias` wins when it has any entries; otherwise the legacy
    /// `alias` map is used. Module-id classification is enabled only by
    /// `resolve_alias`. Targets that classify as relative are resolved
    /// against `root`.
    pub fn from_config(
        resolve_alias: &IndexMap<String, String>,
        legacy_alias: &IndexMap<String, String>,
        root: &Path,
    ) -> Self {
        let module_id_alias_support = !resolve_alias.is_empty();
        let source = if module_id_alias_support {
            resolve_alias
        } else {
            legacy_alias
        };

        let entries = source.iter().map(|(key, target)| {
            let target = match PathKind::classify(target, module_id_alias_support) {
                PathKind::Relative => to_slash(&resolve(root, target)),
                PathKind::Absolute | PathKind::ModuleId => target.clone(),
            };
            (key.clone(), target)
        });

        Self::new(entries, module_id_alias_support)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn module_id_alias_support(&self) -> bool {
        self.module_id_alias_support
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Find the alias target for `name`.
    ///
    /// The tsconfig matcher is consulted first; a matching alias entry
    /// overrides its answer.
    pub fn lookup(&self, name: &str, match_path: Option<&dyn MatchPath>) -> Option<String> {
        let mut candidate = match_path
            .and_then(|matcher| matcher.match_path(name, TSCONFIG_EXTENSIONS))
            .map(|path| to_slash(&path));

        for (key, target) in self.iter() {
            if let Some(rest) = name.strip_prefix(key).and_then(|r| r.strip_prefix('/')) {
                candidate = Some(to_slash(&join(target, rest)));
                break;
            }
            if name == key {
                candidate = Some(target.to_string());
                break;
            }
        }

        candidate
    }

    /// Resolve `name` through the table into the specifier that should
    /// replace it, as seen from `file_path`.
    ///
    /// Module-id targets are used verbatim. Path targets become a
    /// forward-slash path relative to the importing file's directory.
    /// Returns `None` when nothing matches.
    pub fn redirect(
        &self,
        name: &str,
        file_path: &Path,
        match_path: Option<&dyn MatchPath>,
    ) -> Option<String> {
        let candidate = self.lookup(name, match_path)?;
        match PathKind::classify(&candidate, self.module_id_alias_support) {
            PathKind::ModuleId => Some(candidate),
            PathKind::Absolute | PathKind::Relative => {
                let from_dir = file_path.parent().unwrap_or_else(|| Path::new(""));
                Some(relative_specifier(from_dir, Path::new(&candidate)))
            }
        }
    }
}
