//! tsconfig.json `paths` support.
//!
//! [`TsconfigPaths`] answers "which file does this specifier map to" for
//! the `compilerOptions.paths` / `baseUrl` pair of a tsconfig, probing the
//! filesystem the way `tsconfig-paths` does:
//!
//! 1. the substituted path itself, if it is a file
//! 2. the substituted path plus each extension (returned without the extension)
//! 3. `index` plus each extension inside it (returned as the directory)
//!
//! Relative and absolute specifiers never match. `extends` chains and
//! package.json `main` fields are not followed.
//!
//! Probe results are cached for the lifetime of the matcher, so each
//! candidate file is stat'ed once per build.

use crate::error::{RedirectError, Result};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Maps a specifier to an absolute path, if some configured pattern
/// matches and the target exists.
pub trait MatchPath: Send + Sync + std::fmt::Debug {
    fn match_path(&self, specifier: &str, extensions: &[&str]) -> Option<PathBuf>;
}

#[derive(Debug, Clone)]
struct PathPattern {
    pattern: String,
    substitutions: Vec<String>,
}

impl PathPattern {
    fn prefix_len(&self) -> usize {
        self.pattern.find('*').unwrap_or(self.pattern.len())
    }

    /// Text captured by `*`, or `""` for an exact pattern match.
    fn capture<'s>(&self, specifier: &'s str) -> Option<&'s str> {
        if self.pattern == specifier {
            return Some("");
        }
        let (prefix, suffix) = self.pattern.split_once('*')?;
        if specifier.len() >= prefix.len() + suffix.len()
            && specifier.starts_with(prefix)
            && specifier.ends_with(suffix)
        {
            Some(&specifier[prefix.len()..specifier.len() - suffix.len()])
        } else {
            None
        }
    }
}

/// Compiled `paths` mapping rooted at an absolute base URL.
#[derive(Debug, Clone)]
pub struct TsconfigPaths {
    base_url: PathBuf,
    patterns: Vec<PathPattern>,
    /// path → is a file
    probes: Arc<RwLock<FxHashMap<PathBuf, bool>>>,
}

impl TsconfigPaths {
    /// Build a matcher.
    ///
    /// Patterns are tried longest-prefix first. `add_match_all` appends a
    /// `*` → `*` pattern, which tsconfig implies whenever `baseUrl` is set.
    pub fn new(
        base_url: impl Into<PathBuf>,
        paths: impl IntoIterator<Item = (String, Vec<String>)>,
        add_match_all: bool,
    ) -> Self {
        let mut patterns: Vec<PathPattern> = paths
            .into_iter()
            .map(|(pattern, substitutions)| PathPattern {
                pattern,
                substitutions,
            })
            .collect();

        if add_match_all && !patterns.iter().any(|p| p.pattern == "*") {
            patterns.push(PathPattern {
                pattern: "*".to_string(),
                substitutions: vec!["*".to_string()],
            });
        }

        patterns.sort_by_key(|p| std::cmp::Reverse(p.prefix_len()));

        Self {
            base_url: base_url.into(),
            patterns,
            probes: Arc::new(RwLock::new(FxHashMap::default())),
        }
    }

    /// Load `compilerOptions.baseUrl` and `compilerOptions.paths` from a tsconfig file.
    ///
    /// Returns `Ok(None)` when the file does not configure any path mapping.
    pub fn load(tsconfig_path: &Path) -> Result<Option<Self>> {
        let content =
            std::fs::read_to_string(tsconfig_path).map_err(|e| RedirectError::Tsconfig {
                path: tsconfig_path.to_path_buf(),
                reason: e.to_string(),
            })?;
        Self::parse(tsconfig_path, &content)
    }

    /// Parse tsconfig `content` as if it was read from `tsconfig_path`.
    pub fn parse(tsconfig_path: &Path, content: &str) -> Result<Option<Self>> {
        let invalid = |reason: String| RedirectError::Tsconfig {
            path: tsconfig_path.to_path_buf(),
            reason,
        };

        let value: serde_json::Value = serde_json::from_str(&strip_jsonc(content))
            .map_err(|e| invalid(format!("invalid JSON: {}", e)))?;

        let Some(compiler) = value.get("compilerOptions") else {
            return Ok(None);
        };

        let tsconfig_dir = tsconfig_path.parent().unwrap_or_else(|| Path::new("."));
        let base_url = compiler.get("baseUrl").and_then(serde_json::Value::as_str);
        let paths = compiler.get("paths").and_then(serde_json::Value::as_object);

        if base_url.is_none() && paths.is_none() {
            return Ok(None);
        }

        let absolute_base_url = crate::paths::resolve(tsconfig_dir, base_url.unwrap_or("."));

        let mut mappings = Vec::new();
        for (pattern, targets) in paths.into_iter().flatten() {
            let targets = targets
                .as_array()
                .ok_or_else(|| invalid(format!("paths['{}'] must be an array", pattern)))?;
            let substitutions = targets
                .iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect();
            mappings.push((pattern.clone(), substitutions));
        }

        Ok(Some(Self::new(
            absolute_base_url,
            mappings,
            base_url.is_some(),
        )))
    }

    pub fn base_url(&self) -> &Path {
        &self.base_url
    }

    fn is_file(&self, path: PathBuf) -> bool {
        if let Some(&cached) = self.probes.read().get(&path) {
            return cached;
        }
        let found = path.is_file();
        self.probes.write().insert(path, found);
        found
    }

    fn probe(&self, base: &Path, extensions: &[&str]) -> Option<PathBuf> {
        if self.is_file(base.to_path_buf()) {
            return Some(base.to_path_buf());
        }
        let as_str = base.to_string_lossy();
        for ext in extensions {
            if self.is_file(PathBuf::from(format!("{}{}", as_str, ext))) {
                return Some(base.to_path_buf());
            }
        }
        for ext in extensions {
            if self.is_file(base.join(format!("index{}", ext))) {
                return Some(base.to_path_buf());
            }
        }
        None
    }
}

impl MatchPath for TsconfigPaths {
    fn match_path(&self, specifier: &str, extensions: &[&str]) -> Option<PathBuf> {
        if specifier.starts_with('.') || Path::new(specifier).is_absolute() {
            return None;
        }
        for pattern in &self.patterns {
            let Some(captured) = pattern.capture(specifier) else {
                continue;
            };
            for substitution in &pattern.substitutions {
                let physical = self.base_url.join(substitution.replacen('*', captured, 1));
                if let Some(found) = self.probe(&physical, extensions) {
                    return Some(found);
                }
            }
        }
        None
    }
}

/// Strip `//` and `/* */` comments and trailing commas, leaving strings intact.
fn strip_jsonc(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                out.push('"');
                while let Some(c) = chars.next() {
                    out.push(c);
                    if c == '\\' {
                        if let Some(escaped) = chars.next() {
                            out.push(escaped);
                        }
                    } else if c == '"' {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'/') => {
                while let Some(&c) = chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
            }
            _ => out.push(ch),
        }
    }

    remove_trailing_commas(&out)
}

fn remove_trailing_commas(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_string = false;
    let mut escaped = false;
    let chars: Vec<char> = input.chars().collect();

    for (i, &ch) in chars.iter().enumerate() {
        if in_string {
            out.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        if ch == '"' {
            in_string = true;
        } else if ch == ',' {
            let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
            if matches!(next, Some('}') | Some(']')) {
                continue;
            }
        }
        out.push(ch);
    }
    out
}
