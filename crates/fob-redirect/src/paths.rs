//! Path helpers with Node.js `path` semantics.
//!
//! Specifiers are strings, not filesystem paths: they may carry query
//! strings, use `/` on every platform and start with `./`. These helpers
//! operate on the string form where that matters and fall back to
//! [`std::path`] plus [`path_clean`] for real filesystem arithmetic.

use path_clean::PathClean;
use std::path::{Component, Path, PathBuf};

/// Extension of the last path segment, including the leading dot.
///
/// Mirrors Node's `path.extname`: a leading dot does not start an
/// extension (`.env` has none) and everything after the last dot counts,
/// query strings included (`a.css?inline` → `.css?inline`).
pub fn extname(specifier: &str) -> &str {
    let segment = specifier.rsplit('/').next().unwrap_or(specifier);
    if segment == "." || segment == ".." {
        return "";
    }
    match segment.rfind('.') {
        Some(0) | None => "",
        Some(idx) => &segment[idx..],
    }
}

/// Last path segment with `ext` removed from its end when present.
pub fn basename_without_ext<'a>(specifier: &'a str, ext: &str) -> &'a str {
    let segment = specifier.rsplit('/').next().unwrap_or(specifier);
    if !ext.is_empty() && segment.len() > ext.len() {
        segment.strip_suffix(ext).unwrap_or(segment)
    } else {
        segment
    }
}

/// `specifier` with a trailing `ext` removed.
///
/// Leaves the specifier alone when it does not end with `ext`.
pub fn trim_extension<'a>(specifier: &'a str, ext: &str) -> &'a str {
    specifier.strip_suffix(ext).unwrap_or(specifier)
}

/// Replace Windows separators with forward slashes.
pub fn normalize_slashes(path: &str) -> String {
    path.replace('\\', "/")
}

/// Render a path as a forward-slash string.
pub fn to_slash(path: &Path) -> String {
    normalize_slashes(&path.to_string_lossy())
}

/// Resolve `path` against `base` and remove `.`/`..` components.
///
/// Absolute inputs ignore `base`, like Node's `path.resolve`.
pub fn resolve(base: &Path, path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if path.is_absolute() {
        path.to_path_buf().clean()
    } else {
        base.join(path).clean()
    }
}

/// Join and normalize, like Node's `path.join`.
pub fn join(base: impl AsRef<Path>, rest: &str) -> PathBuf {
    base.as_ref().join(rest).clean()
}

/// Relative path from directory `from` to `to`.
///
/// Both inputs are cleaned first. Returns an empty path when they are the
/// same location.
pub fn relative(from: &Path, to: &Path) -> PathBuf {
    let from = from.to_path_buf().clean();
    let to = to.to_path_buf().clean();

    let from_parts: Vec<Component<'_>> = from.components().collect();
    let to_parts: Vec<Component<'_>> = to.components().collect();

    let common = from_parts
        .iter()
        .zip(to_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut result = PathBuf::new();
    for part in &from_parts[common..] {
        if !matches!(part, Component::CurDir) {
            result.push("..");
        }
    }
    for part in &to_parts[common..] {
        result.push(part.as_os_str());
    }
    result
}

/// Relative import specifier from `from_dir` to `target`.
///
/// Always uses forward slashes and is prefixed with `./` unless it
/// already climbs out with `..`.
pub fn relative_specifier(from_dir: &Path, target: &Path) -> String {
    let rel = to_slash(&relative(from_dir, target));
    if rel.starts_with("..") {
        rel
    } else {
        format!("./{}", rel)
    }
}
