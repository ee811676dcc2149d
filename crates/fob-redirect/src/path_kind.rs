//! Classification of specifier strings.

use std::path::Path;

/// How a specifier (or an alias target) addresses its module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathKind {
    /// Absolute filesystem path
    Absolute,
    /// Path relative to some directory (`./x`, `../x`, or a bare name when
    /// module-id aliases are unsupported)
    Relative,
    /// Bare package-style name (`react`, `@scope/pkg/sub`)
    ModuleId,
}

impl PathKind {
    /// Classify `path`.
    ///
    /// `module_id_alias_support` is true only when the build configures at
    /// least one resolve alias; without it every non-absolute path is
    /// treated as relative.
    pub fn classify(path: &str, module_id_alias_support: bool) -> Self {
        if Path::new(path).is_absolute() {
            PathKind::Absolute
        } else if !path.starts_with('.') && module_id_alias_support {
            PathKind::ModuleId
        } else {
            PathKind::Relative
        }
    }
}
