//! Path normalization utilities.

use std::path::{Component, Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to returning absolute paths as-is and joining relative ones
/// with the current directory.
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Render `path` relative to `root` with `/` separators.
///
/// Manifest keys use this form so they stay valid when the project is
/// checked out somewhere else. Paths outside `root` are rendered whole.
pub fn to_slash_relative(path: &Path, root: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let parts: Vec<_> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect();
    parts.join("/")
}

/// Whether any component of `path` equals `name`.
pub fn has_component(path: &Path, name: &str) -> bool {
    path.components()
        .any(|c| matches!(c, Component::Normal(s) if s == name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_relative() {
        let normalized = normalize_path(Path::new("relative/path/file.txt"));
        assert!(normalized.is_absolute());
    }

    #[test]
    fn test_to_slash_relative() {
        let root = Path::new("/site");
        assert_eq!(
            to_slash_relative(Path::new("/site/public/app.js"), root),
            "public/app.js"
        );
        assert_eq!(
            to_slash_relative(Path::new("/site/public/page-data/a/page-data.json"), root),
            "public/page-data/a/page-data.json"
        );
    }

    #[test]
    fn test_has_component() {
        let path = Path::new("/site/public/~partytown/debug/x.js");
        assert!(has_component(path, "~partytown"));
        assert!(!has_component(path, "partytown"));
        assert!(has_component(Path::new("public/page-data/404.html"), "page-data"));
    }
}
