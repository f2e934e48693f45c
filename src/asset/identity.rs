//! Asset identities.
//!
//! An identity is the pair `(local path, content hash)` rendered as
//! `"<local path>/<content hash>"`. The hash is hex and never contains `/`,
//! so the last `/` always separates the two parts.

use std::fmt;
use std::io;
use std::path::Path;

use crate::freshness::hash_file;
use crate::utils::path::to_slash_relative;

/// Content identity of one asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    /// Root-relative path with `/` separators (e.g. `public/app.js`).
    pub path: String,
    /// Hex content hash.
    pub hash: String,
}

impl Identity {
    /// Hash `file` now and pair it with its root-relative path.
    pub fn of_file(file: &Path, root: &Path) -> io::Result<Self> {
        let hash = hash_file(file)?;
        Ok(Self {
            path: to_slash_relative(file, root),
            hash: hash.to_hex(),
        })
    }

    /// Path component of a manifest key, without allocating.
    pub fn path_of(key: &str) -> Option<&str> {
        key.rsplit_once('/')
            .map(|(path, _)| path)
            .filter(|p| !p.is_empty())
    }

    /// Manifest key form.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.path, self.hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_of_file_is_root_relative() {
        let dir = TempDir::new().unwrap();
        let public = dir.path().join("public");
        fs::create_dir_all(&public).unwrap();
        fs::write(public.join("app.js"), "a").unwrap();

        let id = Identity::of_file(&public.join("app.js"), dir.path()).unwrap();
        assert_eq!(id.path, "public/app.js");
        assert_eq!(id.hash.len(), 64);
        assert!(id.key().starts_with("public/app.js/"));
    }

    #[test]
    fn test_path_of() {
        assert_eq!(Identity::path_of("public/app.js/ff"), Some("public/app.js"));
        assert_eq!(
            Identity::path_of("public/page-data/a/page-data.json/abc123"),
            Some("public/page-data/a/page-data.json")
        );
        assert_eq!(Identity::path_of("bare"), None);
        assert_eq!(Identity::path_of("/hash-only"), None);
    }

    #[test]
    fn test_identity_changes_with_content() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.json");
        fs::write(&file, "{}").unwrap();
        let before = Identity::of_file(&file, dir.path()).unwrap();
        fs::write(&file, "[]").unwrap();
        let after = Identity::of_file(&file, dir.path()).unwrap();

        assert_eq!(before.path, after.path);
        assert_ne!(before, after);
    }
}
