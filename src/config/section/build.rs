//! `[build]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [build]
//! public_dir = "public"
//! app = "app.js"
//! runtime = "webpack-runtime.js"
//! extensions = ["js", "css", "json"]
//! exclude = ["~partytown"]
//! ```

use crate::config::{ConfigDiagnostics, FieldPath};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Build output layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Directory the host build tool writes its output to.
    pub public_dir: PathBuf,

    /// Application shell, relative to `public_dir`.
    pub app: String,

    /// Module-loading runtime, relative to `public_dir`.
    pub runtime: String,

    /// Extensions of uploadable assets (without the dot).
    pub extensions: Vec<String>,

    /// Directory names excluded from discovery wherever they appear.
    pub exclude: Vec<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            public_dir: "public".into(),
            app: "app.js".into(),
            runtime: "webpack-runtime.js".into(),
            extensions: vec!["js".into(), "css".into(), "json".into()],
            exclude: vec!["~partytown".into()],
        }
    }
}

impl BuildConfig {
    pub const PUBLIC_DIR: FieldPath = FieldPath::new("build.public_dir");
    pub const APP: FieldPath = FieldPath::new("build.app");
    pub const RUNTIME: FieldPath = FieldPath::new("build.runtime");
    pub const EXTENSIONS: FieldPath = FieldPath::new("build.extensions");

    /// Absolute path of the application shell.
    pub fn app_path(&self) -> PathBuf {
        self.public_dir.join(&self.app)
    }

    /// Absolute path of the module-loading runtime.
    pub fn runtime_path(&self) -> PathBuf {
        self.public_dir.join(&self.runtime)
    }

    /// Whether `path` is one of the two bootstrap files.
    pub fn is_bootstrap(&self, path: &Path) -> bool {
        path == self.app_path() || path == self.runtime_path()
    }

    /// Validate layout settings (paths must already be resolved).
    ///
    /// Bootstrap files are only required when they are going to be rewritten.
    pub fn validate(&self, diag: &mut ConfigDiagnostics, require_bootstrap: bool) {
        if self.extensions.is_empty() {
            diag.error(Self::EXTENSIONS, "at least one asset extension is required");
        }

        if !self.public_dir.is_dir() {
            diag.error_with_hint(
                Self::PUBLIC_DIR,
                format!("directory not found: {}", self.public_dir.display()),
                "run the site build first, or point build.public_dir at its output",
            );
            return;
        }

        if !require_bootstrap {
            return;
        }

        for (field, path) in [(Self::APP, self.app_path()), (Self::RUNTIME, self.runtime_path())] {
            if !path.is_file() {
                diag.error_with_hint(
                    field,
                    format!("bootstrap file not found: {}", path.display()),
                    "configure the bundler to emit stable `[name].js` filenames without content hashes",
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = BuildConfig::default();
        assert_eq!(config.public_dir, PathBuf::from("public"));
        assert_eq!(config.extensions, ["js", "css", "json"]);
        assert!(config.is_bootstrap(Path::new("public/app.js")));
        assert!(!config.is_bootstrap(Path::new("public/framework.js")));
    }

    #[test]
    fn test_validate_missing_bootstrap() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("app.js"), "").unwrap();

        let config = BuildConfig {
            public_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let mut diag = ConfigDiagnostics::new();
        config.validate(&mut diag, true);

        assert_eq!(diag.errors().len(), 1);
        assert_eq!(diag.errors()[0].field, BuildConfig::RUNTIME);

        let mut diag = ConfigDiagnostics::new();
        config.validate(&mut diag, false);
        assert!(diag.errors().is_empty());
    }
}
