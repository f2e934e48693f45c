//! `[manifest]` section configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Fingerprint manifest location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestConfig {
    /// Manifest file, relative to the project root.
    pub path: PathBuf,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            path: "upload.manifest.json".into(),
        }
    }
}
