//! Persisted fingerprint table.
//!
//! On disk the manifest is a flat JSON object:
//!
//! ```json
//! { "public/app.js/<hash>": "https://cdn.example.com/app.3f9a.js" }
//! ```
//!
//! Keys are written sorted so successive manifests diff cleanly.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::asset::Identity;
use crate::utils::fs::{read_optional, write_atomic};

/// Manifest read/write errors.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("IO error on manifest `{0}`")]
    Io(PathBuf, #[source] io::Error),

    #[error("manifest `{0}` is not a JSON object of strings")]
    Parse(PathBuf, #[source] serde_json::Error),
}

/// `identity → remote location` mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FingerprintStore {
    entries: BTreeMap<String, String>,
}

impl FingerprintStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the manifest; a missing or blank file is an empty store.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = read_optional(path).map_err(|e| ManifestError::Io(path.to_path_buf(), e))?;
        match content {
            Some(text) if !text.trim().is_empty() => {
                serde_json::from_str(&text).map_err(|e| ManifestError::Parse(path.to_path_buf(), e))
            }
            _ => Ok(Self::new()),
        }
    }

    /// Write the manifest (temp file + rename).
    pub fn save(&self, path: &Path) -> Result<(), ManifestError> {
        let mut json = serde_json::to_string_pretty(self)
            .map_err(|e| ManifestError::Parse(path.to_path_buf(), e))?;
        json.push('\n');
        write_atomic(path, json.as_bytes()).map_err(|e| ManifestError::Io(path.to_path_buf(), e))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, location: impl Into<String>) {
        self.entries.insert(key.into(), location.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Merge `other` into `self`; entries of `other` win on equal keys.
    pub fn merge(&mut self, other: Self) {
        self.entries.extend(other.entries);
    }

    /// Remove every entry whose key's path component is in `paths`.
    ///
    /// Matching is exact on the path component, so purging `public/a.js`
    /// leaves `public/a.js.map/...` and `public/x/a.js/...` alone.
    pub fn purge_paths(&mut self, paths: &FxHashSet<&str>) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|key, _| !Identity::path_of(key).is_some_and(|p| paths.contains(p)));
        before - self.entries.len()
    }

    /// Keep only entries whose key is in `keys`. Returns the number removed.
    pub fn retain_keys(&mut self, keys: &FxHashSet<String>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| keys.contains(key));
        before - self.entries.len()
    }

    /// Number of entries whose path component equals `path`.
    #[cfg(test)]
    pub fn count_path(&self, path: &str) -> usize {
        self.entries
            .keys()
            .filter(|key| Identity::path_of(key) == Some(path))
            .count()
    }
}

impl FromIterator<(String, String)> for FingerprintStore {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
