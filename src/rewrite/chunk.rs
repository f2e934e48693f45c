//! Short-key views over the fingerprint store.
//!
//! Rewriting works with keys as they appear inside the build output
//! (`/app.js`, `/page-data/index/page-data.json`), not with manifest
//! identities (`public/app.js/<hash>`).

use std::collections::BTreeMap;

use crate::asset::Identity;
use crate::manifest::FingerprintStore;

/// Suffix shared by all per-page data files.
const PAGE_DATA_SUFFIX: &str = "/page-data.json";
/// Directory holding page data.
const PAGE_DATA_DIR: &str = "/page-data";
/// Prefix of shared data fragments.
pub const FRAGMENT_PREFIX: &str = "/page-data/sq/d/";

/// `short key → remote location`, derived from the store in use at a stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkMap {
    entries: BTreeMap<String, String>,
}

impl ChunkMap {
    /// Build from a store whose identities live under `public_prefix`
    /// (the build output directory, root-relative with `/` separators).
    pub fn from_store(store: &FingerprintStore, public_prefix: &str) -> Self {
        let entries = store
            .iter()
            .filter_map(|(key, location)| {
                let path = Identity::path_of(key)?;
                Some((short_key(path, public_prefix), location.to_string()))
            })
            .collect();
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `page pathname → location` for every per-page data file.
    ///
    /// `/page-data/blog/page-data.json` becomes `/blog`, and the root page's
    /// `/page-data/index/page-data.json` becomes `/index`.
    pub fn page_data_table(&self) -> BTreeMap<&str, &str> {
        self.iter()
            .filter_map(|(key, location)| {
                let page = key.strip_suffix(PAGE_DATA_SUFFIX)?;
                let page = page.strip_prefix(PAGE_DATA_DIR).unwrap_or(page);
                (!page.is_empty()).then_some((page, location))
            })
            .collect()
    }

    /// `fragment key → location` for shared data fragments, keyed by the full
    /// short key (`/page-data/sq/d/123.json`).
    pub fn fragment_table(&self) -> BTreeMap<&str, &str> {
        self.iter()
            .filter(|(key, _)| key.starts_with(FRAGMENT_PREFIX))
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ChunkMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// `public/app.js` under prefix `public` → `/app.js`.
fn short_key(path: &str, public_prefix: &str) -> String {
    let rest = path
        .strip_prefix(public_prefix)
        .filter(|rest| rest.starts_with('/'))
        .unwrap_or(path);
    if rest.starts_with('/') {
        rest.to_string()
    } else {
        format!("/{rest}")
    }
}
