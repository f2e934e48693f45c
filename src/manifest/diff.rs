//! Diff engine: partition discovered assets into "already uploaded" and
//! "must upload" against the fingerprint store.

use std::io;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use rustc_hash::FxHashSet;

use super::FingerprintStore;
use crate::asset::Identity;

/// Outcome of comparing the build output with the manifest.
#[derive(Debug, Default)]
pub struct DiffResult {
    /// Prior entries still valid, with superseded versions of changed paths removed.
    pub retained: FingerprintStore,
    /// Files whose content differs from the last recorded deploy, in input order.
    pub to_upload: Vec<PathBuf>,
}

/// Compare `assets` (absolute paths under `root`) against `store`.
///
/// On a cold store every asset is returned for upload and nothing is
/// retained. Otherwise an asset is uploaded iff its identity is absent from
/// the store, and all store entries for the paths being uploaded are purged
/// from the retained table so each path ends up with at most one entry.
pub fn diff_assets(
    assets: &[PathBuf],
    root: &Path,
    store: &FingerprintStore,
) -> io::Result<DiffResult> {
    if store.is_empty() {
        return Ok(DiffResult {
            retained: FingerprintStore::new(),
            to_upload: assets.to_vec(),
        });
    }

    let identities = assets
        .par_iter()
        .map(|path| Identity::of_file(path, root))
        .collect::<io::Result<Vec<_>>>()?;

    let mut to_upload = Vec::new();
    let mut changed: FxHashSet<&str> = FxHashSet::default();
    for (path, identity) in assets.iter().zip(&identities) {
        if !store.contains(&identity.key()) {
            to_upload.push(path.clone());
            changed.insert(identity.path.as_str());
        }
    }

    let mut retained = store.clone();
    let purged = retained.purge_paths(&changed);
    crate::debug!("diff"; "purged {} superseded manifest entries", purged);

    Ok(DiffResult {
        retained,
        to_upload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        assets: Vec<PathBuf>,
    }

    impl Fixture {
        fn new(files: &[(&str, &str)]) -> Self {
            let dir = TempDir::new().unwrap();
            let mut assets = Vec::new();
            for (rel, content) in files {
                let path = dir.path().join(rel);
                fs::create_dir_all(path.parent().unwrap()).unwrap();
                fs::write(&path, content).unwrap();
                assets.push(path);
            }
            Self { dir, assets }
        }

        fn root(&self) -> &Path {
            self.dir.path()
        }

        /// Simulate a completed deploy: every asset recorded under its current identity.
        fn deployed_store(&self) -> FingerprintStore {
            self.assets
                .iter()
                .map(|p| {
                    let id = Identity::of_file(p, self.root()).unwrap();
                    (id.key(), format!("https://cdn/{}", id.hash))
                })
                .collect()
        }
    }

    #[test]
    fn test_cold_cache_uploads_everything() {
        let fx = Fixture::new(&[("public/app.js", "a"), ("public/styles.css", "b")]);
        let result = diff_assets(&fx.assets, fx.root(), &FingerprintStore::new()).unwrap();

        assert_eq!(result.to_upload, fx.assets);
        assert!(result.retained.is_empty());
    }

    #[test]
    fn test_unchanged_set_is_idempotent() {
        let fx = Fixture::new(&[("public/app.js", "a"), ("public/styles.css", "b")]);
        let store = fx.deployed_store();

        let first = diff_assets(&fx.assets, fx.root(), &store).unwrap();
        let second = diff_assets(&fx.assets, fx.root(), &first.retained).unwrap();

        assert!(first.to_upload.is_empty());
        assert!(second.to_upload.is_empty());
        assert_eq!(second.retained, store);
    }

    #[test]
    fn test_single_byte_change_reappears() {
        let fx = Fixture::new(&[
            ("public/app.js", "a"),
            ("public/styles.css", "body{}"),
            ("public/page-data/index/page-data.json", "{}"),
        ]);
        let store = fx.deployed_store();

        fs::write(&fx.assets[1], "body{ }").unwrap();
        let result = diff_assets(&fx.assets, fx.root(), &store).unwrap();

        assert_eq!(result.to_upload, vec![fx.assets[1].clone()]);
        assert_eq!(result.retained.len(), 2);
    }

    #[test]
    fn test_changed_path_keeps_at_most_one_entry() {
        let fx = Fixture::new(&[("public/app.js", "v1"), ("public/framework.js", "f")]);
        let mut store = fx.deployed_store();

        fs::write(&fx.assets[0], "v2").unwrap();
        let result = diff_assets(&fx.assets, fx.root(), &store).unwrap();
        assert_eq!(result.retained.count_path("public/app.js"), 0);

        // Re-upload merges exactly one fresh entry for the path
        store = result.retained;
        let fresh = Identity::of_file(&fx.assets[0], fx.root()).unwrap();
        store.insert(fresh.key(), "https://cdn/app.v2.js");
        assert_eq!(store.count_path("public/app.js"), 1);
        assert_eq!(store.count_path("public/framework.js"), 1);
    }

    #[test]
    fn test_orphaned_entries_are_retained() {
        let fx = Fixture::new(&[("public/app.js", "a")]);
        let mut store = fx.deployed_store();
        store.insert("public/removed.js/abc", "https://cdn/removed.js");

        let result = diff_assets(&fx.assets, fx.root(), &store).unwrap();
        assert!(result.to_upload.is_empty());
        assert!(result.retained.contains("public/removed.js/abc"));
    }

    #[test]
    fn test_unreadable_asset_is_error() {
        let fx = Fixture::new(&[("public/app.js", "a")]);
        let store = fx.deployed_store();
        let missing = vec![fx.root().join("public/vanished.js")];

        assert!(diff_assets(&missing, fx.root(), &store).is_err());
    }
}
