//! Deploy orchestration.
//!
//! Stages run strictly in order on one task:
//!
//! ```text
//! scan -> diff -> upload (assets) -> rewrite (shell, runtime)
//!      -> upload (shell, runtime) -> rewrite (html) -> manifest
//! ```
//!
//! The fingerprint store is owned here and only changes between stages. Any
//! fatal error returns before the manifest is written, so a failed run
//! leaves the previous manifest in place.


use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;
use rustc_hash::FxHashSet;

use crate::{
    asset::{Identity, scan_output},
    config::Config,
    log,
    manifest::{FingerprintStore, diff_assets},
    rewrite::{
        ChunkMap, HtmlSummary, rewrite_bootstrap, rewrite_documents, rewrite_in_place,
        rewrite_runtime,
    },
    upload::{Uploader, upload_all},
    utils::{path::to_slash_relative, plural_count},
};

/// Counts reported after a successful deploy.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeployReport {
    /// Assets uploaded in the first pass.
    pub uploaded: usize,
    /// Assets whose previous upload was reused.
    pub reused: usize,
    pub html: HtmlSummary,
    /// Entries in the written manifest.
    pub manifest_entries: usize,
}

/// Run the full deploy pipeline with `uploader`.
pub async fn deploy<U: Uploader>(config: &Config, uploader: &U) -> Result<DeployReport> {
    let root = config.get_root();
    let build = &config.build;
    let retries = config.upload.retries;

    let output = scan_output(build);
    crate::debug!("scan"; "{} and {}",
        plural_count(output.assets.len(), "asset"),
        plural_count(output.documents.len(), "document"));

    let store = FingerprintStore::load(&config.manifest.path)?;
    let diff = diff_assets(&output.assets, root, &store).context("failed to hash build output")?;
    let reused = output.assets.len() - diff.to_upload.len();
    log!("diff"; "{} changed, {} unchanged",
        plural_count(diff.to_upload.len(), "asset"), reused);

    // Assets first: the bootstrap files are rewritten against their locations
    let assets: Vec<PathBuf> = diff
        .to_upload
        .into_iter()
        .filter(|path| !build.is_bootstrap(path))
        .collect();
    let uploaded = upload_all(uploader, &assets, root, retries).await?;
    let mut current = diff.retained;
    current.merge(uploaded);

    let public_prefix = to_slash_relative(&build.public_dir, root);
    let chunks = ChunkMap::from_store(&current, &public_prefix);
    let app = build.app_path();
    let runtime = build.runtime_path();
    rewrite_in_place(&app, |src| rewrite_bootstrap(src, &chunks))
        .with_context(|| format!("failed to rewrite {}", app.display()))?;
    rewrite_in_place(&runtime, |src| rewrite_runtime(src, &chunks))
        .with_context(|| format!("failed to rewrite {}", runtime.display()))?;
    log!("rewrite"; "{} and {} point at {}", build.app, build.runtime,
        plural_count(chunks.len(), "remote chunk"));

    let bootstrap = [app, runtime];
    let bootstrap_paths: Vec<String> = bootstrap
        .iter()
        .map(|p| to_slash_relative(p, root))
        .collect();
    current.purge_paths(&bootstrap_paths.iter().map(String::as_str).collect());
    current.merge(upload_all(uploader, &bootstrap, root, retries).await?);

    let chunks = ChunkMap::from_store(&current, &public_prefix);
    let html = rewrite_documents(&output.documents, &build.public_dir, &chunks)?;
    log!("html"; "{} rewritten, {} unchanged, {} failed",
        plural_count(html.rewritten, "document"), html.unchanged, html.failed);

    current
        .save(&config.manifest.path)
        .context("failed to write manifest")?;

    Ok(DeployReport {
        uploaded: assets.len(),
        reused,
        html,
        manifest_entries: current.len(),
    })
}

/// Root-relative paths of assets that would be uploaded by a deploy.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DiffReport {
    pub changed: Vec<String>,
    pub unchanged: usize,
}

/// Diff the build output against the manifest without side effects.
pub fn diff(config: &Config) -> Result<DiffReport> {
    let root = config.get_root();
    let output = scan_output(&config.build);
    let store = FingerprintStore::load(&config.manifest.path)?;
    let diff = diff_assets(&output.assets, root, &store).context("failed to hash build output")?;

    Ok(DiffReport {
        unchanged: output.assets.len() - diff.to_upload.len(),
        changed: diff
            .to_upload
            .iter()
            .map(|p| to_slash_relative(p, root))
            .collect(),
    })
}

/// Drop manifest entries that match no file currently in the build output.
///
/// Returns the number of removed entries; the manifest is only rewritten
/// when something was removed.
pub fn prune(config: &Config) -> Result<usize> {
    let root = config.get_root();
    let output = scan_output(&config.build);
    let mut store = FingerprintStore::load(&config.manifest.path)?;
    if store.is_empty() {
        return Ok(0);
    }

    let live = current_identities(&output.assets, root).context("failed to hash build output")?;
    let removed = store.retain_keys(&live);
    if removed > 0 {
        store
            .save(&config.manifest.path)
            .context("failed to write manifest")?;
    }
    Ok(removed)
}

fn current_identities(assets: &[PathBuf], root: &Path) -> std::io::Result<FxHashSet<String>> {
    assets
        .par_iter()
        .map(|path| Identity::of_file(path, root).map(|id| id.key()))
        .collect()
}
