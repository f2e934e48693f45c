//! Upload adapter.
//!
//! The remote side is abstracted behind [`Uploader`]; the pipeline only ever
//! sees "file in, one location out". [`upload_all`] drives uploads strictly
//! sequentially with a bounded retry budget per file.
//!
//! # Module Structure
//!
//! ```text
//! upload/
//! ├── command.rs   # CommandUploader (external program per file)
//! └── mod.rs       # Uploader trait, retry loop (this file)
//! ```

mod command;

pub use command::CommandUploader;

use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use thiserror::Error;

use crate::asset::Identity;
use crate::logger::ProgressLine;
use crate::manifest::FingerprintStore;

/// What one successful upload reports: `remote key → remote location`.
///
/// A receipt with anything other than exactly one entry is treated as a
/// failed attempt.
pub type UploadReceipt = BTreeMap<String, String>;

/// Something that can push a single local file to the CDN.
pub trait Uploader: Send + Sync {
    fn upload(&self, path: &Path) -> impl Future<Output = Result<UploadReceipt>> + Send;
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("upload of {} failed {attempts} times, last error: {last}", .path.display())]
    RetriesExhausted {
        path: PathBuf,
        attempts: usize,
        last: String,
    },

    #[error("failed to re-hash uploaded file {}: {source}", .path.display())]
    Hash {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Upload `files` one after another and record each under its fresh identity.
///
/// Each file gets up to `retries` attempts; the first file to exhaust its
/// budget aborts the whole batch. An empty batch returns an empty table
/// without touching the uploader.
pub async fn upload_all<U: Uploader>(
    uploader: &U,
    files: &[PathBuf],
    root: &Path,
    retries: usize,
) -> Result<FingerprintStore, UploadError> {
    let mut uploaded = FingerprintStore::new();
    if files.is_empty() {
        return Ok(uploaded);
    }

    let progress = ProgressLine::new("upload", &[("files", files.len())]);
    for file in files {
        let location = upload_with_retry(uploader, file, root, retries).await?;

        // Hash after the fact: the recorded identity must describe what was sent
        let identity = Identity::of_file(file, root).map_err(|source| UploadError::Hash {
            path: file.clone(),
            source,
        })?;
        uploaded.insert(identity.key(), location);
        progress.inc("files");
    }
    progress.finish();

    Ok(uploaded)
}

async fn upload_with_retry<U: Uploader>(
    uploader: &U,
    file: &Path,
    root: &Path,
    retries: usize,
) -> Result<String, UploadError> {
    let display = crate::utils::path::to_slash_relative(file, root);
    let mut last = String::new();

    for attempt in 1..=retries {
        match uploader.upload(file).await.and_then(single_location) {
            Ok(location) => return Ok(location),
            Err(err) => {
                crate::log!("upload"; "retry {} {} times because of {:#}", display, attempt, err);
                last = format!("{err:#}");
            }
        }
    }

    Err(UploadError::RetriesExhausted {
        path: file.to_path_buf(),
        attempts: retries,
        last,
    })
}

/// Extract the only location from a receipt.
fn single_location(receipt: UploadReceipt) -> Result<String> {
    if receipt.len() != 1 {
        bail!("expected exactly one uploaded entry, got {}", receipt.len());
    }
    match receipt.into_values().next() {
        Some(location) => Ok(location),
        None => bail!("expected exactly one uploaded entry, got 0"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use parking_lot::Mutex;
    use rustc_hash::FxHashMap;
    use std::fs;
    use tempfile::TempDir;

    /// Fails the first `failures[path]` attempts for a path, then succeeds.
    #[derive(Default)]
    struct ScriptedUploader {
        failures: FxHashMap<PathBuf, usize>,
        calls: Mutex<Vec<PathBuf>>,
        receipt_size: Option<usize>,
    }

    impl ScriptedUploader {
        fn failing(path: &Path, times: usize) -> Self {
            let mut failures = FxHashMap::default();
            failures.insert(path.to_path_buf(), times);
            Self {
                failures,
                ..Default::default()
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().len()
        }
    }

    impl Uploader for ScriptedUploader {
        async fn upload(&self, path: &Path) -> Result<UploadReceipt> {
            let mut calls = self.calls.lock();
            calls.push(path.to_path_buf());
            let seen = calls.iter().filter(|p| p.as_path() == path).count();
            drop(calls);

            if seen <= self.failures.get(path).copied().unwrap_or(0) {
                return Err(anyhow!("connection reset"));
            }

            let name = path.file_name().unwrap().to_string_lossy().to_string();
            let entries = self.receipt_size.unwrap_or(1);
            Ok((0..entries)
                .map(|i| (format!("{name}{i}"), format!("https://cdn.example/{name}")))
                .collect())
        }
    }

    fn fixture(files: &[(&str, &str)]) -> (TempDir, Vec<PathBuf>) {
        let dir = TempDir::new().unwrap();
        let paths = files
            .iter()
            .map(|(rel, content)| {
                let path = dir.path().join(rel);
                fs::create_dir_all(path.parent().unwrap()).unwrap();
                fs::write(&path, content).unwrap();
                path
            })
            .collect();
        (dir, paths)
    }

    #[tokio::test]
    async fn test_empty_batch_skips_uploader() {
        let uploader = ScriptedUploader::default();
        let result = upload_all(&uploader, &[], Path::new("."), 5).await.unwrap();
        assert!(result.is_empty());
        assert_eq!(uploader.call_count(), 0);
    }

    #[tokio::test]
    async fn test_records_fresh_identity() {
        let (dir, files) = fixture(&[("public/a.js", "a"), ("public/b.css", "b")]);
        let uploader = ScriptedUploader::default();

        let result = upload_all(&uploader, &files, dir.path(), 5).await.unwrap();

        let id = Identity::of_file(&files[0], dir.path()).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result.get(&id.key()), Some("https://cdn.example/a.js"));
        assert_eq!(uploader.call_count(), 2);
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let (dir, files) = fixture(&[("public/a.js", "a")]);
        let uploader = ScriptedUploader::failing(&files[0], 4);

        let result = upload_all(&uploader, &files, dir.path(), 5).await.unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(uploader.call_count(), 5);
    }

    #[tokio::test]
    async fn test_exhausted_budget_aborts_batch() {
        let (dir, files) = fixture(&[("public/a.js", "a"), ("public/b.js", "b")]);
        let uploader = ScriptedUploader::failing(&files[0], 5);

        let err = upload_all(&uploader, &files, dir.path(), 5)
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::RetriesExhausted { attempts: 5, .. }));
        assert!(err.to_string().contains("connection reset"));
        // b.js never attempted
        assert_eq!(uploader.call_count(), 5);
    }

    #[tokio::test]
    async fn test_receipt_with_wrong_entry_count_is_failure() {
        let (dir, files) = fixture(&[("public/a.js", "a")]);
        let uploader = ScriptedUploader {
            receipt_size: Some(2),
            ..Default::default()
        };

        let err = upload_all(&uploader, &files, dir.path(), 2)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("exactly one"));
        assert_eq!(uploader.call_count(), 2);
    }
}
