//! Build output scanning (pure, no side effects).

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use jwalk::WalkDir;

use crate::config::BuildConfig;
use crate::utils::path::has_component;

/// Files found in the build output, each list sorted by path.
#[derive(Debug, Default)]
pub struct BuildOutput {
    /// Uploadable assets (filtered by extension).
    pub assets: Vec<PathBuf>,
    /// HTML documents.
    pub documents: Vec<PathBuf>,
}

/// Scan the public directory for assets and HTML documents.
///
/// Files under any excluded directory name (e.g. `~partytown`) are skipped
/// for both lists.
pub fn scan_output(build: &BuildConfig) -> BuildOutput {
    let root = &build.public_dir;
    let mut output = BuildOutput::default();

    for path in collect_files(root) {
        let rel = path.strip_prefix(root).unwrap_or(&path);
        if build.exclude.iter().any(|name| has_component(rel, name)) {
            continue;
        }

        let Some(ext) = path.extension().and_then(OsStr::to_str) else {
            continue;
        };

        if ext.eq_ignore_ascii_case("html") {
            output.documents.push(path);
        } else if build.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)) {
            output.assets.push(path);
        }
    }

    output.assets.sort();
    output.documents.sort();
    output
}

/// Collect all files from a directory recursively
///
/// Hidden entries are walked too; the extension filter decides what counts.
fn collect_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .skip_hidden(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path())
        .collect()
}
