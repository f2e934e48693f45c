//! HTML document rewriting.
//!
//! Every short key known to the chunk map is replaced by its remote location
//! in every document outside the page data tree.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;

use super::RewriteError;
use super::chunk::ChunkMap;
use super::substitute::Substitutions;
use crate::utils::fs::write_atomic;
use crate::utils::path::has_component;

/// Directory whose HTML is data-only and never rewritten.
const PAGE_DATA_COMPONENT: &str = "page-data";

/// Per-batch counts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HtmlSummary {
    pub rewritten: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl HtmlSummary {
    fn add(mut self, outcome: Outcome) -> Self {
        match outcome {
            Outcome::Rewritten => self.rewritten += 1,
            Outcome::Unchanged => self.unchanged += 1,
            Outcome::Skipped => self.skipped += 1,
            Outcome::Failed => self.failed += 1,
        }
        self
    }

    fn merge(self, other: Self) -> Self {
        Self {
            rewritten: self.rewritten + other.rewritten,
            unchanged: self.unchanged + other.unchanged,
            skipped: self.skipped + other.skipped,
            failed: self.failed + other.failed,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Outcome {
    Rewritten,
    Unchanged,
    Skipped,
    Failed,
}

/// Rewrite `documents` in parallel.
///
/// A document that cannot be read or written is logged and counted as
/// failed; the rest of the batch still runs.
pub fn rewrite_documents(
    documents: &[PathBuf],
    public_dir: &Path,
    chunks: &ChunkMap,
) -> Result<HtmlSummary, RewriteError> {
    let subs = Substitutions::new(chunks.iter())?;

    let summary = documents
        .par_iter()
        .map(|doc| {
            let rel = doc.strip_prefix(public_dir).unwrap_or(doc);
            if has_component(rel, PAGE_DATA_COMPONENT) {
                return Outcome::Skipped;
            }
            match rewrite_document(doc, &subs) {
                Ok(true) => Outcome::Rewritten,
                Ok(false) => Outcome::Unchanged,
                Err(e) => {
                    crate::log!("html"; "skipped {}: {:#}", rel.display(), e);
                    Outcome::Failed
                }
            }
        })
        .fold(HtmlSummary::default, HtmlSummary::add)
        .reduce(HtmlSummary::default, HtmlSummary::merge);

    Ok(summary)
}

/// Returns whether the file changed.
fn rewrite_document(path: &Path, subs: &Substitutions) -> Result<bool> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let rewritten = subs.apply(&content);
    if rewritten == content.as_str() {
        return Ok(false);
    }
    write_atomic(path, rewritten.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(true)
}
