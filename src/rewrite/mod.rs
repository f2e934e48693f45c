//! Reference rewriting.
//!
//! After upload, local references inside the build output must point at
//! remote locations. Three kinds of files are rewritten:
//!
//! - the application shell (structural, via oxc)
//! - the module-loading runtime (token-bounded text substitution)
//! - HTML documents (plain text substitution, in parallel)
//!
//! # Module Structure
//!
//! ```text
//! rewrite/
//! ├── chunk.rs       # ChunkMap, page data and fragment tables
//! ├── substitute.rs  # single-pass longest-first substitution
//! ├── bootstrap.rs   # application shell
//! ├── runtime.rs     # module-loading runtime
//! └── html.rs        # HTML documents
//! ```

mod bootstrap;
mod chunk;
mod html;
mod runtime;
mod substitute;

pub use bootstrap::rewrite_bootstrap;
pub use chunk::ChunkMap;
pub use html::{HtmlSummary, rewrite_documents};
pub use runtime::rewrite_runtime;

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::utils::fs::write_atomic;

#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("failed to parse JavaScript: {0}")]
    Parse(String),

    #[error("rewritten program does not parse: {0}")]
    InvalidOutput(String),

    #[error("failed to render lookup table: {0}")]
    Render(#[from] serde_json::Error),

    #[error("failed to compile substitution patterns: {0}")]
    Pattern(#[from] regex::Error),

    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Read `path`, transform its text, and write the result back.
///
/// Returns whether the content changed. An unchanged file is not written.
pub fn rewrite_in_place<F>(path: &Path, transform: F) -> Result<bool, RewriteError>
where
    F: FnOnce(&str) -> Result<String, RewriteError>,
{
    let io_err = |source| RewriteError::Io {
        path: path.to_path_buf(),
        source,
    };
    let source = fs::read_to_string(path).map_err(io_err)?;
    let rewritten = transform(&source)?;
    if rewritten == source {
        return Ok(false);
    }
    write_atomic(path, rewritten.as_bytes()).map_err(io_err)?;
    Ok(true)
}
