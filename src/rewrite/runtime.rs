//! Module-loading runtime rewriting.
//!
//! The runtime builds chunk URLs from bare chunk names and refers to the
//! stylesheet by file name. Both are swapped for scheme-relative remote
//! locations with plain text substitution.

use url::{Position, Url};

use super::RewriteError;
use super::chunk::ChunkMap;
use super::substitute::Substitutions;

const STYLESHEET: &str = "styles.css";
const STYLESHEET_KEY: &str = "/styles.css";

/// Rewrite the runtime text against `chunks`.
pub fn rewrite_runtime(source: &str, chunks: &ChunkMap) -> Result<String, RewriteError> {
    let subs = Substitutions::new(runtime_patterns(chunks))?.token_bounded();
    Ok(subs.apply(source).into_owned())
}

/// Stylesheet name plus every top-level script's bare name.
fn runtime_patterns(chunks: &ChunkMap) -> Vec<(String, String)> {
    let mut pairs = Vec::new();

    if let Some(location) = chunks.get(STYLESHEET_KEY) {
        pairs.push((STYLESHEET.to_string(), strip_scheme(location)));
    }

    for (key, location) in chunks.iter() {
        let Some(name) = key.strip_prefix('/').and_then(|k| k.strip_suffix(".js")) else {
            continue;
        };
        if name.is_empty() || name.contains('/') {
            continue;
        }
        let suffix = strip_scheme(location);
        let suffix = suffix.strip_suffix(".js").unwrap_or(&suffix).to_string();
        pairs.push((name.to_string(), suffix));
    }

    pairs
}

/// `https://cdn.example/a.js` → `//cdn.example/a.js`.
///
/// Locations that are not absolute URLs are returned unchanged.
pub fn strip_scheme(location: &str) -> String {
    match Url::parse(location) {
        Ok(url) if url.has_host() => format!("//{}", &url[Position::BeforeUsername..]),
        _ => location.to_string(),
    }
}
