//! `cdnify prune`: drop manifest entries for files no longer in the build.

use anyhow::Result;

use crate::config::Config;
use crate::log;
use crate::pipeline;

pub fn prune_manifest(config: &Config) -> Result<()> {
    let removed = pipeline::prune(config)?;
    if removed == 0 {
        log!("prune"; "manifest is clean");
    } else {
        log!("prune"; "removed {} stale manifest entries", removed);
    }
    Ok(())
}
