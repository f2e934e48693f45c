//! `cdnify deploy`: the post-build hook.

use anyhow::{Context, Result};

use crate::config::Config;
use crate::log;
use crate::pipeline;
use crate::upload::CommandUploader;
use crate::utils::plural_count;

/// Upload changed assets through the configured command and rewrite references.
pub fn deploy_site(config: &Config) -> Result<()> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    let uploader = CommandUploader::from_config(config);
    let report = rt.block_on(pipeline::deploy(config, &uploader))?;

    log!("deploy"; "done: {} uploaded, {} reused, manifest holds {} entries",
        plural_count(report.uploaded, "asset"),
        report.reused,
        report.manifest_entries);
    if report.html.failed > 0 {
        log!("warning"; "{} could not be rewritten",
            plural_count(report.html.failed, "document"));
    }
    Ok(())
}
