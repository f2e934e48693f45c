//! `cdnify diff`: report what the next deploy would upload.

use anyhow::Result;

use crate::config::Config;
use crate::log;
use crate::pipeline;
use crate::utils::plural_count;

pub fn diff_site(config: &Config) -> Result<()> {
    let report = pipeline::diff(config)?;

    if report.changed.is_empty() {
        log!("diff"; "nothing to upload ({} unchanged)", report.unchanged);
        return Ok(());
    }

    log!("diff"; "{} to upload, {} unchanged",
        plural_count(report.changed.len(), "asset"), report.unchanged);
    for path in &report.changed {
        println!("  {path}");
    }
    Ok(())
}
