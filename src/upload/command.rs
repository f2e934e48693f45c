//! Upload through an external program.
//!
//! The configured command runs once per file with `$CDNIFY_*` variables
//! substituted into its arguments and exported into its environment. It must
//! print a JSON object with a single `key: location` entry on stdout.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{Context, Result, bail};
use serde_json::{Map, Value};
use tokio::process::Command;

use super::{UploadReceipt, Uploader};
use crate::config::Config;

/// Runs `upload.command` per file.
#[derive(Debug, Clone)]
pub struct CommandUploader {
    command: Vec<String>,
    root: PathBuf,
    public_dir: PathBuf,
}

impl CommandUploader {
    pub fn new(command: Vec<String>, root: PathBuf, public_dir: PathBuf) -> Self {
        Self {
            command,
            root,
            public_dir,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.upload.command.clone(),
            config.root.clone(),
            config.build.public_dir.clone(),
        )
    }

    /// `$CDNIFY_*` variables for one file.
    fn vars(&self, file: &Path) -> [(&'static str, String); 3] {
        [
            ("CDNIFY_FILE", file.display().to_string()),
            ("CDNIFY_ROOT", self.root.display().to_string()),
            ("CDNIFY_PUBLIC_DIR", self.public_dir.display().to_string()),
        ]
    }
}

impl Uploader for CommandUploader {
    async fn upload(&self, path: &Path) -> Result<UploadReceipt> {
        let vars = self.vars(path);
        let argv = resolve_args(&self.command, &vars);
        let Some((program, args)) = argv.split_first() else {
            bail!("upload command is empty");
        };

        let output = Command::new(program)
            .args(args)
            .current_dir(&self.root)
            .envs(vars.iter().map(|(k, v)| (*k, v.as_str())))
            .stdin(Stdio::null())
            .output()
            .await
            .with_context(|| format!("failed to spawn `{program}`"))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("`{}` exited with {}: {}", program, output.status, stderr.trim());
        }

        parse_receipt(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Replace `$NAME` occurrences in each argument.
fn resolve_args(args: &[String], vars: &[(&str, String)]) -> Vec<String> {
    args.iter()
        .map(|arg| {
            let mut result = arg.clone();
            for (key, value) in vars {
                result = result.replace(&format!("${key}"), value);
            }
            result
        })
        .collect()
}

/// Parse upload command output.
///
/// The whole of stdout is tried first, then its last non-empty line, so
/// scripts may log progress before printing the result.
fn parse_receipt(stdout: &str) -> Result<UploadReceipt> {
    let trimmed = stdout.trim();
    let object = serde_json::from_str::<Map<String, Value>>(trimmed).or_else(|err| {
        match trimmed.lines().rev().find(|l| !l.trim().is_empty()) {
            Some(last) if last.len() != trimmed.len() => serde_json::from_str(last.trim()),
            _ => Err(err),
        }
    });
    let object = object.with_context(|| format!("upload command printed invalid JSON: {trimmed:?}"))?;

    object
        .into_iter()
        .map(|(key, value)| match value {
            Value::String(location) => Ok((key, location)),
            other => bail!("location for `{key}` is not a string: {other}"),
        })
        .collect()
}
