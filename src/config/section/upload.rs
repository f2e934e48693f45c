//! `[upload]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [upload]
//! command = ["node", "scripts/upload.js", "$CDNIFY_FILE"]
//! retries = 5
//! ```

use crate::config::{ConfigDiagnostics, FieldPath};
use serde::{Deserialize, Serialize};

/// Number of attempts per file before the upload is abandoned.
pub const DEFAULT_RETRIES: usize = 5;

/// Upload command settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Command and arguments run once per file.
    /// Supports `$CDNIFY_*` variable substitution.
    pub command: Vec<String>,

    /// Attempts per file.
    pub retries: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            command: Vec::new(),
            retries: DEFAULT_RETRIES,
        }
    }
}

impl UploadConfig {
    pub const COMMAND: FieldPath = FieldPath::new("upload.command");
    pub const RETRIES: FieldPath = FieldPath::new("upload.retries");

    /// Validate upload settings.
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.retries == 0 {
            diag.error_with_hint(
                Self::RETRIES,
                "must be at least 1",
                format!("remove the field to use the default of {DEFAULT_RETRIES}"),
            );
        }

        let Some(cmd) = self.command.first() else {
            diag.error_with_hint(
                Self::COMMAND,
                "no upload command configured",
                "set upload.command in cdnify.toml or pass it after `--`",
            );
            return;
        };

        let is_package_runner = ["npx", "bunx", "pnpx", "yarn", "dlx"].contains(&cmd.as_str());
        let is_path = cmd.contains('/') || cmd.contains('\\');

        if !is_path && which::which(cmd).is_err() {
            if is_package_runner {
                // Package runners can download packages at runtime, just hint
                if self.command.len() > 1 {
                    diag.hint(
                        Self::COMMAND,
                        format!(
                            "`{}` via `{}`: ensure the package is installed",
                            self.command[1], cmd
                        ),
                    );
                }
            } else {
                diag.error_with_hint(
                    Self::COMMAND,
                    format!("`{cmd}` not found"),
                    format!("install the command or update {}", Self::COMMAND),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_retries() {
        assert_eq!(UploadConfig::default().retries, 5);
    }

    #[test]
    fn test_validate_empty_command() {
        let mut diag = ConfigDiagnostics::new();
        UploadConfig::default().validate(&mut diag);
        assert_eq!(diag.errors().len(), 1);
        assert_eq!(diag.errors()[0].field, UploadConfig::COMMAND);
    }

    #[test]
    fn test_validate_zero_retries_and_missing_program() {
        let config = UploadConfig {
            command: vec!["cdnify-definitely-not-installed".into()],
            retries: 0,
        };
        let mut diag = ConfigDiagnostics::new();
        config.validate(&mut diag);

        let fields: Vec<_> = diag.errors().iter().map(|e| e.field).collect();
        assert_eq!(fields, [UploadConfig::RETRIES, UploadConfig::COMMAND]);
    }
}
