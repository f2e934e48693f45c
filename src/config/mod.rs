//! Project configuration management for `cdnify.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── build      # [build]
//! │   ├── upload     # [upload]
//! │   └── manifest   # [manifest]
//! ├── types/         # ConfigError, ConfigDiagnostics, FieldPath
//! └── mod.rs         # Config (this file)
//! ```
//!
//! The configuration is loaded once in `main` and handed to every stage by
//! reference; nothing reads it through a global.

pub mod section;
pub mod types;
mod util;

pub use section::{BuildConfig, ManifestConfig, UploadConfig};
pub use types::{ConfigDiagnostics, ConfigError, FieldPath};

use crate::{
    cli::{Cli, Commands, DeployArgs, LayoutArgs},
    log,
    utils::path::normalize_path,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use util::{find_config_file, resolve_against};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing cdnify.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Build output layout
    #[serde(default)]
    pub build: BuildConfig,

    /// Upload command settings
    #[serde(default)]
    pub upload: UploadConfig,

    /// Manifest location
    #[serde(default)]
    pub manifest: ManifestConfig,
}

impl Config {
    /// Load configuration for the given CLI invocation.
    ///
    /// Searches upward from cwd for the config file. Without one, defaults
    /// apply and the project root is the current directory.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let mut config = match find_config_file(&cli.config) {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                config.config_path = normalize_path(&path);
                config
            }
            None => {
                crate::debug!("config"; "{} not found, using defaults", cli.config.display());
                Self::default()
            }
        };

        let root = config
            .config_path
            .parent()
            .map_or(cwd, Path::to_path_buf);

        config.apply_command_options(&cli.command);
        config.finalize(&root);
        config.validate(cli.is_deploy())?;

        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let (config, ignored) = Self::parse_with_ignored(content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored);
        }
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content).with_context(|| format!("in {}", path.display()))
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::Toml)?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String]) {
        log!("warning"; "unknown config fields ignored:");
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Resolve relative paths against the project root.
    pub(crate) fn finalize(&mut self, root: &Path) {
        let root = normalize_path(root);
        self.build.public_dir = normalize_path(&resolve_against(&root, &self.build.public_dir));
        self.manifest.path = resolve_against(&root, &self.manifest.path);
        self.root = root;
    }

    /// Validate the sections the command needs.
    fn validate(&self, deploying: bool) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();
        self.build.validate(&mut diag, deploying);
        if deploying {
            self.upload.validate(&mut diag);
        }
        diag.into_result()
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        &self.root
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply command-specific configuration options.
    fn apply_command_options(&mut self, command: &Commands) {
        match command {
            Commands::Deploy { args } => self.apply_deploy_args(args),
            Commands::Diff { layout } | Commands::Prune { layout } => {
                self.apply_layout_args(layout);
            }
        }
    }

    fn apply_layout_args(&mut self, args: &LayoutArgs) {
        Self::update_option(&mut self.build.public_dir, args.public_dir.as_ref());
        Self::update_option(&mut self.manifest.path, args.manifest.as_ref());
    }

    fn apply_deploy_args(&mut self, args: &DeployArgs) {
        self.apply_layout_args(&args.layout);
        Self::update_option(&mut self.upload.retries, args.retries.as_ref());
        if !args.upload_command.is_empty() {
            self.upload.command = args.upload_command.clone();
        }
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_from_str_full() {
        let config = Config::from_str(
            r#"
            [build]
            public_dir = "dist"
            app = "main.js"
            exclude = ["~partytown", "_vendor"]

            [upload]
            command = ["node", "upload.js", "$CDNIFY_FILE"]
            retries = 3

            [manifest]
            path = ".cache/upload.manifest.json"
            "#,
        )
        .unwrap();

        assert_eq!(config.build.public_dir, PathBuf::from("dist"));
        assert_eq!(config.build.app, "main.js");
        assert_eq!(config.build.runtime, "webpack-runtime.js");
        assert_eq!(config.build.exclude.len(), 2);
        assert_eq!(config.upload.command[0], "node");
        assert_eq!(config.upload.retries, 3);
        assert_eq!(
            config.manifest.path,
            PathBuf::from(".cache/upload.manifest.json")
        );
    }

    #[test]
    fn test_from_str_empty_uses_defaults() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.build.public_dir, PathBuf::from("public"));
        assert_eq!(config.upload.retries, 5);
        assert_eq!(config.manifest.path, PathBuf::from("upload.manifest.json"));
    }

    #[test]
    fn test_from_str_unknown_field_is_not_fatal() {
        let config = Config::from_str("[build]\nmystery = 1\n").unwrap();
        assert_eq!(config.build.app, "app.js");
    }

    #[test]
    fn test_from_str_type_error() {
        assert!(Config::from_str("[upload]\nretries = \"many\"\n").is_err());
    }

    #[test]
    fn test_cli_overrides_and_finalize() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        let args = DeployArgs {
            layout: LayoutArgs {
                public_dir: Some(PathBuf::from("out")),
                manifest: None,
            },
            retries: Some(2),
            upload_command: vec!["./upload.sh".into()],
        };

        config.apply_command_options(&Commands::Deploy { args });
        config.finalize(dir.path());

        assert!(config.build.public_dir.ends_with("out"));
        assert!(config.build.public_dir.is_absolute());
        assert_eq!(config.manifest.path, dir.path().join("upload.manifest.json"));
        assert_eq!(config.upload.retries, 2);
        assert_eq!(config.upload.command, ["./upload.sh"]);
    }
}
