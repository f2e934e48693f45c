//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Incremental CDN upload and asset reference rewriting for static-site builds
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: cdnify.toml)
    #[arg(short = 'C', long, global = true, default_value = "cdnify.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Upload changed assets and rewrite references to their remote locations
    #[command(visible_alias = "d")]
    Deploy {
        #[command(flatten)]
        args: DeployArgs,
    },

    /// Show which assets changed since the last deploy, without uploading
    Diff {
        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Drop manifest entries that no longer match any file in the build output
    Prune {
        #[command(flatten)]
        layout: LayoutArgs,
    },
}

/// Build output layout overrides shared by all commands.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct LayoutArgs {
    /// Build output directory (relative to project root)
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub public_dir: Option<PathBuf>,

    /// Manifest file path (relative to project root)
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub manifest: Option<PathBuf>,
}

/// Deploy command arguments.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct DeployArgs {
    #[command(flatten)]
    pub layout: LayoutArgs,

    /// Attempts per file before the deploy is aborted
    #[arg(short, long)]
    pub retries: Option<usize>,

    /// Upload command, overriding `upload.command`.
    ///
    /// Example: cdnify deploy -- node scripts/upload.js '$CDNIFY_FILE'
    #[arg(last = true, value_name = "UPLOAD_COMMAND")]
    pub upload_command: Vec<String>,
}

impl Cli {
    pub const fn is_deploy(&self) -> bool {
        matches!(self.command, Commands::Deploy { .. })
    }
}
