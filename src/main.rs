//! cdnify - incremental CDN upload and asset reference rewriting for
//! static-site build output.

mod asset;
mod cli;
mod config;
mod freshness;
mod logger;
mod manifest;
mod pipeline;
mod rewrite;
mod upload;
mod utils;

use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::Config;

fn main() {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    if let Err(e) = run(&cli) {
        log!("error"; "{:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = Config::load(cli)?;

    match &cli.command {
        Commands::Deploy { .. } => cli::deploy::deploy_site(&config),
        Commands::Diff { .. } => cli::diff::diff_site(&config),
        Commands::Prune { .. } => cli::prune::prune_manifest(&config),
    }
}
