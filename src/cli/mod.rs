//! Command-line interface module.

mod args;
pub mod deploy;
pub mod diff;
pub mod prune;

pub use args::{Cli, Commands, DeployArgs, LayoutArgs};
