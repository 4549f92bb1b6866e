//! Command-line interface definition for Cachet.
//!
//! # Command Structure
//!
//! - `cachet build` - Run the processors and write a fingerprint manifest
//! - `cachet dev` - Serve assets, rebuild on change and live-reload browsers
//! - `cachet manifest` - Fingerprint an existing tree without building
//! - `cachet url` - Print the public URL of one asset

mod commands;
mod tests;

use clap::Parser;

pub use commands::{BuildArgs, Command, DevArgs, ManifestArgs, UrlArgs};

/// Cachet - fingerprinted static assets with live reload
#[derive(Parser, Debug)]
#[command(
    name = "cachet",
    version,
    about = "Fingerprinted static assets with live reload",
    long_about = "Cachet builds a static asset tree through a chain of processors,\n\
                  fingerprints every file by content hash for cache busting, and\n\
                  serves the result with a live-reloading development server."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}
