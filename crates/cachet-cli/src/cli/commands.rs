use clap::{Args, Subcommand};
use std::path::PathBuf;

/// Available Cachet subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the asset tree
    ///
    /// Runs every configured processor in order. Production builds also
    /// fingerprint the output and write the manifest.
    Build(BuildArgs),

    /// Start the development server
    ///
    /// Builds once, then watches the sources, rebuilds on change and tells
    /// connected browsers to reload.
    Dev(DevArgs),

    /// Write a manifest for an existing asset tree
    Manifest(ManifestArgs),

    /// Print the public URL of an asset
    ///
    /// Uses the manifest when one exists, otherwise hashes the file.
    Url(UrlArgs),
}

/// Arguments for the build command
#[derive(Args, Debug, Default)]
pub struct BuildArgs {
    /// Path to the config file (default: cachet.config.json)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Source asset directory
    #[arg(short, long, value_name = "DIR")]
    pub input: Option<PathBuf>,

    /// Build output directory
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Development build: no manifest, no minification by default
    #[arg(long)]
    pub dev: bool,

    /// Force minification on
    #[arg(long)]
    pub minify: bool,

    /// Remove the output directory first
    #[arg(long)]
    pub clean: bool,
}

/// Arguments for the dev command
#[derive(Args, Debug, Default)]
pub struct DevArgs {
    /// Path to the config file (default: cachet.config.json)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Address to bind
    #[arg(long, value_name = "ADDR")]
    pub host: Option<String>,
}

/// Arguments for the manifest command
#[derive(Args, Debug, Default)]
pub struct ManifestArgs {
    /// Path to the config file (default: cachet.config.json)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory to fingerprint (default: the configured input directory)
    #[arg(short, long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Where to write the manifest (default: the configured manifest path)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Arguments for the url command
#[derive(Args, Debug, Default)]
pub struct UrlArgs {
    /// Logical asset path, e.g. css/app.css
    #[arg(value_name = "PATH")]
    pub path: String,

    /// Path to the config file (default: cachet.config.json)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the unfingerprinted development URL
    #[arg(long)]
    pub dev: bool,
}
