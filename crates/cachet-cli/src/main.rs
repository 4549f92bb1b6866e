//! Cachet CLI entry point: parse arguments, set up logging, dispatch.

use cachet_cli::{cli, commands, error, logger, ui};
use clap::Parser;
use miette::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    logger::init_logger(args.verbose, args.quiet, args.no_color);
    ui::init_colors(args.no_color);

    let result = match args.command {
        cli::Command::Build(build_args) => commands::build_execute(build_args).await,
        cli::Command::Dev(dev_args) => commands::dev_execute(dev_args).await,
        cli::Command::Manifest(manifest_args) => commands::manifest_execute(manifest_args).await,
        cli::Command::Url(url_args) => commands::url_execute(url_args).await,
    };

    result.map_err(error::cli_error_to_miette)
}
