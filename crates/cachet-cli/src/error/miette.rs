//! Conversion from CLI errors to miette reports.

use crate::error::CliError;
use cachet::AssetError;
use ::miette::{miette, Report};

/// Convert a [`CliError`] into a report for `main`.
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Asset(e) => asset_error_to_miette(e),
        CliError::Config(e) => miette!("Configuration error: {}", e),
        _ => miette!("{}", err),
    }
}

fn asset_error_to_miette(err: AssetError) -> Report {
    match err {
        AssetError::Processor { name, source } => miette!(
            "Processor '{}' failed:\n{}\n\nHint: Fix the error above; later processors did not run",
            name,
            source
        ),
        AssetError::WatcherSetup { path, source } => miette!(
            "Cannot watch {}: {}\n\nHint: Check that the path exists and is readable",
            path.display(),
            source
        ),
        _ => miette!("{}", err),
    }
}
