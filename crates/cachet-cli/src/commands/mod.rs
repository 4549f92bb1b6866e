//! Command implementations for the Cachet CLI.
//!
//! - [`build`] - Run the processor pipeline once
//! - [`dev`] - Development server with live reload
//! - [`manifest`] - Fingerprint a tree into a manifest
//! - [`url`] - Resolve one public asset URL
//!
//! Each command module provides an `execute` function taking its parsed
//! arguments.

pub mod build;
pub mod dev;
pub mod manifest;
pub mod url;

pub use build::execute as build_execute;
pub use dev::execute as dev_execute;
pub use manifest::execute as manifest_execute;
pub use url::execute as url_execute;

use crate::error::{CliError, Result};
use std::path::Path;

/// Fail early with a readable error when a source directory is missing.
pub(crate) fn require_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(CliError::FileNotFound(dir.to_path_buf()))
    }
}

/// Cancel `handle` when Ctrl+C arrives.
pub(crate) fn cancel_on_ctrl_c(handle: cachet::CancelHandle) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, cancelling");
            handle.cancel();
        }
    })
}
