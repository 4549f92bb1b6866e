//! Cachet CLI - fingerprinted asset builds and a live-reload dev server.
//!
//! Wires the `cachet` library into a command-line tool:
//!
//! - [`cli`] - Argument parsing with clap
//! - [`config`] - Layered configuration (file, environment, flags)
//! - [`error`] - Error types with actionable hints
//! - [`logger`] - Tracing subscriber setup
//! - [`ui`] - Status lines, spinner and summaries
//! - [`commands`] - `build`, `dev`, `manifest` and `url`
//!
//! # Example
//!
//! ```rust,no_run
//! use cachet_cli::config::{CachetConfig, ConfigOverrides};
//!
//! # async fn run() -> cachet_cli::Result<()> {
//! let config = CachetConfig::load(None, &ConfigOverrides::default())?;
//! cachet_cli::commands::build::run(&config, false).await?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logger;
pub mod ui;

pub use error::{CliError, ConfigError, Result, ResultExt};
