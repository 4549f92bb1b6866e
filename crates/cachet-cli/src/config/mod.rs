//! Layered configuration for the Cachet CLI.
//!
//! Sources are merged in priority order: CLI flags > `CACHET_*` environment
//! variables > `cachet.config.json` (or `--config`) > defaults.

mod conversions;
mod defaults;
mod loading;
mod types;
mod validation;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use defaults::*;
pub use loading::{ConfigOverrides, DEFAULT_CONFIG_FILE};
pub use types::*;

/// Cachet configuration, as read from `cachet.config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CachetConfig {
    /// Source asset directory
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,

    /// Build output directory, also the directory served by `dev`
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// URL prefix assets are served under
    #[serde(default = "default_static_prefix")]
    pub static_prefix: String,

    /// Manifest location; `<outputDir>/manifest.json` when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest_path: Option<PathBuf>,

    /// Minify output; production builds minify when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minify: Option<bool>,

    /// Emit source maps
    #[serde(default)]
    pub source_maps: bool,

    /// Remove the output directory before building
    #[serde(default)]
    pub clean_output: bool,

    /// Dev server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Dev server bind address
    #[serde(default = "default_host")]
    pub host: String,

    /// Watcher debounce window in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// What the dev server watches
    #[serde(default)]
    pub watch: WatchSettings,

    /// Build steps, run in order. Empty means "copy the input tree".
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub processors: Vec<ProcessorSpec>,
}

impl Default for CachetConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            output_dir: default_output_dir(),
            static_prefix: default_static_prefix(),
            manifest_path: None,
            minify: None,
            source_maps: false,
            clean_output: false,
            port: default_port(),
            host: default_host(),
            debounce_ms: default_debounce_ms(),
            watch: WatchSettings::default(),
            processors: Vec::new(),
        }
    }
}

impl CachetConfig {
    /// Example `cachet.config.json` content.
    pub fn example_config() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self {
            clean_output: true,
            watch: WatchSettings {
                patterns: vec!["assets/**/*.css".to_string(), "assets/**/*.js".to_string()],
                ..WatchSettings::default()
            },
            processors: vec![
                ProcessorSpec {
                    name: "sass".to_string(),
                    kind: ProcessorKind::Command,
                    command: Some("sass".to_string()),
                    args: vec!["{input}/scss:{output}/css".to_string()],
                    file_types: vec!["scss".to_string()],
                },
                ProcessorSpec {
                    name: "static".to_string(),
                    kind: ProcessorKind::Copy,
                    command: None,
                    args: Vec::new(),
                    file_types: vec!["js".to_string(), "png".to_string(), "svg".to_string()],
                },
            ],
            ..Self::default()
        })
    }
}
