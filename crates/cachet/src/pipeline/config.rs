//! Build configuration.
//!
//! [`PipelineConfig`] is what callers fill in; [`ProcessorConfig`] is the
//! resolved, immutable view every processor receives for one build.

use std::path::PathBuf;

/// Output directory used when none is configured.
pub const DEFAULT_OUTPUT_DIR: &str = "dist";

/// File name of the manifest inside the output directory.
pub const DEFAULT_MANIFEST_NAME: &str = "manifest.json";

/// Pipeline configuration as supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Source asset directory
    pub input_dir: PathBuf,
    /// Output directory; defaults to [`DEFAULT_OUTPUT_DIR`]
    pub output_dir: Option<PathBuf>,
    /// Development build
    pub dev: bool,
    /// Minify output. `None` means "use the mode default", see
    /// [`PipelineConfig::resolve`].
    pub minify: Option<bool>,
    /// Emit source maps
    pub source_maps: bool,
    /// Remove and recreate the output directory before building
    pub clean_output: bool,
    /// Manifest location; defaults to `<output_dir>/manifest.json`
    pub manifest_path: Option<PathBuf>,
}

impl PipelineConfig {
    pub fn new(input_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            ..Self::default()
        }
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn dev(mut self, dev: bool) -> Self {
        self.dev = dev;
        self
    }

    pub fn minify(mut self, minify: bool) -> Self {
        self.minify = Some(minify);
        self
    }

    pub fn source_maps(mut self, source_maps: bool) -> Self {
        self.source_maps = source_maps;
        self
    }

    pub fn clean_output(mut self, clean: bool) -> Self {
        self.clean_output = clean;
        self
    }

    pub fn manifest_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest_path = Some(path.into());
        self
    }

    /// Apply defaults and produce the per-build view.
    ///
    /// Minification policy: production builds minify unless `minify` was set
    /// explicitly to `false`; dev builds don't minify unless set to `true`.
    pub fn resolve(&self) -> ProcessorConfig {
        let output_dir = self
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

        let manifest_path = self
            .manifest_path
            .clone()
            .unwrap_or_else(|| output_dir.join(DEFAULT_MANIFEST_NAME));

        ProcessorConfig {
            input_dir: self.input_dir.clone(),
            minify: self.minify.unwrap_or(!self.dev),
            output_dir,
            dev: self.dev,
            source_maps: self.source_maps,
            clean_output: self.clean_output,
            manifest_path,
        }
    }
}

/// Resolved configuration handed to processors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub dev: bool,
    pub minify: bool,
    pub source_maps: bool,
    pub clean_output: bool,
    pub manifest_path: PathBuf,
}
