//! Conversions from CLI configuration to library types.

use crate::config::{CachetConfig, ProcessorKind, ProcessorSpec};
use crate::error::{ConfigError, Result};
use cachet::pipeline::DEFAULT_MANIFEST_NAME;
use cachet::{
    CommandProcessor, CopyProcessor, ManagerOptions, Pipeline, PipelineConfig, Processor,
    WatcherConfig,
};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

impl CachetConfig {
    /// Where the manifest is written and read.
    pub fn manifest_path(&self) -> PathBuf {
        self.manifest_path
            .clone()
            .unwrap_or_else(|| self.output_dir.join(DEFAULT_MANIFEST_NAME))
    }

    pub fn pipeline_config(&self, dev: bool) -> PipelineConfig {
        let mut config = PipelineConfig::new(&self.input_dir)
            .output_dir(&self.output_dir)
            .manifest_path(self.manifest_path())
            .dev(dev)
            .source_maps(self.source_maps)
            .clean_output(self.clean_output);
        config.minify = self.minify;
        config
    }

    pub fn manager_options(&self, dev: bool) -> ManagerOptions {
        ManagerOptions::default()
            .static_prefix(self.static_prefix.clone())
            .dev(dev)
    }

    pub fn watcher_config(&self) -> WatcherConfig {
        WatcherConfig::default()
            .debounce(Duration::from_millis(self.debounce_ms))
            .exclude(self.watch.exclude.iter().cloned())
    }

    /// Watch roots: configured paths, or the input directory.
    pub fn watch_paths(&self) -> Vec<PathBuf> {
        if self.watch.paths.is_empty() && self.watch.patterns.is_empty() {
            vec![self.input_dir.clone()]
        } else {
            self.watch.paths.clone()
        }
    }

    /// Instantiate the configured processors, in order.
    ///
    /// With no processors configured the whole input tree is copied.
    pub fn build_processors(&self) -> Vec<Arc<dyn Processor>> {
        if self.processors.is_empty() {
            return vec![Arc::new(CopyProcessor::new(Vec::<String>::new()))];
        }
        self.processors.iter().map(instantiate).collect()
    }

    /// A pipeline with every configured processor registered.
    pub fn build_pipeline(&self, dev: bool) -> Pipeline {
        let mut pipeline = Pipeline::new(self.pipeline_config(dev));
        for processor in self.build_processors() {
            pipeline.add_shared(processor);
        }
        pipeline
    }

    /// Dev server bind address.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self.host.parse().map_err(|_| ConfigError::InvalidValue {
            field: "host".to_string(),
            value: self.host.clone(),
            hint: "Use an IP address such as 127.0.0.1 or 0.0.0.0".to_string(),
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

fn instantiate(spec: &ProcessorSpec) -> Arc<dyn Processor> {
    match spec.kind {
        ProcessorKind::Copy => Arc::new(CopyProcessor::named(&spec.name, spec.file_types.iter())),
        ProcessorKind::Command => Arc::new(
            CommandProcessor::new(&spec.name, spec.command.clone().unwrap_or_default())
                .args(spec.args.iter())
                .file_types(spec.file_types.iter()),
        ),
    }
}
