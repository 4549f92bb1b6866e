//! Ordered, fail-fast processor pipeline.
//!
//! The pipeline runs its processors strictly in registration order against one
//! resolved [`ProcessorConfig`]. The first failure stops the build; output
//! already written by earlier processors is left in place.

pub mod config;
pub mod processor;

pub use config::{DEFAULT_MANIFEST_NAME, DEFAULT_OUTPUT_DIR, PipelineConfig, ProcessorConfig};
pub use processor::{CommandProcessor, CopyProcessor, Processor};

use crate::assets::{is_within, logical_path_in, AssetManager};
use crate::context::Context;
use crate::error::{AssetError, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Summary of a successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    /// Processors that ran, in order
    pub processors_run: Vec<String>,
    /// Wall-clock build time
    pub duration: Duration,
    /// Manifest size, when a production manifest was written
    pub manifest_entries: Option<usize>,
}

/// Runs processors and, for production builds, refreshes the manifest.
pub struct Pipeline {
    config: ProcessorConfig,
    processors: Vec<Arc<dyn Processor>>,
    manager: Option<Arc<AssetManager>>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config: config.resolve(),
            processors: Vec::new(),
            manager: None,
        }
    }

    /// Append a processor. Processors run in the order they were added.
    pub fn add(&mut self, processor: impl Processor + 'static) -> &mut Self {
        self.processors.push(Arc::new(processor));
        self
    }

    /// Append an already shared processor.
    pub fn add_shared(&mut self, processor: Arc<dyn Processor>) -> &mut Self {
        self.processors.push(processor);
        self
    }

    /// Attach the manager that receives the manifest after production builds.
    pub fn with_manager(mut self, manager: Arc<AssetManager>) -> Self {
        self.manager = Some(manager);
        self
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    pub fn manager(&self) -> Option<&Arc<AssetManager>> {
        self.manager.as_ref()
    }

    /// Names of the registered processors, in run order.
    pub fn processor_names(&self) -> Vec<String> {
        self.processors.iter().map(|p| p.name().to_string()).collect()
    }

    /// Run one build.
    ///
    /// # Errors
    ///
    /// - [`AssetError::Cancelled`] if `ctx` is cancelled before or during a
    ///   processor
    /// - [`AssetError::Processor`] naming the first processor that failed
    /// - [`AssetError::UnsafeClean`] if `clean_output` is set and the input
    ///   directory is the output directory or lies inside it
    /// - [`AssetError::Io`] if the output directory cannot be prepared
    /// - manifest errors from the post-build refresh
    pub async fn build(&self, ctx: &Context) -> Result<BuildReport> {
        let start = Instant::now();
        let config = &self.config;

        if config.clean_output {
            if is_within(&config.input_dir, &config.output_dir) {
                return Err(AssetError::UnsafeClean {
                    output: config.output_dir.clone(),
                    input: config.input_dir.clone(),
                });
            }
            clean_dir(&config.output_dir).await?;
        }
        tokio::fs::create_dir_all(&config.output_dir)
            .await
            .map_err(|e| AssetError::io(&config.output_dir, e))?;

        let mut processors_run = Vec::with_capacity(self.processors.len());
        for processor in &self.processors {
            if ctx.is_cancelled() {
                return Err(AssetError::Cancelled);
            }

            let name = processor.name().to_string();
            tracing::debug!(processor = %name, "running processor");

            if let Err(source) = processor.process(ctx, config).await {
                if ctx.is_cancelled() {
                    return Err(AssetError::Cancelled);
                }
                tracing::error!(processor = %name, error = %source, "processor failed");
                return Err(AssetError::Processor { name, source });
            }
            processors_run.push(name);
        }

        let manifest_entries = match (&self.manager, config.dev) {
            (Some(manager), false) => Some(self.write_manifest(manager).await?),
            _ => None,
        };

        let report = BuildReport {
            processors_run,
            duration: start.elapsed(),
            manifest_entries,
        };
        tracing::info!(
            processors = report.processors_run.len(),
            duration_ms = report.duration.as_millis() as u64,
            "build complete"
        );
        Ok(report)
    }

    async fn write_manifest(&self, manager: &Arc<AssetManager>) -> Result<usize> {
        let manager = Arc::clone(manager);
        let path = self.config.manifest_path.clone();

        let joined = tokio::task::spawn_blocking(move || {
            let own_entry = logical_path_in(&manager.fs().location(), &path);
            let manifest = manager.refresh_skipping(own_entry.as_deref())?;
            manifest.save(&path)?;
            Ok::<_, AssetError>(manifest.len())
        })
        .await;

        match joined {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(_) => Err(AssetError::Cancelled),
        }
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("processors", &self.processor_names())
            .field("manager", &self.manager.is_some())
            .finish()
    }
}

async fn clean_dir(dir: &Path) -> Result<()> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => {
            tracing::debug!(path = %dir.display(), "cleaned output directory");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(AssetError::io(dir, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ManagerOptions;
    use crate::error::BoxError;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::fs;
    use tempfile::TempDir;

    /// Records its invocation and optionally fails.
    struct Recording {
        name: &'static str,
        fail: bool,
        log: Arc<Mutex<Vec<&'static str>>>,
        file_types: Vec<String>,
    }

    impl Recording {
        fn new(name: &'static str, fail: bool, log: &Arc<Mutex<Vec<&'static str>>>) -> Self {
            Self {
                name,
                fail,
                log: Arc::clone(log),
                file_types: vec!["css".to_string()],
            }
        }
    }

    #[async_trait]
    impl Processor for Recording {
        fn name(&self) -> &str {
            self.name
        }

        async fn process(&self, _ctx: &Context, _config: &ProcessorConfig) -> Result<(), BoxError> {
            self.log.lock().push(self.name);
            if self.fail {
                return Err(format!("{} broke", self.name).into());
            }
            Ok(())
        }

        fn file_types(&self) -> &[String] {
            &self.file_types
        }
    }

    fn pipeline(temp: &TempDir) -> Pipeline {
        Pipeline::new(
            PipelineConfig::new(temp.path().join("assets"))
                .output_dir(temp.path().join("dist"))
                .dev(true),
        )
    }

    #[tokio::test]
    async fn test_processors_run_in_order() {
        let temp = TempDir::new().unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = pipeline(&temp);
        pipeline
            .add(Recording::new("a", false, &log))
            .add(Recording::new("b", false, &log))
            .add(Recording::new("c", false, &log));

        let report = pipeline.build(&Context::background()).await.unwrap();
        assert_eq!(*log.lock(), vec!["a", "b", "c"]);
        assert_eq!(report.processors_run, vec!["a", "b", "c"]);
        assert_eq!(report.manifest_entries, None);
        assert!(temp.path().join("dist").is_dir());
    }

    #[tokio::test]
    async fn test_build_fails_fast() {
        let temp = TempDir::new().unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = pipeline(&temp);
        pipeline
            .add(Recording::new("a", false, &log))
            .add(Recording::new("b", true, &log))
            .add(Recording::new("c", false, &log));

        let err = pipeline.build(&Context::background()).await.unwrap_err();
        assert_eq!(*log.lock(), vec!["a", "b"]);
        match err {
            AssetError::Processor { name, source } => {
                assert_eq!(name, "b");
                assert_eq!(source.to_string(), "b broke");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_cancelled_context_runs_nothing() {
        let temp = TempDir::new().unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = pipeline(&temp);
        pipeline.add(Recording::new("a", false, &log));

        let (ctx, handle) = Context::with_cancel();
        handle.cancel();

        let err = pipeline.build(&ctx).await.unwrap_err();
        assert!(matches!(err, AssetError::Cancelled));
        assert!(log.lock().is_empty());
    }

    #[tokio::test]
    async fn test_clean_output_removes_stale_files() {
        let temp = TempDir::new().unwrap();
        let dist = temp.path().join("dist");
        fs::create_dir_all(&dist).unwrap();
        fs::write(dist.join("stale.css"), "old").unwrap();

        let pipeline = Pipeline::new(
            PipelineConfig::new(temp.path().join("assets"))
                .output_dir(&dist)
                .clean_output(true),
        );
        pipeline.build(&Context::background()).await.unwrap();

        assert!(dist.is_dir());
        assert!(!dist.join("stale.css").exists());
    }

    #[tokio::test]
    async fn test_clean_output_never_deletes_sources() {
        let temp = TempDir::new().unwrap();
        let web = temp.path().join("web");
        fs::create_dir_all(web.join("src")).unwrap();
        fs::write(web.join("src/app.css"), "body{}").unwrap();

        for (input, output) in [
            (web.join("src"), web.clone()),
            (web.join("src"), web.join("src")),
            (web.join("src"), web.join("src/../")),
        ] {
            let mut pipeline = Pipeline::new(
                PipelineConfig::new(&input)
                    .output_dir(&output)
                    .clean_output(true),
            );
            pipeline.add(CopyProcessor::new(["css"]));

            let err = pipeline.build(&Context::background()).await.unwrap_err();
            assert!(matches!(err, AssetError::UnsafeClean { .. }), "{err:?}");
            assert!(web.join("src/app.css").is_file());
        }
    }

    #[tokio::test]
    async fn test_production_build_writes_manifest() {
        let temp = TempDir::new().unwrap();
        let assets = temp.path().join("assets");
        let dist = temp.path().join("dist");
        fs::create_dir_all(&assets).unwrap();
        fs::write(assets.join("app.css"), "body{color:red}").unwrap();

        let manager = Arc::new(AssetManager::disk(&dist, ManagerOptions::default()));
        let mut pipeline = Pipeline::new(PipelineConfig::new(&assets).output_dir(&dist))
            .with_manager(Arc::clone(&manager));
        pipeline.add(CopyProcessor::new(["css"]));

        let report = pipeline.build(&Context::background()).await.unwrap();
        assert_eq!(report.manifest_entries, Some(1));

        let saved = crate::assets::Manifest::load(dist.join("manifest.json")).unwrap();
        let fingerprinted = saved.get("app.css").unwrap();
        assert!(crate::assets::is_fingerprinted(fingerprinted));
        assert_eq!(manager.url("app.css"), format!("/static/{fingerprinted}"));
    }

    #[tokio::test]
    async fn test_manifest_does_not_list_itself() {
        let temp = TempDir::new().unwrap();
        let assets = temp.path().join("assets");
        let dist = temp.path().join("dist");
        fs::create_dir_all(&assets).unwrap();
        fs::write(assets.join("app.css"), "body{color:red}").unwrap();

        let manager = Arc::new(AssetManager::disk(&dist, ManagerOptions::default()));
        let mut pipeline = Pipeline::new(PipelineConfig::new(&assets).output_dir(&dist))
            .with_manager(Arc::clone(&manager));
        pipeline.add(CopyProcessor::new(["css"]));

        pipeline.build(&Context::background()).await.unwrap();
        let report = pipeline.build(&Context::background()).await.unwrap();
        assert_eq!(report.manifest_entries, Some(1));

        let saved = crate::assets::Manifest::load(dist.join("manifest.json")).unwrap();
        assert!(saved.get("manifest.json").is_none());
        assert!(manager.fingerprinted_path("manifest.json").is_none());
    }

    #[tokio::test]
    async fn test_dev_build_skips_manifest() {
        let temp = TempDir::new().unwrap();
        let dist = temp.path().join("dist");
        let manager = Arc::new(AssetManager::disk(&dist, ManagerOptions::default().dev(true)));
        let pipeline = pipeline(&temp).with_manager(manager);

        let report = pipeline.build(&Context::background()).await.unwrap();
        assert_eq!(report.manifest_entries, None);
        assert!(!dist.join("manifest.json").exists());
    }
}
