//! Cachet - asset pipeline with content fingerprinting and live reload.
//!
//! Cachet ships static web assets (CSS, JS, images) with cache-busting URLs,
//! runs pluggable build steps over them and drives a live-reload loop during
//! development.
//!
//! # Architecture
//!
//! - [`assets`] - fingerprinting, the manifest, URL resolution and the HTTP
//!   handler ([`AssetManager`])
//! - [`pipeline`] - ordered, fail-fast [`Processor`] execution ([`Pipeline`])
//! - [`dev`] - debounced [`FileWatcher`] and the SSE [`DevServer`]
//! - [`context`] - cooperative cancellation shared by builds and watchers
//! - [`error`] - the [`AssetError`] type
//!
//! # Example
//!
//! ```no_run
//! use cachet::{AssetManager, Context, CopyProcessor, ManagerOptions, Pipeline, PipelineConfig};
//! use std::sync::Arc;
//!
//! # async fn run() -> cachet::Result<()> {
//! let manager = Arc::new(AssetManager::disk("dist", ManagerOptions::default()));
//!
//! let mut pipeline = Pipeline::new(PipelineConfig::new("assets").output_dir("dist"))
//!     .with_manager(Arc::clone(&manager));
//! pipeline.add(CopyProcessor::new(["css", "js"]));
//! pipeline.build(&Context::background()).await?;
//!
//! // "/static/app.3f2a9c1d.css"
//! let url = manager.url("app.css");
//! let app = manager.router();
//! # let _ = (url, app);
//! # Ok(())
//! # }
//! ```

pub mod assets;
pub mod context;
pub mod dev;
pub mod error;
pub mod pipeline;

pub use assets::{
    AssetFs, AssetManager, DiskFs, EmbeddedFs, ManagerOptions, Manifest, DEFAULT_STATIC_PREFIX,
};
pub use context::{CancelHandle, Context};
pub use dev::{ChangeOutcome, DevServer, FileWatcher, WatchEvent, WatchOp, WatcherConfig};
pub use error::{AssetError, BoxError, Result};
pub use pipeline::{
    BuildReport, CommandProcessor, CopyProcessor, Pipeline, PipelineConfig, Processor,
    ProcessorConfig,
};
