//! Development server: rebuild on change, push reloads over Server-Sent Events.
//!
//! The server composes a [`Pipeline`], a [`FileWatcher`] and a
//! [`SubscriberRegistry`]. A single "build in progress" flag guards rebuilds;
//! changes arriving while a build runs are dropped, not queued.

use crate::context::Context;
use crate::dev::subscribers::SubscriberRegistry;
use crate::dev::watcher::{FileWatcher, WatchEvent};
use crate::error::{AssetError, Result};
use crate::pipeline::Pipeline;
use axum::{
    extract::State,
    http::header,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    routing::get,
    Router,
};
use parking_lot::Mutex;
use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

/// SSE endpoint path.
pub const EVENTS_PATH: &str = "/__cachet/events";

/// Reload client script path.
pub const RELOAD_SCRIPT_PATH: &str = "/__cachet/reload.js";

/// Message sent to subscribers after a successful rebuild.
pub const RELOAD_MESSAGE: &str = "reload";

/// First message on every SSE connection.
pub const CONNECTED_MESSAGE: &str = "connected";

const RELOAD_SCRIPT: &str = include_str!("../../assets/reload-client.js");

/// Result of handling one change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOutcome {
    /// Build succeeded and a reload was broadcast
    Rebuilt,
    /// Build failed; no reload was sent
    Failed,
    /// Another build was in progress; the change was dropped
    Skipped,
}

/// Live-reload development server.
pub struct DevServer {
    pipeline: Arc<Pipeline>,
    watcher: Arc<FileWatcher>,
    subscribers: Arc<SubscriberRegistry>,
    building: Mutex<bool>,
    running: AtomicBool,
    ctx: Mutex<Context>,
}

/// Clears the build flag when dropped, including on panic or cancellation.
struct BuildGuard<'a>(&'a Mutex<bool>);

impl Drop for BuildGuard<'_> {
    fn drop(&mut self) {
        *self.0.lock() = false;
    }
}

impl DevServer {
    /// Create the server and subscribe it to the watcher's change events.
    pub fn new(pipeline: Arc<Pipeline>, watcher: FileWatcher) -> Arc<Self> {
        let server = Arc::new(Self {
            pipeline,
            watcher: Arc::new(watcher),
            subscribers: SubscriberRegistry::new(),
            building: Mutex::new(false),
            running: AtomicBool::new(false),
            ctx: Mutex::new(Context::background()),
        });

        let weak: Weak<Self> = Arc::downgrade(&server);
        server.watcher.on_change(move |event| {
            let weak = weak.clone();
            async move {
                if let Some(server) = weak.upgrade() {
                    server.handle_change(&event).await;
                }
                Ok(())
            }
        });

        server
    }

    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }

    pub fn watcher(&self) -> &Arc<FileWatcher> {
        &self.watcher
    }

    pub fn subscribers(&self) -> &Arc<SubscriberRegistry> {
        &self.subscribers
    }

    pub fn is_building(&self) -> bool {
        *self.building.lock()
    }

    /// Run the watch loop until `ctx` is cancelled.
    ///
    /// Rebuilds triggered by the watcher run under `ctx`, so cancelling it
    /// also reaches in-flight processors. All SSE streams are closed on exit.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::AlreadyRunning`] if called while running.
    pub async fn start(self: &Arc<Self>, ctx: &Context) -> Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(AssetError::AlreadyRunning("dev server"));
        }
        *self.ctx.lock() = ctx.clone();

        tracing::info!("dev server watching for changes");
        let result = self.watcher.start(ctx).await;

        self.subscribers.close_all();
        self.running.store(false, Ordering::SeqCst);
        tracing::info!("dev server stopped");
        result
    }

    /// Rebuild for one change unless a build is already running.
    pub async fn handle_change(&self, event: &WatchEvent) -> ChangeOutcome {
        let Some(_guard) = self.try_begin_build() else {
            tracing::debug!(path = %event.path.display(), "build in progress, change dropped");
            return ChangeOutcome::Skipped;
        };

        tracing::info!(path = %event.path.display(), "change detected, rebuilding");
        let ctx = self.ctx.lock().clone();

        match self.pipeline.build(&ctx).await {
            Ok(report) => {
                let clients = self.broadcast(RELOAD_MESSAGE);
                tracing::info!(
                    duration_ms = report.duration.as_millis() as u64,
                    clients,
                    "rebuilt, reload sent"
                );
                ChangeOutcome::Rebuilt
            }
            Err(AssetError::Cancelled) => {
                tracing::debug!("rebuild cancelled");
                ChangeOutcome::Failed
            }
            Err(e) => {
                tracing::error!(error = %e, "rebuild failed, skipping reload");
                ChangeOutcome::Failed
            }
        }
    }

    fn try_begin_build(&self) -> Option<BuildGuard<'_>> {
        let mut building = self.building.lock();
        if *building {
            return None;
        }
        *building = true;
        Some(BuildGuard(&self.building))
    }

    /// Send a message to every connected client. Returns the number reached.
    pub fn broadcast(&self, message: &str) -> usize {
        self.subscribers.broadcast(message)
    }

    /// Router with the SSE endpoint and the reload client script.
    pub fn router(self: &Arc<Self>) -> Router {
        Router::new()
            .route(EVENTS_PATH, get(handle_sse))
            .route(RELOAD_SCRIPT_PATH, get(handle_reload_script))
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
            .with_state(Arc::clone(self))
    }
}

impl std::fmt::Debug for DevServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DevServer")
            .field("pipeline", &self.pipeline)
            .field("subscribers", &self.subscribers.len())
            .field("building", &self.is_building())
            .field("running", &self.running.load(Ordering::Relaxed))
            .finish()
    }
}

/// Stream reload notifications to one browser.
async fn handle_sse(State(server): State<Arc<DevServer>>) -> impl IntoResponse {
    let mut subscription = server.subscribers.subscribe();

    // Dropping the stream (client disconnect) drops the subscription, which
    // unregisters it.
    let stream = async_stream::stream! {
        yield Ok::<_, Infallible>(Event::default().data(CONNECTED_MESSAGE));
        while let Some(message) = subscription.recv().await {
            yield Ok(Event::default().data(message));
        }
    };

    (
        [
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        ],
        Sse::new(stream).keep_alive(
            KeepAlive::new()
                .interval(Duration::from_secs(15))
                .text("ping"),
        ),
    )
}

async fn handle_reload_script() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/javascript; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        RELOAD_SCRIPT,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dev::watcher::{WatchOp, WatcherConfig};
    use crate::pipeline::PipelineConfig;
    use tempfile::TempDir;

    fn server(temp: &TempDir) -> Arc<DevServer> {
        let pipeline = Pipeline::new(
            PipelineConfig::new(temp.path().join("assets"))
                .output_dir(temp.path().join("out"))
                .dev(true),
        );
        let watcher = FileWatcher::new(WatcherConfig::default()).unwrap();
        DevServer::new(Arc::new(pipeline), watcher)
    }

    #[tokio::test]
    async fn test_successful_change_broadcasts_reload() {
        let temp = TempDir::new().unwrap();
        let server = server(&temp);
        let mut sub = server.subscribers().subscribe();

        let outcome = server
            .handle_change(&WatchEvent::new("/p/app.css", WatchOp::Write))
            .await;

        assert_eq!(outcome, ChangeOutcome::Rebuilt);
        assert_eq!(sub.recv().await.as_deref(), Some(RELOAD_MESSAGE));
        assert!(!server.is_building());
    }

    #[tokio::test]
    async fn test_guard_skips_overlapping_change() {
        let temp = TempDir::new().unwrap();
        let server = server(&temp);

        let guard = server.try_begin_build().unwrap();
        let outcome = server
            .handle_change(&WatchEvent::new("/p/app.css", WatchOp::Write))
            .await;
        assert_eq!(outcome, ChangeOutcome::Skipped);

        drop(guard);
        assert!(!server.is_building());
    }

    #[tokio::test]
    async fn test_start_twice_is_rejected() {
        let temp = TempDir::new().unwrap();
        let server = server(&temp);
        let (ctx, handle) = Context::with_cancel();

        let running = Arc::clone(&server);
        let loop_ctx = ctx.clone();
        let task = tokio::spawn(async move { running.start(&loop_ctx).await });
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(matches!(
            server.start(&ctx).await,
            Err(AssetError::AlreadyRunning(_))
        ));

        handle.cancel();
        task.await.unwrap().unwrap();
    }
}
