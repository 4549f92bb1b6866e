//! Debounced file watcher.
//!
//! Watches explicit paths and glob patterns, keeps only create and write
//! events, drops anything under build-output / VCS / dependency directories
//! or named like generated output, and coalesces bursts with a single
//! trailing timer. When the timer fires, only the most recent event is
//! delivered (last event wins across the whole watcher, not per file).

use crate::context::Context;
use crate::error::{AssetError, BoxError, Result};
use ignore::overrides::{Override, OverrideBuilder};
use notify::event::{EventKind, ModifyKind};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use std::future::Future;
use std::path::{Component, Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Default debounce window.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Directory names whose contents never trigger a rebuild.
pub const DEFAULT_EXCLUDED_DIRS: &[&str] = &[
    "dist",
    "build",
    "node_modules",
    "vendor",
    ".git",
    ".svn",
    ".hg",
    ".cache",
    "target",
];

/// File name prefixes that mark generated output.
pub const DEFAULT_GENERATED_PREFIXES: &[&str] = &["output.", "bundle.", "generated."];

/// Kind of change that qualified an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchOp {
    Create,
    Write,
}

/// A qualifying file change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub path: PathBuf,
    pub op: WatchOp,
}

impl WatchEvent {
    pub fn new(path: impl Into<PathBuf>, op: WatchOp) -> Self {
        Self {
            path: path.into(),
            op,
        }
    }
}

/// Filtering and debounce settings.
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    pub debounce: Duration,
    pub exclude_dirs: Vec<String>,
    pub generated_prefixes: Vec<String>,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            exclude_dirs: DEFAULT_EXCLUDED_DIRS.iter().map(|s| s.to_string()).collect(),
            generated_prefixes: DEFAULT_GENERATED_PREFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl WatcherConfig {
    pub fn debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Add directory names to the exclusion list.
    pub fn exclude<I, S>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_dirs.extend(dirs.into_iter().map(Into::into));
        self
    }
}

type CallbackFuture = Pin<Box<dyn Future<Output = Result<(), BoxError>> + Send>>;
type Callback = Arc<dyn Fn(WatchEvent) -> CallbackFuture + Send + Sync>;
type Incoming = std::result::Result<WatchEvent, notify::Error>;

/// A registered watch root, optionally narrowed by a glob.
struct WatchTarget {
    root: PathBuf,
    matcher: Option<Override>,
}

impl WatchTarget {
    fn matches(&self, path: &Path) -> bool {
        if !path.starts_with(&self.root) {
            return false;
        }
        match &self.matcher {
            Some(matcher) => matcher.matched(path, false).is_whitelist(),
            None => true,
        }
    }
}

/// Debounced file watcher.
pub struct FileWatcher {
    config: WatcherConfig,
    watcher: Mutex<Option<RecommendedWatcher>>,
    tx: Mutex<Option<mpsc::UnboundedSender<Incoming>>>,
    rx: Mutex<Option<mpsc::UnboundedReceiver<Incoming>>>,
    targets: Mutex<Vec<WatchTarget>>,
    callbacks: Mutex<Vec<Callback>>,
}

impl FileWatcher {
    /// Create a watcher. Nothing is watched until paths or patterns are added.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::Watch`] if the platform watcher can't be created.
    pub fn new(config: WatcherConfig) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let notify_tx = tx.clone();

        let watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                for change in translate(event) {
                    let _ = notify_tx.send(Ok(change));
                }
            }
            Err(e) => {
                let _ = notify_tx.send(Err(e));
            }
        })?;

        Ok(Self {
            config,
            watcher: Mutex::new(Some(watcher)),
            tx: Mutex::new(Some(tx)),
            rx: Mutex::new(Some(rx)),
            targets: Mutex::new(Vec::new()),
            callbacks: Mutex::new(Vec::new()),
        })
    }

    pub fn config(&self) -> &WatcherConfig {
        &self.config
    }

    /// Watch a file or directory (recursively).
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::WatcherSetup`] naming the path if it can't be
    /// watched, for example because it doesn't exist.
    pub fn add_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let root = absolute(path.as_ref());
        self.watch_root(&root)?;
        self.targets.lock().push(WatchTarget {
            root,
            matcher: None,
        });
        Ok(())
    }

    /// Watch files matching a glob such as `assets/**/*.css`.
    ///
    /// The literal directory prefix of the pattern is watched recursively and
    /// events under it are kept only if they match the glob.
    pub fn add_pattern(&self, pattern: &str) -> Result<()> {
        let (base, glob) = split_glob(pattern);
        let Some(glob) = glob else {
            return self.add_path(base);
        };

        let root = absolute(&base);
        let matcher = OverrideBuilder::new(&root)
            .add(&glob)
            .and_then(|builder| builder.build())
            .map_err(|e| AssetError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;

        self.watch_root(&root)?;
        self.targets.lock().push(WatchTarget {
            root,
            matcher: Some(matcher),
        });
        Ok(())
    }

    fn watch_root(&self, root: &Path) -> Result<()> {
        let mut guard = self.watcher.lock();
        let watcher = guard
            .as_mut()
            .ok_or_else(|| AssetError::Server("file watcher is closed".to_string()))?;
        watcher
            .watch(root, RecursiveMode::Recursive)
            .map_err(|source| AssetError::WatcherSetup {
                path: root.to_path_buf(),
                source,
            })?;
        tracing::debug!(path = %root.display(), "watching");
        Ok(())
    }

    /// Register a change callback. Callbacks run in registration order; an
    /// error is logged and the remaining callbacks still run.
    pub fn on_change<F, Fut>(&self, callback: F)
    where
        F: Fn(WatchEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        let callback: Callback = Arc::new(move |event| -> CallbackFuture { Box::pin(callback(event)) });
        self.callbacks.lock().push(callback);
    }

    /// Push a synthetic event through the same filter and debounce path as
    /// OS events. Ignored once the watcher is closed.
    pub fn emit(&self, event: WatchEvent) {
        if let Some(tx) = self.tx.lock().as_ref() {
            let _ = tx.send(Ok(event));
        }
    }

    /// Whether a path is excluded regardless of registered targets.
    pub fn should_ignore(&self, path: &Path) -> bool {
        let in_excluded_dir = path.components().any(|component| match component {
            Component::Normal(name) => self
                .config
                .exclude_dirs
                .iter()
                .any(|dir| name.to_str() == Some(dir.as_str())),
            _ => false,
        });
        if in_excluded_dir {
            return true;
        }

        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| {
                self.config
                    .generated_prefixes
                    .iter()
                    .any(|prefix| name.starts_with(prefix.as_str()))
            })
    }

    fn qualifies(&self, event: &WatchEvent) -> bool {
        if self.should_ignore(&event.path) {
            return false;
        }
        let targets = self.targets.lock();
        targets.is_empty() || targets.iter().any(|t| t.matches(&event.path))
    }

    /// Run the event loop until `ctx` is cancelled or the watcher is closed.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::AlreadyRunning`] if the loop was already started.
    pub async fn start(&self, ctx: &Context) -> Result<()> {
        let mut rx = self
            .rx
            .lock()
            .take()
            .ok_or(AssetError::AlreadyRunning("file watcher"))?;

        let debounce = self.config.debounce;
        let timer = tokio::time::sleep(debounce);
        tokio::pin!(timer);
        let mut pending: Option<WatchEvent> = None;

        loop {
            tokio::select! {
                _ = ctx.cancelled() => {
                    tracing::debug!("watcher cancelled");
                    break;
                }
                incoming = rx.recv() => match incoming {
                    Some(Ok(event)) => {
                        if self.qualifies(&event) {
                            tracing::trace!(path = %event.path.display(), op = ?event.op, "change queued");
                            pending = Some(event);
                            timer.as_mut().reset(Instant::now() + debounce);
                        }
                    }
                    Some(Err(e)) => tracing::warn!(error = %e, "watch error"),
                    None => {
                        tracing::debug!("watch source closed");
                        break;
                    }
                },
                _ = &mut timer, if pending.is_some() => {
                    if let Some(event) = pending.take() {
                        self.deliver(event);
                    }
                }
            }
        }

        Ok(())
    }

    fn deliver(&self, event: WatchEvent) {
        let callbacks: Vec<Callback> = self.callbacks.lock().clone();
        if callbacks.is_empty() {
            return;
        }

        tracing::debug!(path = %event.path.display(), "delivering change");
        tokio::spawn(async move {
            for callback in callbacks {
                if let Err(e) = callback(event.clone()).await {
                    tracing::warn!(path = %event.path.display(), error = %e, "change callback failed");
                }
            }
        });
    }

    /// Release OS watch resources and stop accepting events. A running
    /// [`start`](Self::start) loop returns once buffered events drain.
    pub fn close(&self) {
        self.watcher.lock().take();
        self.tx.lock().take();
    }
}

impl std::fmt::Debug for FileWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let roots: Vec<PathBuf> = self.targets.lock().iter().map(|t| t.root.clone()).collect();
        f.debug_struct("FileWatcher")
            .field("config", &self.config)
            .field("roots", &roots)
            .field("callbacks", &self.callbacks.lock().len())
            .finish()
    }
}

fn translate(event: Event) -> Vec<WatchEvent> {
    let op = match event.kind {
        EventKind::Create(_) => WatchOp::Create,
        EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any) => WatchOp::Write,
        _ => return Vec::new(),
    };
    event
        .paths
        .into_iter()
        .map(|path| WatchEvent::new(path, op))
        .collect()
}

/// `assets/**/*.css` -> (`assets`, `**/*.css`)
fn split_glob(pattern: &str) -> (PathBuf, Option<String>) {
    let mut base = PathBuf::new();
    let mut rest: Vec<&str> = Vec::new();

    for segment in pattern.split('/') {
        if rest.is_empty() && !segment.contains(['*', '?', '[', '{']) {
            base.push(if segment.is_empty() { "/" } else { segment });
        } else {
            rest.push(segment);
        }
    }

    if rest.is_empty() {
        return (base, None);
    }
    if base.as_os_str().is_empty() {
        base.push(".");
    }
    (base, Some(rest.join("/")))
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn watcher() -> FileWatcher {
        FileWatcher::new(WatcherConfig::default().debounce(Duration::from_millis(50))).unwrap()
    }

    #[test]
    fn test_split_glob() {
        assert_eq!(
            split_glob("assets/**/*.css"),
            (PathBuf::from("assets"), Some("**/*.css".to_string()))
        );
        assert_eq!(split_glob("*.js"), (PathBuf::from("."), Some("*.js".to_string())));
        assert_eq!(split_glob("assets/css"), (PathBuf::from("assets/css"), None));
    }

    #[test]
    fn test_should_ignore_excluded_dirs() {
        let watcher = watcher();
        assert!(watcher.should_ignore(Path::new("/p/node_modules/x/index.js")));
        assert!(watcher.should_ignore(Path::new("/p/dist/app.css")));
        assert!(watcher.should_ignore(Path::new("/p/.git/HEAD")));
        assert!(!watcher.should_ignore(Path::new("/p/assets/app.css")));
        assert!(!watcher.should_ignore(Path::new("/p/assets/distribution.css")));
    }

    #[test]
    fn test_should_ignore_generated_names() {
        let watcher = watcher();
        assert!(watcher.should_ignore(Path::new("/p/assets/bundle.js")));
        assert!(watcher.should_ignore(Path::new("/p/assets/output.css")));
        assert!(!watcher.should_ignore(Path::new("/p/assets/app.js")));
    }

    #[test]
    fn test_translate_keeps_create_and_write_only() {
        use notify::event::{CreateKind, DataChange, RemoveKind};

        let create = Event::new(EventKind::Create(CreateKind::File)).add_path("/a".into());
        assert_eq!(translate(create), vec![WatchEvent::new("/a", WatchOp::Create)]);

        let write = Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
            .add_path("/b".into());
        assert_eq!(translate(write), vec![WatchEvent::new("/b", WatchOp::Write)]);

        let remove = Event::new(EventKind::Remove(RemoveKind::File)).add_path("/c".into());
        assert!(translate(remove).is_empty());
    }

    #[test]
    fn test_add_path_missing_dir_names_path() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope");
        match watcher().add_path(&missing) {
            Err(AssetError::WatcherSetup { path, .. }) => assert!(path.ends_with("nope")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_pattern_filters_events() {
        let temp = TempDir::new().unwrap();
        let watcher = watcher();
        let pattern = format!("{}/**/*.css", temp.path().display());
        watcher.add_pattern(&pattern).unwrap();

        let css = WatchEvent::new(temp.path().join("a/site.css"), WatchOp::Write);
        let js = WatchEvent::new(temp.path().join("a/site.js"), WatchOp::Write);
        assert!(watcher.qualifies(&css));
        assert!(!watcher.qualifies(&js));
    }

    #[test]
    fn test_invalid_pattern() {
        let temp = TempDir::new().unwrap();
        let pattern = format!("{}/[*.css", temp.path().display());
        assert!(matches!(
            watcher().add_pattern(&pattern),
            Err(AssetError::InvalidPattern { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_is_coalesced_to_last_event() {
        let watcher = Arc::new(watcher());
        let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();
        watcher.on_change(move |event| {
            let seen_tx = seen_tx.clone();
            async move {
                let _ = seen_tx.send(event);
                Ok(())
            }
        });

        let (ctx, handle) = Context::with_cancel();
        let loop_watcher = Arc::clone(&watcher);
        let task = tokio::spawn(async move { loop_watcher.start(&ctx).await });

        watcher.emit(WatchEvent::new("/p/a.css", WatchOp::Write));
        watcher.emit(WatchEvent::new("/p/b.css", WatchOp::Write));
        watcher.emit(WatchEvent::new("/p/dist/c.css", WatchOp::Write));

        let first = tokio::time::timeout(Duration::from_secs(1), seen_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.path, PathBuf::from("/p/b.css"));

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(seen_rx.try_recv().is_err());

        handle.cancel();
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_callback_does_not_stop_others() {
        let watcher = Arc::new(watcher());
        let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();
        watcher.on_change(|_| async { Err::<(), BoxError>("nope".into()) });
        watcher.on_change(move |event| {
            let seen_tx = seen_tx.clone();
            async move {
                let _ = seen_tx.send(event.path);
                Ok(())
            }
        });

        let (ctx, handle) = Context::with_cancel();
        let loop_watcher = Arc::clone(&watcher);
        let task = tokio::spawn(async move { loop_watcher.start(&ctx).await });

        watcher.emit(WatchEvent::new("/p/a.css", WatchOp::Create));
        let path = tokio::time::timeout(Duration::from_secs(1), seen_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(path, PathBuf::from("/p/a.css"));

        handle.cancel();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_second_start_is_rejected_and_close_ends_loop() {
        let watcher = Arc::new(watcher());
        let loop_watcher = Arc::clone(&watcher);
        let task = tokio::spawn(async move { loop_watcher.start(&Context::background()).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(matches!(
            watcher.start(&Context::background()).await,
            Err(AssetError::AlreadyRunning(_))
        ));

        watcher.close();
        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }
}
