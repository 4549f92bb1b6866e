//! Development loop: debounced watching, rebuilds and live reload.

pub mod server;
pub mod subscribers;
pub mod watcher;

pub use server::{
    ChangeOutcome, DevServer, CONNECTED_MESSAGE, EVENTS_PATH, RELOAD_MESSAGE, RELOAD_SCRIPT_PATH,
};
pub use subscribers::{SubscriberRegistry, Subscription, SUBSCRIBER_BUFFER};
pub use watcher::{
    FileWatcher, WatchEvent, WatchOp, WatcherConfig, DEFAULT_DEBOUNCE, DEFAULT_EXCLUDED_DIRS,
    DEFAULT_GENERATED_PREFIXES,
};
