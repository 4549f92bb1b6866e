//! Error types for the asset pipeline.
//!
//! A single error enum covers every failure the pipeline can surface. The
//! variants map onto how the failure is handled:
//!
//! - **Request errors** (`InvalidPath`, `NotFound`) terminate one HTTP request
//!   with 400 or 404 and never touch anything else.
//! - **Build errors** (`Processor`, `Cancelled`) abort the current
//!   [`Pipeline::build`](crate::Pipeline::build) call only.
//! - **Setup errors** (`WatcherSetup`, `AlreadyRunning`) are returned to the
//!   caller before any state is mutated.
//!
//! Fingerprinting I/O failures are reported as [`AssetError::Io`] by the
//! low-level functions, but [`AssetManager::url`](crate::AssetManager::url)
//! swallows them and degrades to the unfingerprinted path.

use axum::http::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

/// Boxed error returned by processors.
///
/// Processors are opaque collaborators, so any error type is accepted;
/// `anyhow::Error` converts into this with `.into()`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for the asset pipeline.
#[derive(Debug, Error)]
pub enum AssetError {
    /// Requested path escapes the asset root or is absolute
    #[error("Invalid asset path '{path}': {reason}")]
    InvalidPath {
        /// The rejected path as requested
        path: String,
        /// Which rule rejected it
        reason: &'static str,
    },

    /// Asset does not exist, or names a directory
    #[error("Asset not found: {0}")]
    NotFound(String),

    /// I/O failure while reading or writing a file
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// File being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Manifest (de)serialization failure
    #[error("Invalid manifest {}: {source}", .path.display())]
    Json {
        /// Manifest file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },

    /// A processor failed; the build stopped at this processor
    #[error("Processor '{name}' failed: {source}")]
    Processor {
        /// Name reported by the failing processor
        name: String,
        /// Error returned by the processor
        #[source]
        source: BoxError,
    },

    /// The build context was cancelled before the build completed
    #[error("Build cancelled")]
    Cancelled,

    /// A watch path could not be registered
    #[error("Failed to watch {}: {source}", .path.display())]
    WatcherSetup {
        /// Path that could not be watched
        path: PathBuf,
        /// Underlying notify error
        #[source]
        source: notify::Error,
    },

    /// Watcher runtime failure
    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),

    /// Invalid watch glob pattern
    #[error("Invalid watch pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// Pattern as given
        pattern: String,
        /// Parser message
        reason: String,
    },

    /// Cleaning the output directory would delete the input tree
    #[error(
        "Refusing to clean {}: it contains the input directory {}",
        .output.display(),
        .input.display()
    )]
    UnsafeClean {
        /// Output directory that would have been removed
        output: PathBuf,
        /// Input directory inside it
        input: PathBuf,
    },

    /// A component was started twice
    #[error("{0} is already running")]
    AlreadyRunning(&'static str),

    /// HTTP server failure
    #[error("Server error: {0}")]
    Server(String),
}

impl AssetError {
    /// Build an [`AssetError::Io`] for the given path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// HTTP status used when this error terminates an asset request.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AssetError::InvalidPath { .. } => StatusCode::BAD_REQUEST,
            AssetError::NotFound(_) => StatusCode::NOT_FOUND,
            AssetError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                StatusCode::NOT_FOUND
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether this is a missing-file condition.
    pub fn is_not_found(&self) -> bool {
        self.status_code() == StatusCode::NOT_FOUND
    }
}

/// Result type alias using [`AssetError`] as the default error type.
pub type Result<T, E = AssetError> = std::result::Result<T, E>;
