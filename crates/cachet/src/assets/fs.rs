//! Filesystem abstraction for asset lookup.
//!
//! The [`AssetManager`](crate::AssetManager) never touches `std::fs` directly;
//! it goes through an injected [`AssetFs`]. Two backends ship with the crate:
//!
//! - [`DiskFs`]: a directory on disk, walked with `walkdir`
//! - [`EmbeddedFs`]: files compiled into the binary with `rust-embed`
//!
//! All paths are logical: relative, `/`-separated, no leading slash. Callers
//! validate them with [`validate_path`](crate::assets::validate_path) first.

use rust_embed::RustEmbed;
use std::fmt;
use std::io;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use walkdir::WalkDir;

/// Metadata for a single entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetMetadata {
    /// Entry is a directory
    pub is_dir: bool,
    /// Size in bytes (0 for directories)
    pub len: u64,
    /// Last modification time, when the backend knows it
    pub modified: Option<SystemTime>,
}

/// Read-only view of an asset tree.
pub trait AssetFs: Send + Sync + fmt::Debug {
    /// Read a whole file.
    fn read(&self, path: &str) -> io::Result<Vec<u8>>;

    /// Stat an entry. Directories must report `is_dir`.
    fn metadata(&self, path: &str) -> io::Result<AssetMetadata>;

    /// Every file in the tree as a logical path, sorted.
    fn walk(&self) -> io::Result<Vec<String>>;

    /// Where the tree lives, for error messages.
    fn location(&self) -> PathBuf {
        PathBuf::from("<assets>")
    }
}

/// Assets served from a directory on disk.
#[derive(Debug, Clone)]
pub struct DiskFs {
    root: PathBuf,
}

impl DiskFs {
    /// Create a backend rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

impl AssetFs for DiskFs {
    fn read(&self, path: &str) -> io::Result<Vec<u8>> {
        std::fs::read(self.resolve(path))
    }

    fn metadata(&self, path: &str) -> io::Result<AssetMetadata> {
        let meta = std::fs::metadata(self.resolve(path))?;
        Ok(AssetMetadata {
            is_dir: meta.is_dir(),
            len: if meta.is_dir() { 0 } else { meta.len() },
            modified: meta.modified().ok(),
        })
    }

    fn walk(&self) -> io::Result<Vec<String>> {
        let mut files = Vec::new();

        for entry in WalkDir::new(&self.root).follow_links(true) {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };

            files.push(to_logical(relative));
        }

        files.sort();
        Ok(files)
    }

    fn location(&self) -> PathBuf {
        self.root.clone()
    }
}

/// Absolute, symlink-free form of `path`, which need not exist yet.
///
/// The longest existing ancestor is canonicalized and the missing tail is
/// appended as given.
pub fn resolve_path(path: &Path) -> PathBuf {
    let Ok(absolute) = std::path::absolute(path) else {
        return path.to_path_buf();
    };

    let mut existing = absolute.as_path();
    let mut missing = Vec::new();
    loop {
        if let Ok(canonical) = existing.canonicalize() {
            return missing
                .iter()
                .rev()
                .fold(canonical, |acc, part| acc.join(part));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => return absolute,
        }
    }
}

/// Whether `inner` is `outer` or lies beneath it, however either is spelled.
pub fn is_within(inner: &Path, outer: &Path) -> bool {
    resolve_path(inner).starts_with(resolve_path(outer))
}

/// `path` relative to `root` as a logical path, if it lies inside `root`.
pub fn logical_path_in(root: &Path, path: &Path) -> Option<String> {
    let root = resolve_path(root);
    let path = resolve_path(path);
    path.strip_prefix(&root)
        .ok()
        .filter(|relative| !relative.as_os_str().is_empty())
        .map(to_logical)
}

/// Join path components with `/` regardless of platform.
fn to_logical(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Assets embedded into the binary at compile time.
///
/// ```rust,ignore
/// #[derive(rust_embed::RustEmbed)]
/// #[folder = "public/"]
/// struct Public;
///
/// let fs = cachet::EmbeddedFs::<Public>::new();
/// ```
pub struct EmbeddedFs<E> {
    _marker: PhantomData<fn() -> E>,
}

impl<E: RustEmbed> EmbeddedFs<E> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }

    fn is_dir(path: &str) -> bool {
        if path.is_empty() {
            return true;
        }
        let prefix = format!("{}/", path.trim_end_matches('/'));
        E::iter().any(|name| name.starts_with(&prefix))
    }
}

impl<E: RustEmbed> Default for EmbeddedFs<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for EmbeddedFs<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddedFs")
            .field("assets", &std::any::type_name::<E>())
            .finish()
    }
}

impl<E: RustEmbed> AssetFs for EmbeddedFs<E> {
    fn read(&self, path: &str) -> io::Result<Vec<u8>> {
        E::get(path)
            .map(|file| file.data.into_owned())
            .ok_or_else(|| not_found(path))
    }

    fn metadata(&self, path: &str) -> io::Result<AssetMetadata> {
        if let Some(file) = E::get(path) {
            return Ok(AssetMetadata {
                is_dir: false,
                len: file.data.len() as u64,
                modified: file
                    .metadata
                    .last_modified()
                    .map(|secs| UNIX_EPOCH + Duration::from_secs(secs)),
            });
        }

        if Self::is_dir(path) {
            return Ok(AssetMetadata {
                is_dir: true,
                len: 0,
                modified: None,
            });
        }

        Err(not_found(path))
    }

    fn walk(&self) -> io::Result<Vec<String>> {
        let mut files: Vec<String> = E::iter().map(|name| name.into_owned()).collect();
        files.sort();
        Ok(files)
    }

    fn location(&self) -> PathBuf {
        PathBuf::from(format!("<embedded {}>", std::any::type_name::<E>()))
    }
}

fn not_found(path: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("embedded asset not found: {}", path),
    )
}
