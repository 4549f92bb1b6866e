//! Asset manager: URL resolution, fingerprint cache and manifest ownership.
//!
//! Lookup order for a logical path in production mode:
//!
//! 1. The loaded [`Manifest`] (durable source of truth for a build)
//! 2. The in-memory fingerprint cache
//! 3. A fresh hash of the file, which is then cached
//!
//! In dev mode URLs are never fingerprinted and the filesystem is never read.
//!
//! The cache and the manifest share one `parking_lot::RwLock`. Hashing always
//! happens outside the lock; the result is inserted afterwards, so two tasks
//! racing on the same uncached path both compute the same value and whichever
//! writes last wins harmlessly.

use crate::assets::fingerprint::fingerprint_file;
use crate::assets::fs::{AssetFs, DiskFs};
use crate::assets::manifest::{generate_manifest, Manifest};
use crate::assets::path_guard::is_valid_path;
use crate::error::{AssetError, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default URL prefix for served assets.
pub const DEFAULT_STATIC_PREFIX: &str = "/static/";

/// Construction options for [`AssetManager`].
#[derive(Debug, Clone)]
pub struct ManagerOptions {
    /// URL prefix the handler is mounted under (normalised to `/x/`)
    pub static_prefix: String,
    /// Dev mode: no fingerprinting, short cache lifetimes
    pub dev: bool,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self {
            static_prefix: DEFAULT_STATIC_PREFIX.to_string(),
            dev: false,
        }
    }
}

impl ManagerOptions {
    pub fn dev(mut self, dev: bool) -> Self {
        self.dev = dev;
        self
    }

    pub fn static_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.static_prefix = prefix.into();
        self
    }
}

#[derive(Debug, Default)]
struct ManagerState {
    cache: HashMap<String, String>,
    manifest: Option<Manifest>,
}

/// Resolves public asset URLs and serves asset requests.
#[derive(Debug)]
pub struct AssetManager {
    fs: Arc<dyn AssetFs>,
    static_prefix: String,
    dev: bool,
    state: RwLock<ManagerState>,
}

impl AssetManager {
    /// Create a manager over an injected filesystem.
    pub fn new(fs: Arc<dyn AssetFs>, options: ManagerOptions) -> Self {
        Self {
            fs,
            static_prefix: normalize_prefix(&options.static_prefix),
            dev: options.dev,
            state: RwLock::new(ManagerState::default()),
        }
    }

    /// Create a manager serving a directory on disk.
    pub fn disk(root: impl Into<PathBuf>, options: ManagerOptions) -> Self {
        Self::new(Arc::new(DiskFs::new(root)), options)
    }

    /// The injected filesystem.
    pub fn fs(&self) -> &dyn AssetFs {
        self.fs.as_ref()
    }

    /// URL prefix, always with leading and trailing slash.
    pub fn static_prefix(&self) -> &str {
        &self.static_prefix
    }

    pub fn is_dev(&self) -> bool {
        self.dev
    }

    /// Public URL for a logical asset path.
    ///
    /// Never fails: if the file can't be hashed the unfingerprinted URL is
    /// returned and the error is logged.
    pub fn url(&self, path: &str) -> String {
        let logical = path.trim_start_matches('/');

        if self.dev {
            return format!("{}{}", self.static_prefix, logical);
        }

        if !is_valid_path(logical) {
            tracing::warn!(path = %logical, "refusing to fingerprint invalid asset path");
            return format!("{}{}", self.static_prefix, logical);
        }

        format!("{}{}", self.static_prefix, self.resolve(logical))
    }

    /// Fingerprinted path from the manifest or cache, without hashing.
    pub fn fingerprinted_path(&self, path: &str) -> Option<String> {
        let state = self.state.read();
        state
            .manifest
            .as_ref()
            .and_then(|m| m.get(path))
            .map(str::to_string)
            .or_else(|| state.cache.get(path).cloned())
    }

    /// Manifest, then cache, then a fresh hash.
    fn resolve(&self, logical: &str) -> String {
        if let Some(hit) = self.fingerprinted_path(logical) {
            return hit;
        }

        match fingerprint_file(self.fs.as_ref(), logical) {
            Ok(fingerprinted) => {
                tracing::debug!(path = %logical, fingerprinted = %fingerprinted, "fingerprinted asset");
                self.state
                    .write()
                    .cache
                    .insert(logical.to_string(), fingerprinted.clone());
                fingerprinted
            }
            Err(e) => {
                tracing::warn!(path = %logical, error = %e, "fingerprinting failed, serving unversioned URL");
                logical.to_string()
            }
        }
    }

    /// Hash every file in the tree and populate the cache.
    ///
    /// Meant for startup, not the request path. Entries are computed without
    /// holding the lock and inserted in one exclusive section, overwriting
    /// whatever lazy lookups cached in the meantime (last write wins; both
    /// writers hash the same bytes). A loaded manifest still takes precedence
    /// in [`url`](Self::url).
    ///
    /// Returns the number of cached entries.
    pub fn fingerprint_all(&self) -> Result<usize> {
        let computed = generate_manifest(self)?;
        let count = computed.len();

        let mut state = self.state.write();
        state.cache.extend(
            computed
                .iter()
                .map(|(logical, fingerprinted)| (logical.to_string(), fingerprinted.to_string())),
        );

        tracing::info!(assets = count, "fingerprinted asset tree");
        Ok(count)
    }

    /// Fingerprint the whole tree into a fresh manifest, ignoring caches.
    pub fn generate_manifest(&self) -> Result<Manifest> {
        generate_manifest(self)
    }

    /// Regenerate every fingerprint and install the result as the manifest.
    ///
    /// Used after a successful production build, when the previous manifest
    /// no longer describes the output.
    pub fn refresh(&self) -> Result<Manifest> {
        self.refresh_skipping(None::<&str>)
    }

    /// [`refresh`](Self::refresh), leaving the given logical paths out.
    ///
    /// Used to keep a manifest written inside the asset tree from listing
    /// itself.
    pub fn refresh_skipping<'a>(
        &self,
        skip: impl IntoIterator<Item = &'a str>,
    ) -> Result<Manifest> {
        let mut manifest = generate_manifest(self)?;
        for logical in skip {
            manifest.remove(logical);
        }

        let mut state = self.state.write();
        state.cache = manifest
            .iter()
            .map(|(logical, fingerprinted)| (logical.to_string(), fingerprinted.to_string()))
            .collect();
        state.manifest = Some(manifest.clone());

        Ok(manifest)
    }

    /// Load a manifest file and make it authoritative.
    ///
    /// Returns `false` without touching state if the file doesn't exist.
    pub fn load_manifest(&self, path: impl AsRef<Path>) -> Result<bool> {
        let path = path.as_ref();
        match Manifest::load_if_exists(path)? {
            Some(manifest) => {
                tracing::info!(path = %path.display(), entries = manifest.len(), "loaded asset manifest");
                self.set_manifest(manifest);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Install a manifest.
    pub fn set_manifest(&self, manifest: Manifest) {
        self.state.write().manifest = Some(manifest);
    }

    /// Snapshot of the loaded manifest.
    pub fn manifest(&self) -> Option<Manifest> {
        self.state.read().manifest.clone()
    }

    /// Write the loaded manifest to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::NotFound`] if no manifest is loaded.
    pub fn save_manifest(&self, path: impl AsRef<Path>) -> Result<()> {
        let manifest = self
            .manifest()
            .ok_or_else(|| AssetError::NotFound("no manifest loaded".to_string()))?;
        manifest.save(path)
    }

    /// Drop all cached fingerprints. The manifest is kept.
    pub fn clear_cache(&self) {
        self.state.write().cache.clear();
    }

    /// Number of cached fingerprints.
    pub fn cache_len(&self) -> usize {
        self.state.read().cache.len()
    }
}

/// `static` -> `/static/`, `` -> `/`
pub fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", trimmed)
    }
}
