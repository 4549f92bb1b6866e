//! Persisted logical-path to fingerprinted-path mapping.
//!
//! On disk the manifest is a flat JSON object with 2-space indentation:
//!
//! ```json
//! {
//!   "css/app.css": "css/app.3f2a9c01.css",
//!   "js/main.js": "js/main.77e0b1d4.js"
//! }
//! ```
//!
//! Keys are kept sorted so that regenerating an unchanged tree produces a
//! byte-identical file.

use crate::assets::fingerprint::fingerprint_file;
use crate::assets::manager::AssetManager;
use crate::error::{AssetError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Logical path -> fingerprinted path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: BTreeMap<String, String>,
}

impl Manifest {
    /// Create an empty manifest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a manifest file.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::Io`] if the file can't be read (including when it
    /// doesn't exist) and [`AssetError::Json`] if it isn't a JSON object of
    /// strings.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| AssetError::io(path, e))?;
        serde_json::from_str(&content).map_err(|source| AssetError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load a manifest if the file exists.
    pub fn load_if_exists(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }
        Self::load(path).map(Some)
    }

    /// Write the manifest, creating parent directories as needed.
    ///
    /// The file is written to a sibling temp file first and renamed into place
    /// so readers never observe a half-written manifest.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| AssetError::io(parent, e))?;
        }

        let mut json = serde_json::to_string_pretty(self).map_err(|source| AssetError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        json.push('\n');

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| AssetError::io(&tmp, e))?;
        std::fs::rename(&tmp, path).map_err(|e| AssetError::io(path, e))?;

        Ok(())
    }

    /// Fingerprinted path for a logical path.
    pub fn get(&self, logical: &str) -> Option<&str> {
        self.entries.get(logical).map(String::as_str)
    }

    /// Insert or replace an entry.
    pub fn insert(&mut self, logical: impl Into<String>, fingerprinted: impl Into<String>) {
        self.entries.insert(logical.into(), fingerprinted.into());
    }

    /// Drop an entry, returning its fingerprinted path.
    pub fn remove(&mut self, logical: &str) -> Option<String> {
        self.entries.remove(logical)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for Manifest {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Fingerprint every file under the manager's asset root.
///
/// Bypasses both the manager's cache and any loaded manifest: every file is
/// read and hashed. Files that fail to read are logged and left out.
///
/// # Errors
///
/// Returns [`AssetError::Io`] if the tree itself can't be walked.
pub fn generate_manifest(manager: &AssetManager) -> Result<Manifest> {
    let fs = manager.fs();
    let files = fs
        .walk()
        .map_err(|e| AssetError::io(fs.location(), e))?;

    let mut manifest = Manifest::new();
    for logical in files {
        match fingerprint_file(fs, &logical) {
            Ok(fingerprinted) => manifest.insert(logical, fingerprinted),
            Err(e) => tracing::warn!(path = %logical, error = %e, "skipping unreadable asset"),
        }
    }

    tracing::debug!(entries = manifest.len(), "generated manifest");
    Ok(manifest)
}
