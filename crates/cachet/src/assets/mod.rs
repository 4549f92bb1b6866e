//! Fingerprinted asset serving.
//!
//! - [`path_guard`] - request path validation
//! - [`fingerprint`] - content hashing and filename rewriting
//! - [`manifest`] - persisted logical -> fingerprinted mapping
//! - [`fs`] - filesystem abstraction (disk or embedded)
//! - [`manager`] - URL resolution and the fingerprint cache
//! - [`handler`] - the HTTP handler

pub mod fingerprint;
pub mod fs;
pub mod handler;
pub mod manager;
pub mod manifest;
pub mod path_guard;

pub use fingerprint::{
    fingerprint_file, fingerprinted_path, hash_content, is_fingerprinted, strip_fingerprint,
};
pub use fs::{is_within, logical_path_in, resolve_path, AssetFs, AssetMetadata, DiskFs, EmbeddedFs};
pub use handler::{ServedAsset, CACHE_IMMUTABLE, CACHE_SHORT};
pub use manager::{AssetManager, ManagerOptions, DEFAULT_STATIC_PREFIX};
pub use manifest::{generate_manifest, Manifest};
pub use path_guard::{is_valid_path, validate_path};
