//! Content fingerprinting.
//!
//! A fingerprint is the first 8 hex characters of the SHA-256 digest of a
//! file's bytes, embedded immediately before the final extension:
//!
//! ```text
//! css/app.css  ->  css/app.3f2a9c01.css
//! ```
//!
//! Detection only ever looks at the file name, never at directory segments,
//! and requires exactly 8 lowercase hex digits followed by an extension.
//! Files without an extension are never fingerprinted.

use crate::assets::fs::AssetFs;
use crate::error::{AssetError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

/// Number of hex characters kept from the digest.
pub const FINGERPRINT_LEN: usize = 8;

static FINGERPRINT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+)\.([a-f0-9]{8})(\.[^.]+)$").expect("valid fingerprint regex"));

/// Hash bytes into an 8-character lowercase hex fingerprint.
pub fn hash_content(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    let mut hex = format!("{:x}", digest);
    hex.truncate(FINGERPRINT_LEN);
    hex
}

/// Read a logical path through `fs` and return its fingerprinted path.
///
/// # Errors
///
/// Returns [`AssetError::Io`] if the file cannot be read.
pub fn fingerprint_file(fs: &dyn AssetFs, path: &str) -> Result<String> {
    let content = fs.read(path).map_err(|e| AssetError::io(path, e))?;
    Ok(fingerprinted_path(path, &hash_content(&content)))
}

/// Embed `hash` before the final extension of `path`.
///
/// Paths whose file name has no extension are returned unchanged.
pub fn fingerprinted_path(path: &str, hash: &str) -> String {
    let (dir, name) = split_name(path);
    match extension_start(name) {
        Some(dot) => format!("{}{}.{}{}", dir, &name[..dot], hash, &name[dot..]),
        None => path.to_string(),
    }
}

/// Split a fingerprinted path into `(path without fingerprint, hash)`.
///
/// Returns `None` for anything that does not match `name.<8 hex>.ext`.
pub fn split_fingerprint(path: &str) -> Option<(String, &str)> {
    let (dir, name) = split_name(path);
    let caps = FINGERPRINT_RE.captures(name)?;
    let base = caps.get(1)?.as_str();
    let hash = caps.get(2)?.as_str();
    let ext = caps.get(3)?.as_str();
    Some((format!("{}{}{}", dir, base, ext), hash))
}

/// Remove the fingerprint segment, if any.
pub fn strip_fingerprint(path: &str) -> String {
    split_fingerprint(path)
        .map(|(stripped, _)| stripped)
        .unwrap_or_else(|| path.to_string())
}

/// Whether the file name carries a well-formed fingerprint.
pub fn is_fingerprinted(path: &str) -> bool {
    let (_, name) = split_name(path);
    FINGERPRINT_RE.is_match(name)
}

/// `("css/", "app.css")` for `css/app.css`.
fn split_name(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(idx) => path.split_at(idx + 1),
        None => ("", path),
    }
}

/// Index of the final extension's dot; leading dots (`.env`) don't count.
fn extension_start(name: &str) -> Option<usize> {
    match name.rfind('.') {
        Some(0) | None => None,
        Some(idx) if idx + 1 == name.len() => None,
        Some(idx) => Some(idx),
    }
}
