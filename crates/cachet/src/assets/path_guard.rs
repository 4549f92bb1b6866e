//! Request path validation.
//!
//! Asset requests carry a path relative to the asset root. Before anything
//! touches the filesystem the path is checked for traversal and absolute
//! forms, including Windows drive letters and UNC prefixes, regardless of the
//! host platform.

use crate::error::{AssetError, Result};

/// Validate a relative asset path.
///
/// # Errors
///
/// Returns [`AssetError::InvalidPath`] if the path is absolute, contains a
/// `..` component, or contains a NUL byte.
pub fn validate_path(path: &str) -> Result<()> {
    let reject = |reason: &'static str| {
        Err(AssetError::InvalidPath {
            path: path.to_string(),
            reason,
        })
    };

    if path.contains('\0') {
        return reject("NUL byte");
    }

    if path.starts_with('/') || path.starts_with('\\') {
        return reject("absolute path");
    }

    if has_drive_prefix(path) {
        return reject("drive-qualified path");
    }

    // Both separators count: a Windows backend would honour either.
    if path.split(['/', '\\']).any(|segment| segment == "..") {
        return reject("parent directory reference");
    }

    Ok(())
}

/// Returns `true` if [`validate_path`] accepts the path.
pub fn is_valid_path(path: &str) -> bool {
    validate_path(path).is_ok()
}

/// `C:`, `c:\...`, `C:foo`
fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}
