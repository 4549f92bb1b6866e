//! HTTP handler for fingerprinted assets.
//!
//! Requests under the static prefix are validated, have any fingerprint
//! stripped to find the real file, and are served with cache headers:
//!
//! | Request                               | `Cache-Control`                         |
//! |---------------------------------------|-----------------------------------------|
//! | production + fingerprinted filename   | `public, max-age=31536000, immutable`   |
//! | anything else                         | `public, max-age=3600`                  |
//!
//! File reads go through the manager's [`AssetFs`](crate::AssetFs) on a
//! blocking thread. The router is wrapped in `CatchPanicLayer`, and panics on
//! the blocking thread are resumed on the request task so the layer sees them.

use crate::assets::fingerprint::{is_fingerprinted, strip_fingerprint};
use crate::assets::manager::AssetManager;
use crate::assets::path_guard::validate_path;
use crate::error::{AssetError, Result};
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;

/// Cache policy for fingerprinted assets in production.
pub const CACHE_IMMUTABLE: &str = "public, max-age=31536000, immutable";

/// Cache policy for everything else.
pub const CACHE_SHORT: &str = "public, max-age=3600";

/// An asset resolved from a request path, ready to send.
#[derive(Debug, Clone)]
pub struct ServedAsset {
    /// Logical path of the file actually read
    pub logical: String,
    /// File content
    pub content: Vec<u8>,
    /// MIME type derived from the extension
    pub content_type: &'static str,
    /// `Cache-Control` value
    pub cache_control: &'static str,
}

impl AssetManager {
    /// Resolve a request path (prefix already stripped) to file content.
    ///
    /// # Errors
    ///
    /// - [`AssetError::InvalidPath`] for traversal or absolute paths; the
    ///   filesystem is not touched
    /// - [`AssetError::NotFound`] if nothing exists or the path is a directory
    pub fn open(&self, request_path: &str) -> Result<ServedAsset> {
        validate_path(request_path)?;

        let fingerprinted = is_fingerprinted(request_path);
        let stripped = strip_fingerprint(request_path);

        // A file may legitimately carry a hash-shaped name on disk (processor
        // output); fall back to the literal path before giving up.
        let logical = if self.fs().metadata(&stripped).is_ok() || !fingerprinted {
            stripped
        } else {
            request_path.to_string()
        };

        let meta = self
            .fs()
            .metadata(&logical)
            .map_err(|_| AssetError::NotFound(request_path.to_string()))?;
        if meta.is_dir {
            return Err(AssetError::NotFound(request_path.to_string()));
        }

        let content = self.fs().read(&logical).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AssetError::NotFound(request_path.to_string())
            } else {
                AssetError::io(&logical, e)
            }
        })?;

        let cache_control = if !self.is_dev() && fingerprinted {
            CACHE_IMMUTABLE
        } else {
            CACHE_SHORT
        };

        Ok(ServedAsset {
            content_type: content_type_for(&logical),
            logical,
            content,
            cache_control,
        })
    }

    /// Axum router serving `{static_prefix}{*path}`.
    pub fn router(self: &Arc<Self>) -> Router {
        let route = format!("{}{{*path}}", self.static_prefix());

        Router::new()
            .route(&route, get(serve_asset))
            .layer(CatchPanicLayer::new())
            .with_state(Arc::clone(self))
    }
}

/// Serve one asset request.
pub async fn serve_asset(
    State(manager): State<Arc<AssetManager>>,
    Path(path): Path<String>,
    headers: HeaderMap,
) -> Response {
    let range = headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let lookup = {
        let path = path.clone();
        tokio::task::spawn_blocking(move || manager.open(&path))
    };

    match lookup.await {
        Ok(Ok(asset)) => {
            tracing::debug!(path = %path, file = %asset.logical, "serving asset");
            asset_response(asset, range.as_deref())
        }
        Ok(Err(e)) => {
            tracing::debug!(path = %path, error = %e, "asset request rejected");
            error_response(&e)
        }
        Err(join) if join.is_panic() => std::panic::resume_unwind(join.into_panic()),
        Err(join) => {
            tracing::error!(path = %path, error = %join, "asset task failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn asset_response(asset: ServedAsset, range: Option<&str>) -> Response {
    let len = asset.content.len() as u64;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(asset.content_type),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(asset.cache_control),
    );
    headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));

    match range.map(|r| parse_range(r, len)) {
        Some(ByteRange::Partial(start, end)) => {
            if let Ok(value) = HeaderValue::from_str(&format!("bytes {}-{}/{}", start, end, len)) {
                headers.insert(header::CONTENT_RANGE, value);
            }
            let body = asset.content[start as usize..=end as usize].to_vec();
            (StatusCode::PARTIAL_CONTENT, headers, Body::from(body)).into_response()
        }
        Some(ByteRange::Unsatisfiable) => {
            if let Ok(value) = HeaderValue::from_str(&format!("bytes */{}", len)) {
                headers.insert(header::CONTENT_RANGE, value);
            }
            (StatusCode::RANGE_NOT_SATISFIABLE, headers).into_response()
        }
        Some(ByteRange::Full) | None => {
            (StatusCode::OK, headers, Body::from(asset.content)).into_response()
        }
    }
}

fn error_response(err: &AssetError) -> Response {
    let status = err.status_code();
    let message = match status {
        StatusCode::BAD_REQUEST => "Invalid asset path",
        StatusCode::NOT_FOUND => "Asset not found",
        _ => "Failed to read asset",
    };

    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        message,
    )
        .into_response()
}

/// Outcome of interpreting a `Range` header against a body length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteRange {
    /// Ignore the header and send everything
    Full,
    /// Inclusive byte span
    Partial(u64, u64),
    /// No byte of the requested span exists
    Unsatisfiable,
}

/// Parse a single-range `bytes=` header.
///
/// Multi-range and malformed headers fall back to [`ByteRange::Full`].
pub fn parse_range(header: &str, len: u64) -> ByteRange {
    let Some(spec) = header.trim().strip_prefix("bytes=") else {
        return ByteRange::Full;
    };
    if spec.contains(',') {
        return ByteRange::Full;
    }
    let Some((start, end)) = spec.split_once('-') else {
        return ByteRange::Full;
    };
    let (start, end) = (start.trim(), end.trim());

    if start.is_empty() {
        // Suffix range: last N bytes
        return match end.parse::<u64>() {
            Ok(0) => ByteRange::Unsatisfiable,
            Ok(_) if len == 0 => ByteRange::Unsatisfiable,
            Ok(n) => ByteRange::Partial(len.saturating_sub(n), len - 1),
            Err(_) => ByteRange::Full,
        };
    }

    let Ok(start) = start.parse::<u64>() else {
        return ByteRange::Full;
    };

    let end = if end.is_empty() {
        len.saturating_sub(1)
    } else {
        match end.parse::<u64>() {
            Ok(end) if end >= start => end.min(len.saturating_sub(1)),
            _ => return ByteRange::Full,
        }
    };

    if start >= len {
        ByteRange::Unsatisfiable
    } else {
        ByteRange::Partial(start, end)
    }
}

/// MIME type from the file extension.
pub fn content_type_for(path: &str) -> &'static str {
    let extension = std::path::Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" | "map" => "application/json",
        "html" | "htm" => "text/html; charset=utf-8",
        "txt" => "text/plain; charset=utf-8",
        "xml" => "application/xml",
        "wasm" => "application/wasm",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mp3" => "audio/mpeg",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}
