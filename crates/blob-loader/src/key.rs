//! Cache key derivation

use url::Url;

/// Key used when a locator has no usable last path segment
pub const FALLBACK_KEY: &str = "image";

/// Derive the cache key for a locator: its last non-empty path segment.
///
/// Different locators sharing a last segment map to the same key.
pub fn derive_key(locator: &Url) -> String {
    locator
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .filter(|s| *s != "." && *s != "..")
        .map(str::to_string)
        .unwrap_or_else(|| FALLBACK_KEY.to_string())
}
