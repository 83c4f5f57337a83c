//! Cache-aside resolution: cache lookup, fetch on miss, populate, decode

use crate::decode::Decoder;
use crate::error::{ResolveError, Result};
use crate::fetch::Fetcher;
use crate::key::derive_key;
use lfu_blob_cache::CacheStore;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// A value produced by [`FetchCoordinator::try_resolve`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<T> {
    pub value: T,
    /// Cache key the identifier mapped to
    pub key: String,
    /// Whether the value was served from the cache without fetching
    pub from_cache: bool,
}

/// Resolves identifiers through a shared [`CacheStore`], fetching and
/// populating on a miss
///
/// Each call runs independently; concurrent calls only meet inside the
/// store. Nothing is retried.
pub struct FetchCoordinator<F, D> {
    store: Arc<CacheStore>,
    fetcher: F,
    decoder: D,
}

impl<F, D> FetchCoordinator<F, D>
where
    F: Fetcher,
    D: Decoder,
{
    pub fn new(store: Arc<CacheStore>, fetcher: F, decoder: D) -> Self {
        Self {
            store,
            fetcher,
            decoder,
        }
    }

    pub fn store(&self) -> &Arc<CacheStore> {
        &self.store
    }

    /// Resolve an identifier to a value.
    ///
    /// Only a malformed identifier is an error. When no value can be
    /// produced (fetch failure, undecodable fresh bytes) the result is
    /// `Ok(None)`; use [`try_resolve`](Self::try_resolve) to see why.
    pub async fn resolve(&self, identifier: &str) -> Result<Option<D::Output>> {
        match self.try_resolve(identifier).await {
            Ok(resolved) => Ok(Some(resolved.value)),
            Err(e) if e.is_invalid_identifier() => Err(e),
            Err(e) => {
                warn!(identifier, error = %e, "No value produced");
                Ok(None)
            }
        }
    }

    /// Resolve an identifier, surfacing fetch and decode failures
    pub async fn try_resolve(&self, identifier: &str) -> Result<Resolved<D::Output>> {
        let locator =
            Url::parse(identifier).map_err(|source| ResolveError::InvalidIdentifier {
                identifier: identifier.to_string(),
                source,
            })?;
        let key = derive_key(&locator);

        match self.store.get(&key).await {
            Ok(Some(bytes)) => match self.decoder.decode(&bytes) {
                Ok(value) => {
                    debug!(key = %key, "Resolved from cache");
                    return Ok(Resolved {
                        value,
                        key,
                        from_cache: true,
                    });
                }
                // A corrupt entry is bypassed, never reported; the fetch
                // below overwrites it.
                Err(e) => {
                    warn!(key = %key, error = %e, "Cached entry failed to decode, refetching");
                }
            },
            Ok(None) => {}
            Err(e) => {
                warn!(key = %key, error = %e, "Cache lookup failed, treating as miss");
            }
        }

        let bytes = self.fetcher.fetch(&locator).await.map_err(|e| {
            warn!(url = %locator, error = %e, "Failed to fetch blob");
            e
        })?;

        if let Err(e) = self.store.set(&key, &bytes).await {
            warn!(key = %key, error = %e, "Failed to cache blob");
            // Continue even if caching fails
        }

        let value = self.decoder.decode(&bytes)?;
        debug!(key = %key, size = bytes.len(), "Resolved from fetch");

        Ok(Resolved {
            value,
            key,
            from_cache: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{ImageDecoder, ImageFormat, PassthroughDecoder};
    use crate::error::{DecodeError, FetchError};
    use lfu_blob_cache::{CacheConfig, ContentExtensions};
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    #[derive(Clone)]
    struct MockFetcher {
        body: Option<Vec<u8>>,
        calls: Arc<AtomicUsize>,
    }

    impl MockFetcher {
        fn returning(body: &[u8]) -> Self {
            Self {
                body: Some(body.to_vec()),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn failing() -> Self {
            Self {
                body: None,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Fetcher for MockFetcher {
        async fn fetch(&self, _locator: &Url) -> std::result::Result<Vec<u8>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.body.clone().ok_or(FetchError::Status(404))
        }
    }

    /// Accepts only payloads starting with `ok:`
    struct PrefixDecoder;

    impl Decoder for PrefixDecoder {
        type Output = String;

        fn decode(&self, bytes: &[u8]) -> std::result::Result<String, DecodeError> {
            bytes
                .strip_prefix(b"ok:")
                .map(|rest| String::from_utf8_lossy(rest).into_owned())
                .ok_or_else(|| DecodeError::new("missing prefix"))
        }
    }

    fn encode_png() -> Vec<u8> {
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgb8(image::RgbImage::new(2, 2))
            .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    async fn open_store(root: &Path) -> Arc<CacheStore> {
        let config = CacheConfig::new(root, 16).with_content_extensions(ContentExtensions::Any);
        Arc::new(CacheStore::open(config).await.unwrap())
    }

    #[tokio::test]
    async fn test_miss_fetches_and_populates() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path()).await;
        let fetcher = MockFetcher::returning(b"ok:cat");
        let coordinator = FetchCoordinator::new(store.clone(), fetcher.clone(), PrefixDecoder);

        let resolved = coordinator
            .try_resolve("https://example.com/img/cat.jpg")
            .await
            .unwrap();

        assert_eq!(resolved.value, "cat");
        assert_eq!(resolved.key, "cat.jpg");
        assert!(!resolved.from_cache);
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(store.access_count("cat.jpg").await, Some(1));
        assert!(dir.path().join("cat.jpg").is_file());
    }

    #[tokio::test]
    async fn test_hit_does_not_fetch() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path()).await;
        store.set("cat.jpg", b"ok:cached").await.unwrap();
        let fetcher = MockFetcher::returning(b"ok:fresh");
        let coordinator = FetchCoordinator::new(store.clone(), fetcher.clone(), PrefixDecoder);

        let resolved = coordinator
            .try_resolve("https://example.com/img/cat.jpg")
            .await
            .unwrap();

        assert_eq!(resolved.value, "cached");
        assert!(resolved.from_cache);
        assert_eq!(fetcher.calls(), 0);
        assert_eq!(store.access_count("cat.jpg").await, Some(2));
    }

    #[tokio::test]
    async fn test_undecodable_hit_falls_back_to_one_fetch() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path()).await;
        store.set("cat.jpg", b"garbage").await.unwrap();
        let fetcher = MockFetcher::returning(b"ok:fresh");
        let coordinator = FetchCoordinator::new(store.clone(), fetcher.clone(), PrefixDecoder);

        let value = coordinator
            .resolve("https://example.com/img/cat.jpg")
            .await
            .unwrap();

        assert_eq!(value.as_deref(), Some("fresh"));
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(store.get("cat.jpg").await.unwrap().unwrap(), b"ok:fresh");
    }

    #[tokio::test]
    async fn test_corrupt_image_body_is_refetched() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path()).await;
        store
            .set("cat.png", b"\x89PNG\r\n\x1a\n<<truncated garbage>>")
            .await
            .unwrap();
        let png = encode_png();
        let fetcher = MockFetcher::returning(&png);
        let coordinator = FetchCoordinator::new(store.clone(), fetcher.clone(), ImageDecoder);

        let resolved = coordinator
            .try_resolve("https://example.com/cat.png")
            .await
            .unwrap();

        assert!(!resolved.from_cache);
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(resolved.value.format, ImageFormat::Png);
        assert_eq!(resolved.value.bytes, png);
        assert_eq!(store.get("cat.png").await.unwrap().unwrap(), png);
    }

    #[tokio::test]
    async fn test_store_read_error_is_treated_as_miss() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path()).await;
        std::fs::create_dir(dir.path().join("cat.jpg")).unwrap();
        let fetcher = MockFetcher::returning(b"ok:fresh");
        let coordinator = FetchCoordinator::new(store.clone(), fetcher.clone(), PrefixDecoder);

        let value = coordinator
            .resolve("https://example.com/img/cat.jpg")
            .await
            .unwrap();

        assert_eq!(value.as_deref(), Some("fresh"));
        assert_eq!(fetcher.calls(), 1);
        assert!(dir.path().join("cat.jpg").is_dir());
    }

    #[tokio::test]
    async fn test_invalid_identifier_never_fetches() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path()).await;
        let fetcher = MockFetcher::returning(b"ok:x");
        let coordinator = FetchCoordinator::new(store.clone(), fetcher.clone(), PrefixDecoder);

        let err = coordinator.resolve("not a url").await.unwrap_err();

        assert!(err.is_invalid_identifier());
        assert_eq!(fetcher.calls(), 0);
        assert_eq!(store.frequency_records().await.len(), 0);
    }

    #[tokio::test]
    async fn test_fetch_failure_collapses_to_none() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path()).await;
        let fetcher = MockFetcher::failing();
        let coordinator = FetchCoordinator::new(store.clone(), fetcher.clone(), PrefixDecoder);

        let value = coordinator
            .resolve("https://example.com/missing.png")
            .await
            .unwrap();
        assert!(value.is_none());

        let err = coordinator
            .try_resolve("https://example.com/missing.png")
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::Fetch(FetchError::Status(404))));
        assert_eq!(fetcher.calls(), 2);
        assert_eq!(store.entry_count().await, 0);
    }

    #[tokio::test]
    async fn test_undecodable_fetch_is_cached_but_yields_nothing() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path()).await;
        let fetcher = MockFetcher::returning(b"garbage");
        let coordinator = FetchCoordinator::new(store.clone(), fetcher.clone(), PrefixDecoder);

        let err = coordinator
            .try_resolve("https://example.com/bad.jpg")
            .await
            .unwrap_err();

        assert!(matches!(err, ResolveError::Decode(_)));
        assert!(dir.path().join("bad.jpg").is_file());
    }

    #[tokio::test]
    async fn test_cache_write_failure_still_returns_value() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"file").unwrap();
        let store = open_store(&blocker.join("Cache")).await;
        let fetcher = MockFetcher::returning(b"ok:uncached");
        let coordinator = FetchCoordinator::new(store.clone(), fetcher.clone(), PrefixDecoder);

        let value = coordinator
            .resolve("https://example.com/cat.jpg")
            .await
            .unwrap();

        assert_eq!(value.as_deref(), Some("uncached"));
        assert_eq!(store.access_count("cat.jpg").await, None);
    }

    #[tokio::test]
    async fn test_fallback_key_for_bare_host() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path()).await;
        let coordinator =
            FetchCoordinator::new(store.clone(), MockFetcher::returning(b"bytes"), PassthroughDecoder);

        let resolved = coordinator.try_resolve("https://example.com/").await.unwrap();

        assert_eq!(resolved.key, "image");
        assert!(dir.path().join("image").is_file());
    }

    #[tokio::test]
    async fn test_concurrent_resolves_are_independent() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path()).await;
        let fetcher = MockFetcher::returning(b"ok:v");
        let coordinator = Arc::new(FetchCoordinator::new(
            store.clone(),
            fetcher.clone(),
            PrefixDecoder,
        ));

        let identifiers = (0..8)
            .map(|i| format!("https://example.com/img/{i}.png"))
            .collect::<Vec<_>>();
        let results = futures::future::join_all(
            identifiers.iter().map(|id| coordinator.resolve(id)),
        )
        .await;

        assert!(results
            .into_iter()
            .all(|r| r.unwrap().as_deref() == Some("v")));
        assert_eq!(fetcher.calls(), 8);
        assert_eq!(store.entry_count().await, 8);
    }
}
