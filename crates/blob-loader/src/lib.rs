//! Cache-aside blob loading
//!
//! Resolves a locator to a decoded value by checking an
//! [`lfu_blob_cache::CacheStore`] first and falling back to a [`Fetcher`] on a
//! miss, writing fetched bytes back into the store before decoding them.

pub mod coordinator;
pub mod decode;
pub mod error;
pub mod fetch;
pub mod key;

pub use coordinator::{FetchCoordinator, Resolved};
pub use decode::{DecodedImage, Decoder, ImageDecoder, ImageFormat, PassthroughDecoder};
pub use error::{DecodeError, FetchError, ResolveError, Result};
pub use fetch::{Fetcher, HttpFetcher};
pub use key::{derive_key, FALLBACK_KEY};
