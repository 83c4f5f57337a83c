//! File-based blob cache with capacity-bounded LFU eviction
//!
//! Stores one file per key under a root directory and tracks how often each
//! key has been written or read in an in-memory frequency index. When an
//! insert would push the number of content files over capacity, every key
//! sharing the lowest access count is evicted in one pass.
//!
//! The frequency index lives only as long as the process. Files found on
//! disk after a restart start without a record and pick one up on their next
//! read or write.

mod config;
mod error;
mod frequency;
mod store;
mod types;

pub use config::{CacheConfig, ContentExtensions};
pub use error::{CacheError, Result};
pub use store::CacheStore;
pub use types::{CacheStats, FrequencyRecord};
