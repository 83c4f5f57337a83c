//! Cache types

use serde::{Deserialize, Serialize};

/// Access count for a single cached key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyRecord {
    pub key: String,
    pub access_count: u64,
}

/// Statistics about the cache
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    /// Content files counted against capacity
    pub entries: usize,
    /// Keys with a frequency record
    pub tracked_keys: usize,
    /// Size of every file under the root, in kilobytes
    pub total_size_kb: f64,
    pub hits: u64,
    pub misses: u64,
    /// Keys removed by eviction passes
    pub evictions: u64,
}
