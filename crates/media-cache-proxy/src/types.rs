//! Core types for the media cache proxy

use lfu_blob_cache::{CacheStats, ContentExtensions};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the media cache proxy
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub port: u16,
    pub cache_dir: PathBuf,
    pub cache_capacity: usize,
    pub content_extensions: ContentExtensions,
    pub fetch_timeout_secs: u64,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            port: 3001,
            cache_dir: PathBuf::from("./cache/Cache"),
            cache_capacity: 10_000,
            content_extensions: ContentExtensions::default(),
            fetch_timeout_secs: 30,
        }
    }
}

/// Query for the image endpoint
#[derive(Debug, Deserialize)]
pub struct ImageQuery {
    pub url: String,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
    pub cache: CacheStats,
}

/// Response for a whole-cache purge
#[derive(Debug, Serialize)]
pub struct PurgeResponse {
    pub removed: usize,
}
