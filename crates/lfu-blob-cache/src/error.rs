//! Error types for the blob cache

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid cache key: {0:?}")]
    InvalidKey(String),

    #[error("Failed to read cache entry {key}: {source}")]
    Read {
        key: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write cache entry {key}: {source}")]
    Write {
        key: String,
        #[source]
        source: io::Error,
    },

    #[error("Cache directory {path:?} unavailable: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, CacheError>;
