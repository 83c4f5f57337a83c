//! Error types for the media cache proxy

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Cache error: {0}")]
    Cache(#[from] lfu_blob_cache::CacheError),

    #[error("Fetcher error: {0}")]
    Fetch(#[from] blob_loader::FetchError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<tracing_subscriber::filter::ParseError> for ProxyError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        ProxyError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ProxyError>;
