//! Media Cache Proxy - image proxy backed by an LFU disk cache
//!
//! Serves images by source URL, answering from the local cache when it can
//! and fetching from the origin otherwise.

mod error;
mod server;
mod types;

use crate::error::{ProxyError, Result};
use crate::server::{start_server, ServerState, SharedState};
use crate::types::ProxyConfig;
use blob_loader::{FetchCoordinator, HttpFetcher, ImageDecoder};
use lfu_blob_cache::{CacheConfig, CacheStore, ContentExtensions};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

const USER_AGENT: &str = concat!("media-cache-proxy/", env!("CARGO_PKG_VERSION"));

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter = EnvFilter::from_default_env()
        .add_directive("media_cache_proxy=info".parse()?)
        .add_directive("lfu_blob_cache=info".parse()?)
        .add_directive("blob_loader=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    };

    info!("Starting Media Cache Proxy...");

    // Load configuration from environment
    let config = load_config()?;
    info!("Port: {}", config.port);
    info!("Cache dir: {:?}", config.cache_dir);
    info!("Cache capacity: {} entries", config.cache_capacity);

    let cache_config = CacheConfig::new(config.cache_dir, config.cache_capacity)
        .with_content_extensions(config.content_extensions);
    let store = Arc::new(CacheStore::open(cache_config).await?);

    let fetcher =
        HttpFetcher::with_timeout(Duration::from_secs(config.fetch_timeout_secs), USER_AGENT)?;
    let coordinator = FetchCoordinator::new(store, fetcher, ImageDecoder);

    let state: SharedState<HttpFetcher> = Arc::new(ServerState::new(coordinator));

    start_server(state, config.port).await?;

    Ok(())
}

fn load_config() -> Result<ProxyConfig> {
    let defaults = ProxyConfig::default();

    let port = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(defaults.port);

    let cache_dir = std::env::var("CACHE_DIR")
        .map(PathBuf::from)
        .unwrap_or(defaults.cache_dir);

    let cache_capacity = match std::env::var("CACHE_CAPACITY") {
        Ok(s) => parse_capacity(&s)?,
        Err(_) => defaults.cache_capacity,
    };

    let content_extensions = std::env::var("CACHE_EXTENSIONS")
        .map(|s| ContentExtensions::parse(&s))
        .unwrap_or(defaults.content_extensions);

    let fetch_timeout_secs = match std::env::var("FETCH_TIMEOUT_SECS") {
        Ok(s) => parse_timeout_secs(&s)?,
        Err(_) => defaults.fetch_timeout_secs,
    };

    Ok(ProxyConfig {
        port,
        cache_dir,
        cache_capacity,
        content_extensions,
        fetch_timeout_secs,
    })
}

fn parse_capacity(value: &str) -> Result<usize> {
    let capacity = value
        .trim()
        .parse::<i64>()
        .map_err(|e| ProxyError::Config(format!("CACHE_CAPACITY {:?}: {}", value, e)))?;

    if capacity < 1 {
        return Err(ProxyError::Config(format!(
            "CACHE_CAPACITY must be at least 1, got {}",
            capacity
        )));
    }

    usize::try_from(capacity)
        .map_err(|e| ProxyError::Config(format!("CACHE_CAPACITY {:?}: {}", value, e)))
}

fn parse_timeout_secs(value: &str) -> Result<u64> {
    let secs = value
        .trim()
        .parse::<i64>()
        .map_err(|e| ProxyError::Config(format!("FETCH_TIMEOUT_SECS {:?}: {}", value, e)))?;

    if secs < 1 {
        return Err(ProxyError::Config(format!(
            "FETCH_TIMEOUT_SECS must be at least 1, got {}",
            secs
        )));
    }

    u64::try_from(secs)
        .map_err(|e| ProxyError::Config(format!("FETCH_TIMEOUT_SECS {:?}: {}", value, e)))
}
