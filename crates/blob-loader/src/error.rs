//! Error types for blob loading

use thiserror::Error;

/// Failure of the external fetch capability
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream returned status {0}")]
    Status(u16),

    #[error("Unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Fetch failed: {0}")]
    Other(String),
}

/// Bytes could not be turned into a usable value
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Decode error: {0}")]
pub struct DecodeError(pub String);

impl DecodeError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Invalid identifier {identifier:?}: {source}")]
    InvalidIdentifier {
        identifier: String,
        #[source]
        source: url::ParseError,
    },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl ResolveError {
    /// Whether the caller passed a malformed identifier, as opposed to the
    /// value simply being unavailable
    pub fn is_invalid_identifier(&self) -> bool {
        matches!(self, ResolveError::InvalidIdentifier { .. })
    }
}

pub type Result<T> = std::result::Result<T, ResolveError>;
