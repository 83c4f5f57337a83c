//! Cache configuration

use crate::error::{CacheError, Result};
use std::path::{Path, PathBuf};

const DEFAULT_CAPACITY: usize = 10_000;

/// Which files under the cache root count as entries for capacity purposes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentExtensions {
    /// Every regular file is an entry
    Any,
    /// Only files whose extension matches one of these (case-insensitive, no dot)
    Only(Vec<String>),
}

impl ContentExtensions {
    /// Parse a comma separated list such as `jpg,png`, or `*` for any file
    pub fn parse(value: &str) -> Self {
        if value.trim() == "*" {
            return Self::Any;
        }

        let exts = value
            .split(',')
            .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect::<Vec<_>>();

        if exts.is_empty() {
            Self::Any
        } else {
            Self::Only(exts)
        }
    }

    pub fn matches(&self, path: &Path) -> bool {
        match self {
            Self::Any => true,
            Self::Only(exts) => path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| exts.iter().any(|known| known.eq_ignore_ascii_case(e)))
                .unwrap_or(false),
        }
    }
}

impl Default for ContentExtensions {
    fn default() -> Self {
        Self::Only(vec!["jpg".to_string(), "png".to_string()])
    }
}

/// Configuration for a [`CacheStore`](crate::CacheStore)
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Directory holding one file per cached key
    pub root: PathBuf,
    /// Maximum number of content files kept on disk
    pub capacity: usize,
    pub content_extensions: ContentExtensions,
}

impl CacheConfig {
    pub fn new(root: impl Into<PathBuf>, capacity: usize) -> Self {
        Self {
            root: root.into(),
            capacity,
            content_extensions: ContentExtensions::default(),
        }
    }

    pub fn with_content_extensions(mut self, content_extensions: ContentExtensions) -> Self {
        self.content_extensions = content_extensions;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(CacheError::Config(
                "capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new("./Cache", DEFAULT_CAPACITY)
    }
}
