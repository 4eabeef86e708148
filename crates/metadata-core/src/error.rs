use metadata_sources::SourceError;
use thiserror::Error;

/// Errors returned by [`crate::MetadataService`] operations.
///
/// `NotFound` is kept apart from upstream failures so callers can tell
/// "no results" from "try again".
#[derive(Debug, Clone, Error)]
pub enum MetadataError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("{0} not configured")]
    NotConfigured(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("cache error: {0}")]
    Cache(String),
}

impl MetadataError {
    pub fn is_not_found(&self) -> bool {
        match self {
            MetadataError::NotFound(_) => true,
            MetadataError::Source(err) => err.is_not_found(),
            _ => false,
        }
    }
}

impl From<crate::cache::CacheError> for MetadataError {
    fn from(err: crate::cache::CacheError) -> Self {
        MetadataError::Cache(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MetadataError>;
