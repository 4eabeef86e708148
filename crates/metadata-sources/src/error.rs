use thiserror::Error;

/// Failure talking to an upstream catalog.
///
/// `Clone` so a single in-flight request can hand the same error to every waiter.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    #[error("{0} api key not configured")]
    NotConfigured(&'static str),

    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("request to {url} failed with status {status}: {body}")]
    Status { url: String, status: u16, body: String },

    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl SourceError {
    /// Network failures, 429 and 5xx are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            SourceError::Transport { .. } => true,
            SourceError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, SourceError::Status { status: 404, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> SourceError {
        SourceError::Status {
            url: "http://x".to_string(),
            status: code,
            body: String::new(),
        }
    }

    #[test]
    fn test_retryable_classification() {
        assert!(status(429).is_retryable());
        assert!(status(503).is_retryable());
        assert!(!status(404).is_retryable());
        assert!(!status(401).is_retryable());
        assert!(SourceError::Transport {
            url: "http://x".to_string(),
            message: "reset".to_string()
        }
        .is_retryable());
        assert!(!SourceError::Decode {
            url: "http://x".to_string(),
            message: "eof".to_string()
        }
        .is_retryable());
        assert!(!SourceError::NotConfigured("tmdb").is_retryable());
    }
}
