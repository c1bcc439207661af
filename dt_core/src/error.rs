use crate::types::SourceId;
use thiserror::Error;

/// Errors surfaced by source client implementations.
///
/// The engine treats any fetch failure as fatal for the whole run; retry
/// policy lives inside the client adapter, not here.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Source not found: {source_id}")]
    NotFound { source_id: SourceId },

    #[error("Source unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Authentication failed: {reason}")]
    Authentication { reason: String },

    #[error("Malformed source payload: {reason}")]
    Malformed { reason: String },

    #[error("Rate limited: retry after {retry_after_seconds}s")]
    RateLimited { retry_after_seconds: u64 }
}

impl SourceError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::RateLimited { .. })
    }

    pub fn retry_after(&self) -> Option<u64> {
        if let Self::RateLimited {
            retry_after_seconds
        } = self
        {
            Some(*retry_after_seconds)
        } else {
            None
        }
    }
}
