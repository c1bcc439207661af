use crate::error::SourceError;
use crate::types::{SourceId, SourceRecord};
use async_trait::async_trait;

/// Read-only client for one remote tabular backend.
///
/// The engine performs exactly one fetch per source per run, up front, and
/// never mutates what it receives. Implementations own transport, paging
/// and retry; a returned collection must be complete and internally
/// consistent, otherwise the whole call should fail.
#[async_trait]
pub trait SourceClient: Send + Sync {
    async fn fetch_records(&self, source: SourceId) -> Result<Vec<SourceRecord>, SourceError>;
}
