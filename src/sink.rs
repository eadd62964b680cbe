//! Collaborator interfaces at the edge of the pipeline: the persistence
//! service that commits accepted drafts and the diagnostic error log.
//! Both are injected into the coordinator at construction time.
use anyhow::Result;
use async_trait::async_trait;
use tracing::error;

use crate::model::Entity;

/// Commit point for accepted entities. Implemented by the surrounding
/// system's persistence layer; the pipeline never retries, so the
/// operations are expected to be idempotent enough on their side.
#[async_trait]
pub trait EntitySink: Send + Sync {
    async fn create(&self, entity: &Entity) -> Result<i64>;
    async fn update(&self, entity: &Entity) -> Result<()>;
}

/// Best-effort diagnostic log for operational failures.
#[async_trait]
pub trait ErrorSink: Send + Sync {
    async fn record(&self, context: &str, error: &anyhow::Error);
}

/// Default error sink backed by the tracing subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingErrorSink;

#[async_trait]
impl ErrorSink for TracingErrorSink {
    async fn record(&self, context: &str, error: &anyhow::Error) {
        error!(context, ?error, "pipeline failure");
    }
}
