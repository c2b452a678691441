//! Port used by the outbox relay to drain undelivered events.

use crate::admission::domain::{OutboxEvent, OutboxEventId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for outbox operations.
pub type OutboxRepositoryResult<T> = Result<T, OutboxRepositoryError>;

/// Relay-facing outbox contract.
#[async_trait]
pub trait OutboxRepository: Send + Sync {
    /// Returns up to `limit` undelivered events, oldest first.
    async fn pending(&self, limit: usize) -> OutboxRepositoryResult<Vec<OutboxEvent>>;

    /// Marks events as dispatched and returns how many changed.
    ///
    /// Already dispatched and unknown identifiers are ignored.
    async fn mark_dispatched(
        &self,
        ids: &[OutboxEventId],
        at: DateTime<Utc>,
    ) -> OutboxRepositoryResult<usize>;
}

/// Errors returned by outbox implementations.
#[derive(Debug, Clone, Error)]
pub enum OutboxRepositoryError {
    /// Persistence-layer failure.
    #[error("outbox persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl OutboxRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
