//! Repository port for interview outcomes.
//!
//! Recording is a two-step contract executed by the store as one unit: it
//! reads the existing interview of the application, then either inserts the
//! candidate record or replaces the existing one in place.

use super::OutboxWrite;
use crate::admission::domain::{ApplicationId, Interview, OutboxEvent};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for interview repository operations.
pub type InterviewRepositoryResult<T> = Result<T, InterviewRepositoryError>;

/// The interview as stored by [`InterviewRepository::upsert`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredInterview {
    /// Live interview after the write.
    pub interview: Interview,
    /// Whether the accompanying event was persisted.
    pub outbox: OutboxWrite,
}

/// Interview persistence contract.
#[async_trait]
pub trait InterviewRepository: Send + Sync {
    /// Finds the live interview of an application.
    async fn find_by_application(
        &self,
        application_id: ApplicationId,
    ) -> InterviewRepositoryResult<Option<Interview>>;

    /// Records `candidate` with its event in a single transaction.
    ///
    /// When the application has no interview, `candidate` is inserted as is.
    /// Otherwise the existing record takes over the candidate's outcome via
    /// [`Interview::replaced_by`], keeping its identity and creation time.
    ///
    /// # Errors
    ///
    /// Returns [`InterviewRepositoryError::AlreadyRecorded`] when a
    /// concurrent writer inserted the first interview between the read and
    /// the insert. Retrying observes that record and replaces it.
    async fn upsert(
        &self,
        candidate: &Interview,
        event: &OutboxEvent,
    ) -> InterviewRepositoryResult<StoredInterview>;
}

/// Errors returned by interview repository implementations.
#[derive(Debug, Clone, Error)]
pub enum InterviewRepositoryError {
    /// An interview already exists for the application.
    #[error("interview already recorded for application {0}")]
    AlreadyRecorded(ApplicationId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl InterviewRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
