//! Port for the program/group catalog owned by an external component.

use crate::admission::domain::{GroupId, GroupProfile, ProgramId, UserId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for catalog lookups.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Read-only catalog queries needed by the engine.
#[async_trait]
pub trait GroupCatalog: Send + Sync {
    /// Returns the admission-relevant profile of a group.
    async fn find_group(&self, group_id: GroupId) -> CatalogResult<Option<GroupProfile>>;

    /// Returns `true` when the user teaches any group of the program.
    async fn is_teacher_in_program(
        &self,
        user_id: UserId,
        program_id: ProgramId,
    ) -> CatalogResult<bool>;

    /// Returns `true` when the user is assigned to teach the group.
    async fn is_teacher_in_group(&self, user_id: UserId, group_id: GroupId)
    -> CatalogResult<bool>;
}

/// Errors returned by catalog implementations.
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    /// Persistence-layer failure.
    #[error("catalog lookup failed: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl CatalogError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
