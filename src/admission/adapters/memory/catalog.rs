//! In-memory catalog for admission tests.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use crate::admission::{
    domain::{GroupId, GroupProfile, ProgramId, UserId},
    ports::{CatalogError, CatalogResult, GroupCatalog},
};

/// Thread-safe in-memory group catalog.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGroupCatalog {
    state: Arc<RwLock<CatalogState>>,
}

#[derive(Debug, Default)]
struct CatalogState {
    groups: HashMap<GroupId, GroupProfile>,
    teachers: HashSet<(GroupId, UserId)>,
}

fn poisoned(err: impl std::fmt::Display) -> CatalogError {
    CatalogError::persistence(std::io::Error::other(err.to_string()))
}

impl InMemoryGroupCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a group profile.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Persistence`] when the lock is poisoned.
    pub fn upsert_group(&self, profile: GroupProfile) -> CatalogResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        state.groups.insert(profile.group_id, profile);
        Ok(())
    }

    /// Assigns a teacher to a group.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Persistence`] when the lock is poisoned.
    pub fn assign_teacher(&self, group_id: GroupId, teacher_id: UserId) -> CatalogResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        state.teachers.insert((group_id, teacher_id));
        Ok(())
    }
}

#[async_trait]
impl GroupCatalog for InMemoryGroupCatalog {
    async fn find_group(&self, group_id: GroupId) -> CatalogResult<Option<GroupProfile>> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.groups.get(&group_id).copied())
    }

    async fn is_teacher_in_program(
        &self,
        user_id: UserId,
        program_id: ProgramId,
    ) -> CatalogResult<bool> {
        let state = self.state.read().map_err(poisoned)?;
        let teaches = state.teachers.iter().any(|(group_id, teacher_id)| {
            *teacher_id == user_id
                && state
                    .groups
                    .get(group_id)
                    .is_some_and(|group| group.program_id == program_id)
        });
        Ok(teaches)
    }

    async fn is_teacher_in_group(
        &self,
        user_id: UserId,
        group_id: GroupId,
    ) -> CatalogResult<bool> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.teachers.contains(&(group_id, user_id)))
    }
}
