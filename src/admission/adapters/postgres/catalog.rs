//! `PostgreSQL` catalog lookups over the programme and group tables.

use super::{
    blocking::{AdmissionPgPool, StorageFailure, run_blocking},
    conversion::row_to_group_profile,
    models::GroupProfileRow,
    schema::{group_teachers, groups, programs},
};
use crate::admission::{
    domain::{GroupId, GroupProfile, ProgramId, UserId},
    ports::{CatalogError, CatalogResult, GroupCatalog},
};
use async_trait::async_trait;
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::r2d2::PoolError;
use diesel::result::Error as DieselError;
use tokio::task::JoinError;

/// Read-only `PostgreSQL` implementation of [`GroupCatalog`].
#[derive(Debug, Clone)]
pub struct PostgresGroupCatalog {
    pool: AdmissionPgPool,
}

impl PostgresGroupCatalog {
    /// Creates a new catalog from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: AdmissionPgPool) -> Self {
        Self { pool }
    }
}

impl StorageFailure for CatalogError {
    fn from_pool(err: PoolError) -> Self {
        Self::persistence(err)
    }

    fn from_join(err: JoinError) -> Self {
        Self::persistence(err)
    }

    fn from_database(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

#[async_trait]
impl GroupCatalog for PostgresGroupCatalog {
    async fn find_group(&self, group_id: GroupId) -> CatalogResult<Option<GroupProfile>> {
        run_blocking(&self.pool, move |connection| {
            let row = groups::table
                .inner_join(programs::table)
                .filter(groups::id.eq(group_id.into_inner()))
                .select((
                    groups::id,
                    groups::program_id,
                    programs::is_published,
                    groups::is_open,
                    groups::requires_interview,
                    groups::capacity,
                ))
                .first::<GroupProfileRow>(connection)
                .optional()
                .map_err(CatalogError::persistence)?;
            row.as_ref()
                .map(row_to_group_profile)
                .transpose()
                .map_err(CatalogError::persistence)
        })
        .await
    }

    async fn is_teacher_in_program(
        &self,
        user_id: UserId,
        program_id: ProgramId,
    ) -> CatalogResult<bool> {
        run_blocking(&self.pool, move |connection| {
            diesel::select(exists(
                group_teachers::table
                    .inner_join(groups::table)
                    .filter(group_teachers::teacher_id.eq(user_id.into_inner()))
                    .filter(groups::program_id.eq(program_id.into_inner())),
            ))
            .get_result::<bool>(connection)
            .map_err(CatalogError::persistence)
        })
        .await
    }

    async fn is_teacher_in_group(
        &self,
        user_id: UserId,
        group_id: GroupId,
    ) -> CatalogResult<bool> {
        run_blocking(&self.pool, move |connection| {
            diesel::select(exists(
                group_teachers::table
                    .filter(group_teachers::teacher_id.eq(user_id.into_inner()))
                    .filter(group_teachers::group_id.eq(group_id.into_inner())),
            ))
            .get_result::<bool>(connection)
            .map_err(CatalogError::persistence)
        })
        .await
    }
}
