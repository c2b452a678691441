//! Repository port for applications, enrolments and the status audit trail.

use crate::admission::domain::{
    AdmissionError, ApplicationId, ApplicationStatus, AuditRecord, Enrollment,
    EnrollmentApplication, EnrollmentOutcome, GroupId, OutboxEvent, UserId,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for application repository operations.
pub type ApplicationRepositoryResult<T> = Result<T, ApplicationRepositoryError>;

/// Whether the outbox entry accompanying a write was persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboxWrite {
    /// The event was stored with the state change.
    Recorded,
    /// The state change committed but the event could not be stored.
    Dropped {
        /// Storage failure description.
        reason: String,
    },
}

/// A seat to create as part of an approval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatReservation {
    /// Enrolment to insert idempotently.
    pub enrollment: Enrollment,
    /// Group capacity the seat count must stay within.
    pub capacity: u32,
    /// Whether the group admits only after a recorded interview.
    ///
    /// Stores re-read the live interview inside the commit and apply the
    /// interview rules of [`crate::admission::domain::AdmissionPolicy`]
    /// again, so an outcome re-recorded after the pre-check still counts.
    pub requires_interview: bool,
}

/// Everything one status transition writes, applied as a single unit.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionCommit {
    /// Application in its post-transition state.
    pub application: EnrollmentApplication,
    /// Status the stored application must still hold.
    pub expected_status: ApplicationStatus,
    /// Audit entry for the transition.
    pub audit: AuditRecord,
    /// Seat to create when the transition admits the applicant.
    pub admission: Option<SeatReservation>,
    /// Event to append to the outbox.
    pub event: OutboxEvent,
}

/// Filter for staff listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplicationFilter {
    /// Restrict to one group.
    pub group_id: Option<GroupId>,
    /// Restrict to one status.
    pub status: Option<ApplicationStatus>,
}

impl ApplicationFilter {
    /// Returns `true` when `application` satisfies the filter.
    #[must_use]
    pub fn matches(&self, application: &EnrollmentApplication) -> bool {
        self.group_id.is_none_or(|id| id == application.group_id())
            && self.status.is_none_or(|status| status == application.status())
    }
}

/// Application persistence contract.
#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    /// Stores a newly submitted application together with its creation event.
    ///
    /// # Errors
    ///
    /// Returns [`ApplicationRepositoryError::DuplicateApplication`] when the
    /// ID exists and [`ApplicationRepositoryError::ActiveApplicationExists`]
    /// when the applicant already holds a live application for the group.
    async fn store(
        &self,
        application: &EnrollmentApplication,
        event: &OutboxEvent,
    ) -> ApplicationRepositoryResult<OutboxWrite>;

    /// Finds an application by identifier.
    async fn find_by_id(
        &self,
        id: ApplicationId,
    ) -> ApplicationRepositoryResult<Option<EnrollmentApplication>>;

    /// Finds the most recent application of `applicant_id` to `group_id`.
    async fn find_latest_for(
        &self,
        applicant_id: UserId,
        group_id: GroupId,
    ) -> ApplicationRepositoryResult<Option<EnrollmentApplication>>;

    /// Returns `true` when any application of the pair was rejected.
    async fn has_rejected(
        &self,
        applicant_id: UserId,
        group_id: GroupId,
    ) -> ApplicationRepositoryResult<bool>;

    /// Lists an applicant's applications, newest first.
    async fn list_by_applicant(
        &self,
        applicant_id: UserId,
    ) -> ApplicationRepositoryResult<Vec<EnrollmentApplication>>;

    /// Lists applications matching `filter`, newest first.
    async fn list(
        &self,
        filter: ApplicationFilter,
    ) -> ApplicationRepositoryResult<Vec<EnrollmentApplication>>;

    /// Applies a status transition atomically.
    ///
    /// The status update, audit append and optional seat creation commit
    /// together or not at all. The outbox append is attempted in the same
    /// unit; its failure is reported as [`OutboxWrite::Dropped`] without
    /// undoing the transition.
    ///
    /// # Errors
    ///
    /// Returns [`ApplicationRepositoryError::NotFound`] for an unknown
    /// application, [`ApplicationRepositoryError::StatusConflict`] when the
    /// stored status no longer matches `expected_status`, and
    /// [`ApplicationRepositoryError::AdmissionRefused`] when the live
    /// interview no longer permits admission, and
    /// [`ApplicationRepositoryError::NoSeatsAvailable`] when the seat count
    /// has reached capacity.
    async fn commit_transition(
        &self,
        commit: &TransitionCommit,
    ) -> ApplicationRepositoryResult<OutboxWrite>;

    /// Counts enrolments in a group.
    async fn count_enrollments(&self, group_id: GroupId) -> ApplicationRepositoryResult<u64>;

    /// Inserts an enrolment unless the (user, group) pair already holds one.
    async fn ensure_enrollment(
        &self,
        enrollment: &Enrollment,
    ) -> ApplicationRepositoryResult<EnrollmentOutcome>;

    /// Returns `true` when the user holds a seat in the group.
    async fn has_enrollment(
        &self,
        user_id: UserId,
        group_id: GroupId,
    ) -> ApplicationRepositoryResult<bool>;

    /// Lists a group's enrolments in admission order.
    async fn list_enrollments(
        &self,
        group_id: GroupId,
    ) -> ApplicationRepositoryResult<Vec<Enrollment>>;

    /// Returns an application's audit records in insertion order.
    async fn audit_trail(
        &self,
        application_id: ApplicationId,
    ) -> ApplicationRepositoryResult<Vec<AuditRecord>>;
}

/// Errors returned by application repository implementations.
#[derive(Debug, Clone, Error)]
pub enum ApplicationRepositoryError {
    /// An application with the same identifier already exists.
    #[error("duplicate application identifier: {0}")]
    DuplicateApplication(ApplicationId),

    /// The applicant already has a live application for the group.
    #[error("applicant {applicant_id} already has a live application for group {group_id}")]
    ActiveApplicationExists {
        /// Applicant.
        applicant_id: UserId,
        /// Group.
        group_id: GroupId,
    },

    /// The application was not found.
    #[error("application not found: {0}")]
    NotFound(ApplicationId),

    /// The stored status changed since the application was loaded.
    #[error("application {application_id} is {actual}, expected {expected}")]
    StatusConflict {
        /// Application.
        application_id: ApplicationId,
        /// Status the caller based its transition on.
        expected: ApplicationStatus,
        /// Status found in storage.
        actual: ApplicationStatus,
    },

    /// The group is full.
    #[error("group {group_id} has no free seats (capacity {capacity})")]
    NoSeatsAvailable {
        /// Group.
        group_id: GroupId,
        /// Capacity in force when the seat was requested.
        capacity: u32,
    },

    /// The interview read inside the commit does not permit admission.
    #[error(transparent)]
    AdmissionRefused(AdmissionError),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ApplicationRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
