//! Shared test helpers for in-memory admission integration tests.

use std::sync::Arc;

use intake::admission::{
    adapters::memory::{InMemoryAdmissionStore, InMemoryGroupCatalog},
    domain::{
        Actor, AdmissionEvent, ApplicationStatus, AuditRecord, Enrollment, EnrollmentApplication,
        GroupId, GroupProfile, Interview, InterviewRecording, InterviewResult, InterviewerRole,
        ProgramId, UserId,
    },
    ports::{SeatReservation, TransitionCommit},
    services::{
        ApplicationLifecycleService, ChangeStatusRequest, CreateApplicationRequest,
        InterviewService,
    },
};
use mockable::DefaultClock;
use rstest::fixture;

/// Lifecycle service wired to the in-memory adapters.
pub type MemoryLifecycle = ApplicationLifecycleService<
    InMemoryAdmissionStore,
    InMemoryAdmissionStore,
    InMemoryGroupCatalog,
    DefaultClock,
>;

/// Interview service wired to the in-memory adapters.
pub type MemoryInterviews = InterviewService<
    InMemoryAdmissionStore,
    InMemoryAdmissionStore,
    InMemoryGroupCatalog,
    DefaultClock,
>;

/// Services and adapters sharing one in-memory store.
#[derive(Clone)]
pub struct Admission {
    pub lifecycle: MemoryLifecycle,
    pub interviews: MemoryInterviews,
    pub store: Arc<InMemoryAdmissionStore>,
    pub catalog: Arc<InMemoryGroupCatalog>,
    pub moderator: Actor,
}

impl Admission {
    /// Registers a published, open group with `capacity` seats.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog rejects the group.
    pub fn open_group(&self, capacity: u32) -> Result<GroupProfile, eyre::Report> {
        let profile = GroupProfile::open(GroupId::new(), ProgramId::new(), capacity);
        self.catalog.upsert_group(profile)?;
        Ok(profile)
    }

    /// Submits an application from a fresh candidate and moves it to review.
    ///
    /// # Errors
    ///
    /// Returns an error if submission or review fails.
    pub async fn reviewed_application(
        &self,
        group: &GroupProfile,
    ) -> Result<EnrollmentApplication, eyre::Report> {
        let candidate = Actor::candidate(UserId::new());
        let submitted = self
            .lifecycle
            .create(&candidate, CreateApplicationRequest::new(group.group_id))
            .await?;
        let reviewed = self
            .lifecycle
            .change_status(
                &self.moderator,
                ChangeStatusRequest::new(submitted.id(), ApplicationStatus::InReview),
            )
            .await?;
        Ok(reviewed)
    }
}

/// Builds the approval commit the lifecycle service would hand to a store.
///
/// # Errors
///
/// Returns an error if `application` cannot move to approved.
pub fn approval_commit(
    application: &EnrollmentApplication,
    moderator: &Actor,
    requires_interview: bool,
) -> Result<TransitionCommit, eyre::Report> {
    let clock = DefaultClock;
    let actor_id = moderator
        .user_id()
        .ok_or_else(|| eyre::eyre!("moderator has no user id"))?;
    let mut approved = application.clone();
    let transition =
        approved.transition_to(ApplicationStatus::Approved, moderator.role(), &clock)?;
    let event = AdmissionEvent::StatusChanged {
        application_id: approved.id(),
        user_id: approved.applicant_id(),
        group_id: approved.group_id(),
        actor_id,
        actor_role: moderator.role(),
        transition,
        reason: String::new(),
    };
    Ok(TransitionCommit {
        expected_status: transition.from,
        audit: AuditRecord::capture(
            approved.id(),
            actor_id,
            moderator.role(),
            transition,
            "",
            &clock,
        ),
        admission: Some(SeatReservation {
            enrollment: Enrollment::admit(approved.applicant_id(), approved.group_id(), &clock),
            capacity: 3,
            requires_interview,
        }),
        event: event.into_outbox(&clock),
        application: approved,
    })
}

/// Builds a moderator-recorded interview for `application`.
#[must_use]
pub fn moderator_interview(
    application: &EnrollmentApplication,
    moderator: &Actor,
    result: InterviewResult,
) -> Interview {
    let recording = InterviewRecording {
        application_id: application.id(),
        group_id: application.group_id(),
        candidate_id: application.applicant_id(),
        interviewer_id: moderator.user_id().unwrap_or_else(UserId::new),
        interviewer_role: InterviewerRole::Moderator,
        result,
        comment: String::new(),
    };
    Interview::record(recording, &DefaultClock)
}

/// Provides services over a fresh in-memory store.
#[fixture]
pub fn admission() -> Admission {
    let store = Arc::new(InMemoryAdmissionStore::new());
    let catalog = Arc::new(InMemoryGroupCatalog::new());
    let clock = Arc::new(DefaultClock);
    Admission {
        lifecycle: ApplicationLifecycleService::new(
            Arc::clone(&store),
            Arc::clone(&store),
            Arc::clone(&catalog),
            Arc::clone(&clock),
        ),
        interviews: InterviewService::new(
            Arc::clone(&store),
            Arc::clone(&store),
            Arc::clone(&catalog),
            clock,
        ),
        store,
        catalog,
        moderator: Actor::moderator(UserId::new()),
    }
}
