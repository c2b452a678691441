//! Application lifecycle service: the single write path for application
//! status.

use crate::admission::{
    domain::{
        Actor, AdmissionError, AdmissionEvent, AdmissionPolicy, ApplicationId, ApplicationStatus,
        AuditRecord, Enrollment, EnrollmentApplication, GroupId, GroupProfile, RoleClass,
        StatusTransition, TransitionError, UserId,
    },
    ports::{
        ApplicationFilter, ApplicationRepository, ApplicationRepositoryError, CatalogError,
        GroupCatalog, InterviewRepository, InterviewRepositoryError, OutboxWrite,
        SeatReservation, TransitionCommit,
    },
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Request payload for submitting an application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateApplicationRequest {
    group_id: GroupId,
    comment: String,
}

impl CreateApplicationRequest {
    /// Creates a request targeting `group_id` with an empty comment.
    #[must_use]
    pub const fn new(group_id: GroupId) -> Self {
        Self {
            group_id,
            comment: String::new(),
        }
    }

    /// Sets the applicant's comment.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }
}

/// Request payload for moving an application to another status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeStatusRequest {
    application_id: ApplicationId,
    to: ApplicationStatus,
    reason: String,
}

impl ChangeStatusRequest {
    /// Creates a request without a reason.
    #[must_use]
    pub const fn new(application_id: ApplicationId, to: ApplicationStatus) -> Self {
        Self {
            application_id,
            to,
            reason: String::new(),
        }
    }

    /// Sets the reason recorded in the audit trail.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }
}

/// Service-level errors for application lifecycle operations.
#[derive(Debug, Error)]
pub enum ApplicationLifecycleError {
    /// No actor could be resolved for the request.
    #[error("unauthorized")]
    Unauthorized,
    /// The actor has no rights over this application.
    #[error("forbidden to act on application {0}")]
    Forbidden(ApplicationId),
    /// The operation is reserved for staff.
    #[error("operation requires a staff role")]
    StaffOnly,
    /// The application does not exist.
    #[error("application {0} not found")]
    NotFound(ApplicationId),
    /// The group does not exist.
    #[error("group {0} not found")]
    GroupNotFound(GroupId),
    /// The group's program is not published.
    #[error("program of group {0} is not published")]
    ProgramNotVisible(GroupId),
    /// The group does not accept applications.
    #[error("group {0} is closed for applications")]
    GroupClosed(GroupId),
    /// Teachers cannot apply to programs they teach.
    #[error("teacher cannot apply to own program (group {0})")]
    TeacherOwnProgram(GroupId),
    /// The applicant already has a live application for the group.
    #[error("application already exists for group {0}")]
    AlreadyApplied(GroupId),
    /// The applicant was rejected from the group before.
    #[error("cannot reapply to group {0} after rejection")]
    ReapplicationBlocked(GroupId),
    /// The cancellation was refused; the cause is not disclosed.
    #[error("cannot cancel application")]
    CannotCancel,
    /// Another transition changed the application first.
    #[error("application {0} was changed concurrently")]
    ConcurrentTransition(ApplicationId),
    /// The status model rejected the transition.
    #[error(transparent)]
    Transition(#[from] TransitionError),
    /// The admission policy rejected the approval.
    #[error(transparent)]
    Admission(#[from] AdmissionError),
    /// Application storage failed.
    #[error(transparent)]
    Repository(ApplicationRepositoryError),
    /// Interview storage failed.
    #[error(transparent)]
    Interview(#[from] InterviewRepositoryError),
    /// Catalog lookup failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl ApplicationLifecycleError {
    /// Returns a stable reason code for the failure.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Forbidden(_) | Self::StaffOnly => "forbidden",
            Self::NotFound(_) | Self::GroupNotFound(_) => "not_found",
            Self::ProgramNotVisible(_) => "program_not_visible",
            Self::GroupClosed(_) => "group_closed",
            Self::TeacherOwnProgram(_) => "teacher_own_program",
            Self::AlreadyApplied(_) => "already_applied",
            Self::ReapplicationBlocked(_) => "reapplication_blocked",
            Self::CannotCancel => "cannot_cancel",
            Self::ConcurrentTransition(_) => "concurrent_transition",
            Self::Transition(TransitionError::FinalStatus { .. }) => "final_status",
            Self::Transition(TransitionError::InvalidTransition { .. }) => "invalid_transition",
            Self::Transition(TransitionError::UnrecognisedRole(_)) => "unrecognised_role",
            Self::Admission(AdmissionError::InterviewRequired) => "interview_required",
            Self::Admission(AdmissionError::InterviewNotPassed { .. }) => "interview_not_passed",
            Self::Admission(AdmissionError::NoSeatsAvailable { .. }) => "no_seats_available",
            Self::Repository(_) | Self::Interview(_) | Self::Catalog(_) => "storage",
        }
    }

    /// Returns `true` for storage failures as opposed to business rejections.
    #[must_use]
    pub const fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            Self::Repository(_) | Self::Interview(_) | Self::Catalog(_)
        )
    }
}

impl From<ApplicationRepositoryError> for ApplicationLifecycleError {
    fn from(err: ApplicationRepositoryError) -> Self {
        match err {
            ApplicationRepositoryError::NotFound(id) => Self::NotFound(id),
            ApplicationRepositoryError::StatusConflict { application_id, .. } => {
                Self::ConcurrentTransition(application_id)
            }
            ApplicationRepositoryError::NoSeatsAvailable { group_id, capacity } => {
                Self::Admission(AdmissionError::NoSeatsAvailable { group_id, capacity })
            }
            ApplicationRepositoryError::ActiveApplicationExists { group_id, .. } => {
                Self::AlreadyApplied(group_id)
            }
            ApplicationRepositoryError::AdmissionRefused(refusal) => Self::Admission(refusal),
            other @ (ApplicationRepositoryError::DuplicateApplication(_)
            | ApplicationRepositoryError::Persistence(_)) => Self::Repository(other),
        }
    }
}

/// Result type for application lifecycle service operations.
pub type ApplicationLifecycleResult<T> = Result<T, ApplicationLifecycleError>;

/// Application lifecycle orchestration service.
pub struct ApplicationLifecycleService<R, I, G, C>
where
    R: ApplicationRepository,
    I: InterviewRepository,
    G: GroupCatalog,
    C: Clock + Send + Sync,
{
    applications: Arc<R>,
    interviews: Arc<I>,
    catalog: Arc<G>,
    clock: Arc<C>,
}

impl<R, I, G, C> Clone for ApplicationLifecycleService<R, I, G, C>
where
    R: ApplicationRepository,
    I: InterviewRepository,
    G: GroupCatalog,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            applications: Arc::clone(&self.applications),
            interviews: Arc::clone(&self.interviews),
            catalog: Arc::clone(&self.catalog),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<R, I, G, C> ApplicationLifecycleService<R, I, G, C>
where
    R: ApplicationRepository,
    I: InterviewRepository,
    G: GroupCatalog,
    C: Clock + Send + Sync,
{
    /// Creates a new application lifecycle service.
    #[must_use]
    pub const fn new(
        applications: Arc<R>,
        interviews: Arc<I>,
        catalog: Arc<G>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            applications,
            interviews,
            catalog,
            clock,
        }
    }

    /// Submits a new application on behalf of `actor`.
    ///
    /// # Errors
    ///
    /// Returns [`ApplicationLifecycleError::Unauthorized`] without an actor,
    /// catalog gating errors (`GroupNotFound`, `ProgramNotVisible`,
    /// `GroupClosed`), reapplication errors (`TeacherOwnProgram`,
    /// `ReapplicationBlocked`, `AlreadyApplied`) or storage errors.
    pub async fn create(
        &self,
        actor: &Actor,
        request: CreateApplicationRequest,
    ) -> ApplicationLifecycleResult<EnrollmentApplication> {
        let applicant_id = actor
            .user_id()
            .ok_or(ApplicationLifecycleError::Unauthorized)?;
        let group = self.find_group_or_error(request.group_id).await?;
        self.ensure_may_apply(applicant_id, &group).await?;

        let application = EnrollmentApplication::submit(
            applicant_id,
            group.group_id,
            request.comment,
            &*self.clock,
        );
        let event = AdmissionEvent::created(&application).into_outbox(&*self.clock);
        let outbox = self.applications.store(&application, &event).await?;
        report_outbox(application.id(), event.event_type(), &outbox);

        info!(
            application_id = %application.id(),
            applicant_id = %applicant_id,
            group_id = %group.group_id,
            "application submitted"
        );
        Ok(application)
    }

    /// Moves an application to `request.to` on behalf of `actor`.
    ///
    /// Approval additionally consults the admission policy and creates the
    /// applicant's enrolment in the same commit.
    ///
    /// # Errors
    ///
    /// Returns [`ApplicationLifecycleError::Unauthorized`],
    /// [`ApplicationLifecycleError::NotFound`],
    /// [`ApplicationLifecycleError::Forbidden`] for a candidate acting on
    /// someone else's application, status model and admission policy
    /// rejections, [`ApplicationLifecycleError::ConcurrentTransition`], or
    /// storage errors.
    pub async fn change_status(
        &self,
        actor: &Actor,
        request: ChangeStatusRequest,
    ) -> ApplicationLifecycleResult<EnrollmentApplication> {
        let actor_id = actor
            .user_id()
            .ok_or(ApplicationLifecycleError::Unauthorized)?;
        let mut application = self.find_application_or_error(request.application_id).await?;
        if actor.role().class() == Some(RoleClass::Candidate) && !application.is_owned_by(actor_id)
        {
            return Err(ApplicationLifecycleError::Forbidden(application.id()));
        }

        let transition = application.transition_to(request.to, actor.role(), &*self.clock)?;
        let admission = if transition.to == ApplicationStatus::Approved {
            Some(self.reserve_seat(&application).await?)
        } else {
            None
        };

        let event = AdmissionEvent::StatusChanged {
            application_id: application.id(),
            user_id: application.applicant_id(),
            group_id: application.group_id(),
            actor_id,
            actor_role: actor.role(),
            transition,
            reason: request.reason.clone(),
        };
        self.commit(actor, &application, transition, request.reason, admission, event)
            .await?;
        Ok(application)
    }

    /// Withdraws the actor's own application.
    ///
    /// Every business rejection collapses into
    /// [`ApplicationLifecycleError::CannotCancel`] so callers cannot probe
    /// other users' applications.
    ///
    /// # Errors
    ///
    /// Returns [`ApplicationLifecycleError::Unauthorized`] without an actor,
    /// [`ApplicationLifecycleError::CannotCancel`], or storage errors.
    pub async fn cancel(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
    ) -> ApplicationLifecycleResult<EnrollmentApplication> {
        let actor_id = actor
            .user_id()
            .ok_or(ApplicationLifecycleError::Unauthorized)?;
        let Some(mut application) = self.applications.find_by_id(application_id).await? else {
            debug!(application_id = %application_id, "cancel refused: unknown application");
            return Err(ApplicationLifecycleError::CannotCancel);
        };
        if !application.is_owned_by(actor_id) {
            debug!(application_id = %application_id, "cancel refused: not the applicant");
            return Err(ApplicationLifecycleError::CannotCancel);
        }
        let transition = application
            .transition_to(ApplicationStatus::Cancelled, actor.role(), &*self.clock)
            .map_err(|err| {
                debug!(application_id = %application_id, error = %err, "cancel refused");
                ApplicationLifecycleError::CannotCancel
            })?;

        let event = AdmissionEvent::cancelled(&application);
        match self
            .commit(actor, &application, transition, String::new(), None, event)
            .await
        {
            Ok(()) => Ok(application),
            Err(ApplicationLifecycleError::ConcurrentTransition(_)) => {
                debug!(application_id = %application_id, "cancel refused: concurrent change");
                Err(ApplicationLifecycleError::CannotCancel)
            }
            Err(err) => Err(err),
        }
    }

    /// Returns an application visible to `actor`.
    ///
    /// # Errors
    ///
    /// Returns [`ApplicationLifecycleError::Unauthorized`],
    /// [`ApplicationLifecycleError::NotFound`],
    /// [`ApplicationLifecycleError::Forbidden`] when a non-staff actor is not
    /// the applicant, or storage errors.
    pub async fn find(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
    ) -> ApplicationLifecycleResult<EnrollmentApplication> {
        let actor_id = actor
            .user_id()
            .ok_or(ApplicationLifecycleError::Unauthorized)?;
        let application = self.find_application_or_error(application_id).await?;
        if !actor.role().is_staff() && !application.is_owned_by(actor_id) {
            return Err(ApplicationLifecycleError::Forbidden(application_id));
        }
        Ok(application)
    }

    /// Lists the actor's own applications, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`ApplicationLifecycleError::Unauthorized`] or storage errors.
    pub async fn list_mine(
        &self,
        actor: &Actor,
    ) -> ApplicationLifecycleResult<Vec<EnrollmentApplication>> {
        let actor_id = actor
            .user_id()
            .ok_or(ApplicationLifecycleError::Unauthorized)?;
        Ok(self.applications.list_by_applicant(actor_id).await?)
    }

    /// Lists applications matching `filter`; staff only.
    ///
    /// # Errors
    ///
    /// Returns [`ApplicationLifecycleError::Unauthorized`],
    /// [`ApplicationLifecycleError::StaffOnly`] for non-staff actors, or
    /// storage errors.
    pub async fn list(
        &self,
        actor: &Actor,
        filter: ApplicationFilter,
    ) -> ApplicationLifecycleResult<Vec<EnrollmentApplication>> {
        ensure_staff(actor)?;
        Ok(self.applications.list(filter).await?)
    }

    /// Returns the audit trail of an application; staff only.
    ///
    /// # Errors
    ///
    /// Returns [`ApplicationLifecycleError::Unauthorized`],
    /// [`ApplicationLifecycleError::StaffOnly`],
    /// [`ApplicationLifecycleError::NotFound`], or storage errors.
    pub async fn audit_trail(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
    ) -> ApplicationLifecycleResult<Vec<AuditRecord>> {
        ensure_staff(actor)?;
        self.find_application_or_error(application_id).await?;
        Ok(self.applications.audit_trail(application_id).await?)
    }

    /// Lists a group's enrolments; staff only.
    ///
    /// # Errors
    ///
    /// Returns [`ApplicationLifecycleError::Unauthorized`],
    /// [`ApplicationLifecycleError::StaffOnly`], or storage errors.
    pub async fn enrolled_in(
        &self,
        actor: &Actor,
        group_id: GroupId,
    ) -> ApplicationLifecycleResult<Vec<Enrollment>> {
        ensure_staff(actor)?;
        Ok(self.applications.list_enrollments(group_id).await?)
    }

    async fn find_application_or_error(
        &self,
        application_id: ApplicationId,
    ) -> ApplicationLifecycleResult<EnrollmentApplication> {
        self.applications
            .find_by_id(application_id)
            .await?
            .ok_or(ApplicationLifecycleError::NotFound(application_id))
    }

    async fn find_group_or_error(
        &self,
        group_id: GroupId,
    ) -> ApplicationLifecycleResult<GroupProfile> {
        self.catalog
            .find_group(group_id)
            .await?
            .ok_or(ApplicationLifecycleError::GroupNotFound(group_id))
    }

    async fn ensure_may_apply(
        &self,
        applicant_id: UserId,
        group: &GroupProfile,
    ) -> ApplicationLifecycleResult<()> {
        let group_id = group.group_id;
        if !group.program_published {
            return Err(ApplicationLifecycleError::ProgramNotVisible(group_id));
        }
        if !group.is_open {
            return Err(ApplicationLifecycleError::GroupClosed(group_id));
        }
        if self
            .catalog
            .is_teacher_in_program(applicant_id, group.program_id)
            .await?
        {
            return Err(ApplicationLifecycleError::TeacherOwnProgram(group_id));
        }
        if self.applications.has_rejected(applicant_id, group_id).await? {
            return Err(ApplicationLifecycleError::ReapplicationBlocked(group_id));
        }
        let latest = self
            .applications
            .find_latest_for(applicant_id, group_id)
            .await?;
        match latest.map(|existing| existing.status()) {
            None | Some(ApplicationStatus::Cancelled) => Ok(()),
            Some(ApplicationStatus::Rejected) => {
                Err(ApplicationLifecycleError::ReapplicationBlocked(group_id))
            }
            Some(
                ApplicationStatus::Submitted
                | ApplicationStatus::InReview
                | ApplicationStatus::Approved,
            ) => Err(ApplicationLifecycleError::AlreadyApplied(group_id)),
        }
    }

    async fn reserve_seat(
        &self,
        application: &EnrollmentApplication,
    ) -> ApplicationLifecycleResult<SeatReservation> {
        let group = self.find_group_or_error(application.group_id()).await?;
        let interview = self
            .interviews
            .find_by_application(application.id())
            .await?;
        let already_seated = self
            .applications
            .has_enrollment(application.applicant_id(), application.group_id())
            .await?;
        if already_seated {
            AdmissionPolicy::ensure_interview(group.requires_interview, interview.as_ref())?;
        } else {
            let enrolled = self
                .applications
                .count_enrollments(application.group_id())
                .await?;
            AdmissionPolicy::can_admit(&group, interview.as_ref(), enrolled)?;
        }

        Ok(SeatReservation {
            enrollment: Enrollment::admit(
                application.applicant_id(),
                application.group_id(),
                &*self.clock,
            ),
            capacity: group.capacity,
            requires_interview: group.requires_interview,
        })
    }

    async fn commit(
        &self,
        actor: &Actor,
        application: &EnrollmentApplication,
        transition: StatusTransition,
        reason: String,
        admission: Option<SeatReservation>,
        event: AdmissionEvent,
    ) -> ApplicationLifecycleResult<()> {
        let actor_id = actor
            .user_id()
            .ok_or(ApplicationLifecycleError::Unauthorized)?;
        let event_type = event.event_type();
        let commit = TransitionCommit {
            application: application.clone(),
            expected_status: transition.from,
            audit: AuditRecord::capture(
                application.id(),
                actor_id,
                actor.role(),
                transition,
                reason,
                &*self.clock,
            ),
            admission,
            event: event.into_outbox(&*self.clock),
        };
        let outbox = self.applications.commit_transition(&commit).await?;
        report_outbox(application.id(), event_type, &outbox);

        info!(
            application_id = %application.id(),
            from = %transition.from,
            to = %transition.to,
            actor_role = %actor.role(),
            "application status changed"
        );
        Ok(())
    }
}

const fn ensure_staff(actor: &Actor) -> ApplicationLifecycleResult<()> {
    if actor.user_id().is_none() {
        return Err(ApplicationLifecycleError::Unauthorized);
    }
    if !actor.role().is_staff() {
        return Err(ApplicationLifecycleError::StaffOnly);
    }
    Ok(())
}

pub(super) fn report_outbox(application_id: ApplicationId, event_type: &str, outbox: &OutboxWrite) {
    if let OutboxWrite::Dropped { reason } = outbox {
        warn!(
            application_id = %application_id,
            event_type,
            reason = %reason,
            "outbox event was not recorded; relay reconciliation required"
        );
    }
}
