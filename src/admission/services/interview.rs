//! Interview recording service.

use super::lifecycle::report_outbox;
use crate::admission::{
    domain::{
        Actor, ActorRole, AdmissionEvent, ApplicationId, EnrollmentApplication, Interview,
        InterviewRecording, InterviewResult, InterviewerRole, UserId,
    },
    ports::{
        ApplicationRepository, ApplicationRepositoryError, CatalogError, GroupCatalog,
        InterviewRepository, InterviewRepositoryError,
    },
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Request payload for recording an interview outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordInterviewRequest {
    application_id: ApplicationId,
    result: InterviewResult,
    comment: String,
}

impl RecordInterviewRequest {
    /// Creates a request without notes.
    #[must_use]
    pub const fn new(application_id: ApplicationId, result: InterviewResult) -> Self {
        Self {
            application_id,
            result,
            comment: String::new(),
        }
    }

    /// Sets the interviewer's notes.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }
}

/// Service-level errors for interview operations.
#[derive(Debug, Error)]
pub enum InterviewServiceError {
    /// No actor could be resolved for the request.
    #[error("unauthorized")]
    Unauthorized,
    /// The application does not exist.
    #[error("application {0} not found")]
    NotFound(ApplicationId),
    /// The actor is neither staff nor a teacher of the application's group.
    #[error("user {0} is not an assigned teacher of the group")]
    NotAssignedTeacher(UserId),
    /// Application lookup failed.
    #[error(transparent)]
    Application(#[from] ApplicationRepositoryError),
    /// Interview storage failed.
    #[error(transparent)]
    Repository(#[from] InterviewRepositoryError),
    /// Catalog lookup failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl InterviewServiceError {
    /// Returns a stable reason code for the failure.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::NotFound(_) => "not_found",
            Self::NotAssignedTeacher(_) => "not_assigned_teacher",
            Self::Application(_) | Self::Repository(_) | Self::Catalog(_) => "storage",
        }
    }
}

/// Result type for interview service operations.
pub type InterviewServiceResult<T> = Result<T, InterviewServiceError>;

/// Records and reads interview outcomes.
pub struct InterviewService<A, I, G, C>
where
    A: ApplicationRepository,
    I: InterviewRepository,
    G: GroupCatalog,
    C: Clock + Send + Sync,
{
    applications: Arc<A>,
    interviews: Arc<I>,
    catalog: Arc<G>,
    clock: Arc<C>,
}

impl<A, I, G, C> Clone for InterviewService<A, I, G, C>
where
    A: ApplicationRepository,
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

impl<A, I, G, C> InterviewService<A, I, G, C>
where
    A: ApplicationRepository,
    I: InterviewRepository,
    G: GroupCatalog,
    C: Clock + Send + Sync,
{
    /// Creates a new interview service.
    #[must_use]
    pub const fn new(
        applications: Arc<A>,
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

    /// Records an outcome, replacing any earlier one for the application.
    ///
    /// # Errors
    ///
    /// Returns [`InterviewServiceError::Unauthorized`],
    /// [`InterviewServiceError::NotFound`],
    /// [`InterviewServiceError::NotAssignedTeacher`], or storage errors.
    pub async fn record(
        &self,
        actor: &Actor,
        request: RecordInterviewRequest,
    ) -> InterviewServiceResult<Interview> {
        let (application, interviewer_id, interviewer_role) =
            self.authorize(actor, request.application_id).await?;
        let recording = InterviewRecording {
            application_id: application.id(),
            group_id: application.group_id(),
            candidate_id: application.applicant_id(),
            interviewer_id,
            interviewer_role,
            result: request.result,
            comment: request.comment,
        };

        let interview = self.upsert(recording).await?;
        info!(
            application_id = %interview.application_id(),
            result = %interview.result(),
            interviewer_role = %interview.interviewer_role(),
            "interview recorded"
        );
        Ok(interview)
    }

    /// Returns the live interview of an application, if any.
    ///
    /// # Errors
    ///
    /// Returns [`InterviewServiceError::Unauthorized`],
    /// [`InterviewServiceError::NotFound`],
    /// [`InterviewServiceError::NotAssignedTeacher`], or storage errors.
    pub async fn find(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
    ) -> InterviewServiceResult<Option<Interview>> {
        self.authorize(actor, application_id).await?;
        Ok(self.interviews.find_by_application(application_id).await?)
    }

    async fn authorize(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
    ) -> InterviewServiceResult<(EnrollmentApplication, UserId, InterviewerRole)> {
        let actor_id = actor.user_id().ok_or(InterviewServiceError::Unauthorized)?;
        let application = self
            .applications
            .find_by_id(application_id)
            .await?
            .ok_or(InterviewServiceError::NotFound(application_id))?;

        let role = match actor.role() {
            ActorRole::Admin => InterviewerRole::Admin,
            ActorRole::Moderator => InterviewerRole::Moderator,
            ActorRole::Candidate | ActorRole::Anonymous => {
                if !self
                    .catalog
                    .is_teacher_in_group(actor_id, application.group_id())
                    .await?
                {
                    return Err(InterviewServiceError::NotAssignedTeacher(actor_id));
                }
                InterviewerRole::Teacher
            }
        };
        Ok((application, actor_id, role))
    }

    async fn upsert(&self, recording: InterviewRecording) -> InterviewServiceResult<Interview> {
        let application_id = recording.application_id;
        let candidate = Interview::record(recording, &*self.clock);
        let event = AdmissionEvent::interview_recorded(&candidate).into_outbox(&*self.clock);
        let stored = match self.interviews.upsert(&candidate, &event).await {
            Err(InterviewRepositoryError::AlreadyRecorded(_)) => {
                debug!(
                    application_id = %application_id,
                    "interview inserted concurrently; replacing"
                );
                self.interviews.upsert(&candidate, &event).await?
            }
            other => other?,
        };
        report_outbox(application_id, event.event_type(), &stored.outbox);
        Ok(stored.interview)
    }
}
