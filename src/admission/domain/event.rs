//! Domain events and their durable outbox representation.

use super::{
    ActorRole, ApplicationId, EnrollmentApplication, GroupId, Interview, InterviewResult,
    InterviewerRole, OutboxEventId, StatusTransition, UserId,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

/// Aggregate type recorded for application events.
pub const APPLICATION_AGGREGATE: &str = "enrollment_application";

/// Aggregate type recorded for interview events.
pub const INTERVIEW_AGGREGATE: &str = "interview";

/// Events emitted by the admission engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionEvent {
    /// A candidate submitted a new application.
    ApplicationCreated {
        /// New application.
        application_id: ApplicationId,
        /// Applicant.
        user_id: UserId,
        /// Target group.
        group_id: GroupId,
    },
    /// Staff or the candidate changed an application's status.
    StatusChanged {
        /// Changed application.
        application_id: ApplicationId,
        /// Applicant.
        user_id: UserId,
        /// Target group.
        group_id: GroupId,
        /// User who changed the status.
        actor_id: UserId,
        /// Role of that user.
        actor_role: ActorRole,
        /// Applied transition.
        transition: StatusTransition,
        /// Reason supplied with the change.
        reason: String,
    },
    /// The candidate withdrew the application.
    ApplicationCancelled {
        /// Withdrawn application.
        application_id: ApplicationId,
        /// Applicant.
        user_id: UserId,
        /// Target group.
        group_id: GroupId,
    },
    /// An interview outcome was recorded or replaced.
    InterviewRecorded {
        /// Interviewed application.
        application_id: ApplicationId,
        /// Group of the application.
        group_id: GroupId,
        /// Candidate.
        candidate_id: UserId,
        /// Recorded outcome.
        result: InterviewResult,
        /// Capacity in which the outcome was recorded.
        actor_role: InterviewerRole,
    },
}

impl AdmissionEvent {
    /// Builds the creation event for a freshly submitted application.
    #[must_use]
    pub const fn created(application: &EnrollmentApplication) -> Self {
        Self::ApplicationCreated {
            application_id: application.id(),
            user_id: application.applicant_id(),
            group_id: application.group_id(),
        }
    }

    /// Builds the cancellation event for a withdrawn application.
    #[must_use]
    pub const fn cancelled(application: &EnrollmentApplication) -> Self {
        Self::ApplicationCancelled {
            application_id: application.id(),
            user_id: application.applicant_id(),
            group_id: application.group_id(),
        }
    }

    /// Builds the recording event for an interview.
    #[must_use]
    pub const fn interview_recorded(interview: &Interview) -> Self {
        Self::InterviewRecorded {
            application_id: interview.application_id(),
            group_id: interview.group_id(),
            candidate_id: interview.candidate_id(),
            result: interview.result(),
            actor_role: interview.interviewer_role(),
        }
    }

    /// Returns the stable event type name.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::ApplicationCreated { .. } => "application.created",
            Self::StatusChanged { .. } => "application.status_changed",
            Self::ApplicationCancelled { .. } => "application.cancelled",
            Self::InterviewRecorded { .. } => "interview.recorded",
        }
    }

    /// Returns the aggregate type the event belongs to.
    #[must_use]
    pub const fn aggregate_type(&self) -> &'static str {
        match self {
            Self::InterviewRecorded { .. } => INTERVIEW_AGGREGATE,
            _ => APPLICATION_AGGREGATE,
        }
    }

    /// Returns the identifier of the aggregate instance.
    ///
    /// Interview events are keyed by application so every event about one
    /// enrolment shares an aggregate key.
    #[must_use]
    pub const fn aggregate_id(&self) -> Uuid {
        match self {
            Self::ApplicationCreated { application_id, .. }
            | Self::StatusChanged { application_id, .. }
            | Self::ApplicationCancelled { application_id, .. }
            | Self::InterviewRecorded { application_id, .. } => application_id.into_inner(),
        }
    }

    /// Returns the stable JSON payload.
    #[must_use]
    pub fn payload(&self) -> Value {
        match self {
            Self::ApplicationCreated {
                application_id,
                user_id,
                group_id,
            }
            | Self::ApplicationCancelled {
                application_id,
                user_id,
                group_id,
            } => json!({
                "application_id": application_id,
                "user_id": user_id,
                "group_id": group_id,
            }),
            Self::StatusChanged {
                application_id,
                user_id,
                group_id,
                actor_id,
                actor_role,
                transition,
                reason,
            } => json!({
                "application_id": application_id,
                "user_id": user_id,
                "group_id": group_id,
                "actor_id": actor_id,
                "actor_role": actor_role.as_str(),
                "from": transition.from.as_str(),
                "to": transition.to.as_str(),
                "reason": reason,
            }),
            Self::InterviewRecorded {
                application_id,
                group_id,
                candidate_id,
                result,
                actor_role,
            } => json!({
                "application_id": application_id,
                "group_id": group_id,
                "candidate_id": candidate_id,
                "result": result.as_str(),
                "actor_role": actor_role.as_str(),
            }),
        }
    }

    /// Converts the event into an outbox entry stamped by `clock`.
    #[must_use]
    pub fn into_outbox(self, clock: &impl Clock) -> OutboxEvent {
        OutboxEvent {
            id: OutboxEventId::new(),
            aggregate_type: self.aggregate_type().to_owned(),
            aggregate_id: self.aggregate_id(),
            event_type: self.event_type().to_owned(),
            payload: self.payload(),
            created_at: clock.utc(),
            dispatched_at: None,
        }
    }
}

/// Immutable outbox entry awaiting asynchronous delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboxEvent {
    id: OutboxEventId,
    aggregate_type: String,
    aggregate_id: Uuid,
    event_type: String,
    payload: Value,
    created_at: DateTime<Utc>,
    dispatched_at: Option<DateTime<Utc>>,
}

/// Parameter object for reconstructing a persisted outbox entry.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedOutboxData {
    /// Persisted event identifier.
    pub id: OutboxEventId,
    /// Persisted aggregate type.
    pub aggregate_type: String,
    /// Persisted aggregate identifier.
    pub aggregate_id: Uuid,
    /// Persisted event type.
    pub event_type: String,
    /// Persisted JSON payload.
    pub payload: Value,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted dispatch timestamp, if the relay has delivered it.
    pub dispatched_at: Option<DateTime<Utc>>,
}

impl OutboxEvent {
    /// Reconstructs an outbox entry from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedOutboxData) -> Self {
        Self {
            id: data.id,
            aggregate_type: data.aggregate_type,
            aggregate_id: data.aggregate_id,
            event_type: data.event_type,
            payload: data.payload,
            created_at: data.created_at,
            dispatched_at: data.dispatched_at,
        }
    }

    /// Returns the event identifier.
    #[must_use]
    pub const fn id(&self) -> OutboxEventId {
        self.id
    }

    /// Returns the aggregate type.
    #[must_use]
    pub fn aggregate_type(&self) -> &str {
        &self.aggregate_type
    }

    /// Returns the aggregate identifier.
    #[must_use]
    pub const fn aggregate_id(&self) -> Uuid {
        self.aggregate_id
    }

    /// Returns the event type name.
    #[must_use]
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Returns the JSON payload.
    #[must_use]
    pub const fn payload(&self) -> &Value {
        &self.payload
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the relay marked the event as dispatched.
    #[must_use]
    pub const fn dispatched_at(&self) -> Option<DateTime<Utc>> {
        self.dispatched_at
    }

    /// Marks the event as dispatched unless it already is.
    ///
    /// Returns `true` when the event changed.
    pub fn mark_dispatched(&mut self, at: DateTime<Utc>) -> bool {
        if self.dispatched_at.is_some() {
            return false;
        }
        self.dispatched_at = Some(at);
        true
    }
}
