//! Enrolment application aggregate root.

use super::{ActorRole, ApplicationId, ApplicationStatus, GroupId, TransitionError, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// A candidate's request to join a specific group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentApplication {
    id: ApplicationId,
    applicant_id: UserId,
    group_id: GroupId,
    status: ApplicationStatus,
    comment: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedApplicationData {
    /// Persisted application identifier.
    pub id: ApplicationId,
    /// Persisted applicant identity.
    pub applicant_id: UserId,
    /// Persisted target group.
    pub group_id: GroupId,
    /// Persisted lifecycle status.
    pub status: ApplicationStatus,
    /// Persisted free-text comment.
    pub comment: String,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest status change timestamp.
    pub updated_at: DateTime<Utc>,
}

/// A validated status change applied to an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTransition {
    /// Status before the change.
    pub from: ApplicationStatus,
    /// Status after the change.
    pub to: ApplicationStatus,
}

impl EnrollmentApplication {
    /// Creates a new application in [`ApplicationStatus::Submitted`].
    #[must_use]
    pub fn submit(
        applicant_id: UserId,
        group_id: GroupId,
        comment: impl Into<String>,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        Self {
            id: ApplicationId::new(),
            applicant_id,
            group_id,
            status: ApplicationStatus::Submitted,
            comment: comment.into(),
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs an application from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedApplicationData) -> Self {
        Self {
            id: data.id,
            applicant_id: data.applicant_id,
            group_id: data.group_id,
            status: data.status,
            comment: data.comment,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the application identifier.
    #[must_use]
    pub const fn id(&self) -> ApplicationId {
        self.id
    }

    /// Returns the applicant identity.
    #[must_use]
    pub const fn applicant_id(&self) -> UserId {
        self.applicant_id
    }

    /// Returns the target group.
    #[must_use]
    pub const fn group_id(&self) -> GroupId {
        self.group_id
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> ApplicationStatus {
        self.status
    }

    /// Returns the applicant's comment.
    #[must_use]
    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest status change timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns `true` when `user_id` submitted this application.
    #[must_use]
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.applicant_id == user_id
    }

    /// Moves the application to `to` on behalf of an actor with `role`.
    ///
    /// The application is left untouched when the transition is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] when the status model forbids the
    /// transition.
    pub fn transition_to(
        &mut self,
        to: ApplicationStatus,
        role: ActorRole,
        clock: &impl Clock,
    ) -> Result<StatusTransition, TransitionError> {
        let from = self.status;
        from.can_transition(to, role)?;
        self.status = to;
        self.updated_at = clock.utc();
        Ok(StatusTransition { from, to })
    }
}
