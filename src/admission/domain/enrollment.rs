//! Group seats created by admission.

use super::{EnrollmentId, GroupId, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// A seat held by a user in a group, unique per (user, group).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    id: EnrollmentId,
    user_id: UserId,
    group_id: GroupId,
    created_at: DateTime<Utc>,
}

/// Result of an idempotent enrolment insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentOutcome {
    /// A new seat was created.
    Created,
    /// The user already held a seat; nothing changed.
    AlreadyEnrolled,
}

impl Enrollment {
    /// Creates a new seat for `user_id` in `group_id`.
    #[must_use]
    pub fn admit(user_id: UserId, group_id: GroupId, clock: &impl Clock) -> Self {
        Self {
            id: EnrollmentId::new(),
            user_id,
            group_id,
            created_at: clock.utc(),
        }
    }

    /// Reconstructs a seat from persisted storage.
    #[must_use]
    pub const fn from_persisted(
        id: EnrollmentId,
        user_id: UserId,
        group_id: GroupId,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            group_id,
            created_at,
        }
    }

    /// Returns the seat identifier.
    #[must_use]
    pub const fn id(&self) -> EnrollmentId {
        self.id
    }

    /// Returns the enrolled user.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the group.
    #[must_use]
    pub const fn group_id(&self) -> GroupId {
        self.group_id
    }

    /// Returns the admission timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
