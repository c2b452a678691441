//! Append-only audit trail of application status changes.

use super::{ActorRole, ApplicationId, AuditRecordId, StatusTransition, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// One immutable entry per successful status transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Record identifier.
    pub id: AuditRecordId,
    /// Application whose status changed.
    pub application_id: ApplicationId,
    /// User who performed the change.
    pub actor_id: UserId,
    /// Role the actor held at the time.
    pub actor_role: ActorRole,
    /// Status transition that was applied.
    pub transition: StatusTransition,
    /// Reason given by the actor, possibly empty.
    pub reason: String,
    /// When the change was recorded.
    pub created_at: DateTime<Utc>,
}

impl AuditRecord {
    /// Records `transition` performed by `actor_id` acting as `actor_role`.
    #[must_use]
    pub fn capture(
        application_id: ApplicationId,
        actor_id: UserId,
        actor_role: ActorRole,
        transition: StatusTransition,
        reason: impl Into<String>,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: AuditRecordId::new(),
            application_id,
            actor_id,
            actor_role,
            transition,
            reason: reason.into(),
            created_at: clock.utc(),
        }
    }
}
