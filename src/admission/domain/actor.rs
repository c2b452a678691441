//! Acting identities and their role classes.

use super::{ParseActorRoleError, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role supplied by the identity resolver for the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    /// A regular user applying to groups.
    Candidate,
    /// Staff member moderating applications.
    Moderator,
    /// Staff member with full administrative rights.
    Admin,
    /// Unauthenticated caller.
    Anonymous,
}

/// Coarse role class used by the status model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoleClass {
    /// Self-service rights over one's own applications.
    Candidate,
    /// Screening and admission rights over all applications.
    Staff,
}

impl ActorRole {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Candidate => "candidate",
            Self::Moderator => "moderator",
            Self::Admin => "admin",
            Self::Anonymous => "anonymous",
        }
    }

    /// Returns the role class, or `None` when the role carries no
    /// transition rights.
    #[must_use]
    pub const fn class(self) -> Option<RoleClass> {
        match self {
            Self::Candidate => Some(RoleClass::Candidate),
            Self::Moderator | Self::Admin => Some(RoleClass::Staff),
            Self::Anonymous => None,
        }
    }

    /// Returns `true` for moderators and administrators.
    #[must_use]
    pub const fn is_staff(self) -> bool {
        matches!(self.class(), Some(RoleClass::Staff))
    }
}

impl TryFrom<&str> for ActorRole {
    type Error = ParseActorRoleError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "candidate" => Ok(Self::Candidate),
            "moderator" => Ok(Self::Moderator),
            "admin" => Ok(Self::Admin),
            "anonymous" => Ok(Self::Anonymous),
            _ => Err(ParseActorRoleError(value.to_owned())),
        }
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The identity on whose behalf an engine operation runs.
///
/// Actors are passed explicitly into every service call; the engine never
/// reads request-scoped ambient state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    user_id: Option<UserId>,
    role: ActorRole,
}

impl Actor {
    /// Creates an actor from resolver output.
    #[must_use]
    pub const fn new(user_id: Option<UserId>, role: ActorRole) -> Self {
        Self { user_id, role }
    }

    /// Creates an authenticated candidate.
    #[must_use]
    pub const fn candidate(user_id: UserId) -> Self {
        Self::new(Some(user_id), ActorRole::Candidate)
    }

    /// Creates an authenticated moderator.
    #[must_use]
    pub const fn moderator(user_id: UserId) -> Self {
        Self::new(Some(user_id), ActorRole::Moderator)
    }

    /// Creates an authenticated administrator.
    #[must_use]
    pub const fn admin(user_id: UserId) -> Self {
        Self::new(Some(user_id), ActorRole::Admin)
    }

    /// Creates an unresolved actor.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self::new(None, ActorRole::Anonymous)
    }

    /// Returns the resolved user identifier, if any.
    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    /// Returns the actor role.
    #[must_use]
    pub const fn role(&self) -> ActorRole {
        self.role
    }
}
