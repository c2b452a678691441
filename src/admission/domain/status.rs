//! Application status model and its role-gated transition table.

use super::{ActorRole, ParseApplicationStatusError, RoleClass, TransitionError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of an enrolment application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    /// Application has been sent by the candidate.
    Submitted,
    /// Staff are screening the application.
    InReview,
    /// Candidate was admitted (final).
    Approved,
    /// Candidate was turned down (final).
    Rejected,
    /// Candidate withdrew the application (final).
    Cancelled,
}

impl ApplicationStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Submitted,
        Self::InReview,
        Self::Approved,
        Self::Rejected,
        Self::Cancelled,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::InReview => "in_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns `true` when no further transition is permitted.
    #[must_use]
    pub const fn is_final(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected | Self::Cancelled)
    }

    /// Checks whether `role` may move an application from `self` to `to`.
    ///
    /// Candidates may only withdraw a submitted application. Staff move
    /// applications from `submitted` to `in_review` and then decide them.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::FinalStatus`] when `self` is final,
    /// [`TransitionError::UnrecognisedRole`] when the role has no role
    /// class, and [`TransitionError::InvalidTransition`] otherwise.
    pub const fn can_transition(self, to: Self, role: ActorRole) -> Result<(), TransitionError> {
        if self.is_final() {
            return Err(TransitionError::FinalStatus { from: self });
        }
        let Some(class) = role.class() else {
            return Err(TransitionError::UnrecognisedRole(role));
        };
        match (class, self, to) {
            (RoleClass::Candidate, Self::Submitted, Self::Cancelled)
            | (RoleClass::Staff, Self::Submitted, Self::InReview)
            | (RoleClass::Staff, Self::InReview, Self::Approved | Self::Rejected) => Ok(()),
            _ => Err(TransitionError::InvalidTransition {
                from: self,
                to,
                role,
            }),
        }
    }
}

impl TryFrom<&str> for ApplicationStatus {
    type Error = ParseApplicationStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "submitted" => Ok(Self::Submitted),
            "in_review" => Ok(Self::InReview),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(ParseApplicationStatusError(value.to_owned())),
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
