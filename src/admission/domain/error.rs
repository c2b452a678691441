//! Error types for admission domain validation and parsing.

use super::{ActorRole, ApplicationStatus, GroupId, InterviewResult};
use thiserror::Error;

/// Errors returned by the application status model.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum TransitionError {
    /// The current status is final and can no longer change.
    #[error("cannot change final status {from}")]
    FinalStatus {
        /// Current (final) status.
        from: ApplicationStatus,
    },

    /// The transition is not permitted for the actor's role.
    #[error("invalid status transition {from} -> {to} for role {role}")]
    InvalidTransition {
        /// Current status.
        from: ApplicationStatus,
        /// Requested status.
        to: ApplicationStatus,
        /// Role of the acting user.
        role: ActorRole,
    },

    /// The actor's role has no transition rights at all.
    ///
    /// This signals a caller or configuration fault rather than a business
    /// rejection.
    #[error("unrecognised actor role: {0}")]
    UnrecognisedRole(ActorRole),
}

/// Errors returned by the admission policy.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum AdmissionError {
    /// The group requires an interview and none has been recorded.
    #[error("interview result is required before approval")]
    InterviewRequired,

    /// The recorded interview does not recommend the candidate.
    #[error("interview result {result} does not recommend admission")]
    InterviewNotPassed {
        /// Recorded interview result.
        result: InterviewResult,
    },

    /// The group has no free seats left.
    #[error("group {group_id} is full (capacity {capacity})")]
    NoSeatsAvailable {
        /// Group that is full.
        group_id: GroupId,
        /// Configured group capacity.
        capacity: u32,
    },
}

/// Error returned while parsing application statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown application status: {0}")]
pub struct ParseApplicationStatusError(pub String);

/// Error returned while parsing actor roles from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown actor role: {0}")]
pub struct ParseActorRoleError(pub String);

/// Error returned while parsing interview results from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown interview result: {0}")]
pub struct ParseInterviewResultError(pub String);

/// Error returned while parsing interviewer roles from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown interviewer role: {0}")]
pub struct ParseInterviewerRoleError(pub String);
