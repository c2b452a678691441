//! Interview outcomes recorded by staff for an application.

use super::{
    ApplicationId, GroupId, InterviewId, ParseInterviewResultError, ParseInterviewerRoleError,
    UserId,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a candidate interview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewResult {
    /// Interview scheduled or held, no verdict yet.
    Pending,
    /// Interviewer recommends admission.
    Recommended,
    /// Interviewer advises against admission.
    NotRecommended,
    /// Interviewer needs a follow-up before deciding.
    NeedsMore,
}

impl InterviewResult {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Recommended => "recommended",
            Self::NotRecommended => "not_recommended",
            Self::NeedsMore => "needs_more",
        }
    }

    /// Returns `true` only for [`InterviewResult::Recommended`].
    #[must_use]
    pub const fn permits_admission(self) -> bool {
        matches!(self, Self::Recommended)
    }
}

impl TryFrom<&str> for InterviewResult {
    type Error = ParseInterviewResultError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "recommended" => Ok(Self::Recommended),
            "not_recommended" => Ok(Self::NotRecommended),
            "needs_more" => Ok(Self::NeedsMore),
            _ => Err(ParseInterviewResultError(value.to_owned())),
        }
    }
}

impl fmt::Display for InterviewResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capacity in which the interviewer recorded the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewerRole {
    /// Teacher assigned to the group.
    Teacher,
    /// Moderator.
    Moderator,
    /// Administrator.
    Admin,
}

impl InterviewerRole {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Teacher => "teacher",
            Self::Moderator => "moderator",
            Self::Admin => "admin",
        }
    }
}

impl TryFrom<&str> for InterviewerRole {
    type Error = ParseInterviewerRoleError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "teacher" => Ok(Self::Teacher),
            "moderator" => Ok(Self::Moderator),
            "admin" => Ok(Self::Admin),
            _ => Err(ParseInterviewerRoleError(value.to_owned())),
        }
    }
}

impl fmt::Display for InterviewerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Values captured each time an interviewer records an outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterviewRecording {
    /// Application under interview.
    pub application_id: ApplicationId,
    /// Group the application targets.
    pub group_id: GroupId,
    /// Candidate being interviewed.
    pub candidate_id: UserId,
    /// Staff member recording the result.
    pub interviewer_id: UserId,
    /// Capacity of the interviewer.
    pub interviewer_role: InterviewerRole,
    /// Recorded outcome.
    pub result: InterviewResult,
    /// Free-text notes.
    pub comment: String,
}

/// The single live interview record of an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interview {
    id: InterviewId,
    application_id: ApplicationId,
    group_id: GroupId,
    candidate_id: UserId,
    interviewer_id: UserId,
    interviewer_role: InterviewerRole,
    result: InterviewResult,
    comment: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted interview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedInterviewData {
    /// Persisted interview identifier.
    pub id: InterviewId,
    /// Values of the latest recording.
    pub recording: InterviewRecording,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest recording timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Interview {
    /// Creates the first interview record for an application.
    #[must_use]
    pub fn record(recording: InterviewRecording, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self::assemble(InterviewId::new(), recording, timestamp, timestamp)
    }

    /// Reconstructs an interview from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedInterviewData) -> Self {
        Self::assemble(data.id, data.recording, data.created_at, data.updated_at)
    }

    /// Takes over the outcome of `replacement` while keeping this record's
    /// identity and creation time.
    ///
    /// The application keeps exactly one live interview however often it is
    /// re-recorded.
    #[must_use]
    pub fn replaced_by(&self, replacement: &Self) -> Self {
        Self {
            id: self.id,
            created_at: self.created_at,
            comment: replacement.comment.clone(),
            ..*replacement
        }
    }

    fn assemble(
        id: InterviewId,
        recording: InterviewRecording,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        let InterviewRecording {
            application_id,
            group_id,
            candidate_id,
            interviewer_id,
            interviewer_role,
            result,
            comment,
        } = recording;
        Self {
            id,
            application_id,
            group_id,
            candidate_id,
            interviewer_id,
            interviewer_role,
            result,
            comment,
            created_at,
            updated_at,
        }
    }

    /// Returns the interview identifier.
    #[must_use]
    pub const fn id(&self) -> InterviewId {
        self.id
    }

    /// Returns the interviewed application.
    #[must_use]
    pub const fn application_id(&self) -> ApplicationId {
        self.application_id
    }

    /// Returns the group of the interviewed application.
    #[must_use]
    pub const fn group_id(&self) -> GroupId {
        self.group_id
    }

    /// Returns the candidate.
    #[must_use]
    pub const fn candidate_id(&self) -> UserId {
        self.candidate_id
    }

    /// Returns the interviewer.
    #[must_use]
    pub const fn interviewer_id(&self) -> UserId {
        self.interviewer_id
    }

    /// Returns the interviewer's capacity.
    #[must_use]
    pub const fn interviewer_role(&self) -> InterviewerRole {
        self.interviewer_role
    }

    /// Returns the recorded outcome.
    #[must_use]
    pub const fn result(&self) -> InterviewResult {
        self.result
    }

    /// Returns the interviewer's notes.
    #[must_use]
    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest recording timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
