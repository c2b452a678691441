//! Row-to-domain conversions for `PostgreSQL` persistence.
//!
//! Stored enumerations use their canonical strings. An unknown value is a
//! conversion error, never a default.

use super::models::{
    ApplicationRow, AuditRow, EnrollmentRow, GroupProfileRow, InterviewRow, OutboxRow,
};
use crate::admission::domain::{
    ActorRole, ApplicationId, ApplicationStatus, AuditRecord, AuditRecordId, Enrollment,
    EnrollmentApplication, EnrollmentId, GroupId, GroupProfile, Interview, InterviewId,
    InterviewRecording, InterviewResult, InterviewerRole, OutboxEvent, OutboxEventId,
    ParseActorRoleError, ParseApplicationStatusError, ParseInterviewResultError,
    ParseInterviewerRoleError, PersistedApplicationData, PersistedInterviewData,
    PersistedOutboxData, ProgramId, StatusTransition, UserId,
};
use std::num::TryFromIntError;
use thiserror::Error;

/// Stored data that does not map onto the domain model.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// Unknown application status.
    #[error(transparent)]
    Status(#[from] ParseApplicationStatusError),
    /// Unknown actor role.
    #[error(transparent)]
    ActorRole(#[from] ParseActorRoleError),
    /// Unknown interview result.
    #[error(transparent)]
    InterviewResult(#[from] ParseInterviewResultError),
    /// Unknown interviewer role.
    #[error(transparent)]
    InterviewerRole(#[from] ParseInterviewerRoleError),
    /// Capacity or count outside the domain range.
    #[error("stored number out of range: {0}")]
    OutOfRange(#[from] TryFromIntError),
}

pub(super) fn to_application_row(application: &EnrollmentApplication) -> ApplicationRow {
    ApplicationRow {
        id: application.id().into_inner(),
        user_id: application.applicant_id().into_inner(),
        group_id: application.group_id().into_inner(),
        status: application.status().as_str().to_owned(),
        comment: application.comment().to_owned(),
        created_at: application.created_at(),
        updated_at: application.updated_at(),
    }
}

pub(super) fn row_to_application(
    row: ApplicationRow,
) -> Result<EnrollmentApplication, ConversionError> {
    let status = ApplicationStatus::try_from(row.status.as_str())?;
    Ok(EnrollmentApplication::from_persisted(PersistedApplicationData {
        id: ApplicationId::from_uuid(row.id),
        applicant_id: UserId::from_uuid(row.user_id),
        group_id: GroupId::from_uuid(row.group_id),
        status,
        comment: row.comment,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}

pub(super) fn to_enrollment_row(enrollment: &Enrollment) -> EnrollmentRow {
    EnrollmentRow {
        id: enrollment.id().into_inner(),
        user_id: enrollment.user_id().into_inner(),
        group_id: enrollment.group_id().into_inner(),
        created_at: enrollment.created_at(),
    }
}

pub(super) const fn row_to_enrollment(row: &EnrollmentRow) -> Enrollment {
    Enrollment::from_persisted(
        EnrollmentId::from_uuid(row.id),
        UserId::from_uuid(row.user_id),
        GroupId::from_uuid(row.group_id),
        row.created_at,
    )
}

pub(super) fn to_audit_row(record: &AuditRecord) -> AuditRow {
    AuditRow {
        id: record.id.into_inner(),
        application_id: record.application_id.into_inner(),
        actor_id: record.actor_id.into_inner(),
        actor_role: record.actor_role.as_str().to_owned(),
        from_status: record.transition.from.as_str().to_owned(),
        to_status: record.transition.to.as_str().to_owned(),
        reason: record.reason.clone(),
        created_at: record.created_at,
    }
}

pub(super) fn row_to_audit(row: AuditRow) -> Result<AuditRecord, ConversionError> {
    let transition = StatusTransition {
        from: ApplicationStatus::try_from(row.from_status.as_str())?,
        to: ApplicationStatus::try_from(row.to_status.as_str())?,
    };
    Ok(AuditRecord {
        id: AuditRecordId::from_uuid(row.id),
        application_id: ApplicationId::from_uuid(row.application_id),
        actor_id: UserId::from_uuid(row.actor_id),
        actor_role: ActorRole::try_from(row.actor_role.as_str())?,
        transition,
        reason: row.reason,
        created_at: row.created_at,
    })
}

pub(super) fn to_interview_row(interview: &Interview) -> InterviewRow {
    InterviewRow {
        id: interview.id().into_inner(),
        application_id: interview.application_id().into_inner(),
        group_id: interview.group_id().into_inner(),
        candidate_id: interview.candidate_id().into_inner(),
        interviewer_id: interview.interviewer_id().into_inner(),
        interviewer_role: interview.interviewer_role().as_str().to_owned(),
        result: interview.result().as_str().to_owned(),
        comment: interview.comment().to_owned(),
        created_at: interview.created_at(),
        updated_at: interview.updated_at(),
    }
}

pub(super) fn row_to_interview(row: InterviewRow) -> Result<Interview, ConversionError> {
    let recording = InterviewRecording {
        application_id: ApplicationId::from_uuid(row.application_id),
        group_id: GroupId::from_uuid(row.group_id),
        candidate_id: UserId::from_uuid(row.candidate_id),
        interviewer_id: UserId::from_uuid(row.interviewer_id),
        interviewer_role: InterviewerRole::try_from(row.interviewer_role.as_str())?,
        result: InterviewResult::try_from(row.result.as_str())?,
        comment: row.comment,
    };
    Ok(Interview::from_persisted(PersistedInterviewData {
        id: InterviewId::from_uuid(row.id),
        recording,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}

pub(super) fn to_outbox_row(event: &OutboxEvent) -> OutboxRow {
    OutboxRow {
        id: event.id().into_inner(),
        aggregate_type: event.aggregate_type().to_owned(),
        aggregate_id: event.aggregate_id(),
        event_type: event.event_type().to_owned(),
        payload: event.payload().clone(),
        created_at: event.created_at(),
        dispatched_at: event.dispatched_at(),
    }
}

pub(super) fn row_to_outbox(row: OutboxRow) -> OutboxEvent {
    OutboxEvent::from_persisted(PersistedOutboxData {
        id: OutboxEventId::from_uuid(row.id),
        aggregate_type: row.aggregate_type,
        aggregate_id: row.aggregate_id,
        event_type: row.event_type,
        payload: row.payload,
        created_at: row.created_at,
        dispatched_at: row.dispatched_at,
    })
}

pub(super) fn row_to_group_profile(row: &GroupProfileRow) -> Result<GroupProfile, ConversionError> {
    let capacity = u32::try_from(row.capacity)?;
    Ok(
        GroupProfile::open(
            GroupId::from_uuid(row.group_id),
            ProgramId::from_uuid(row.program_id),
            capacity,
        )
        .with_program_published(row.program_published)
        .with_open(row.is_open)
        .with_interview_requirement(row.requires_interview),
    )
}
