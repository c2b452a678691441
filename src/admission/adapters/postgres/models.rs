//! Diesel row models for admission persistence.

use super::schema::{
    application_status_audit, enrollment_applications, enrollments, interviews, outbox_events,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

/// Application row, used for both reads and inserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = enrollment_applications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ApplicationRow {
    /// Application identifier.
    pub id: Uuid,
    /// Applicant.
    pub user_id: Uuid,
    /// Target group.
    pub group_id: Uuid,
    /// Lifecycle status.
    pub status: String,
    /// Applicant's comment.
    pub comment: String,
    /// Submission timestamp.
    pub created_at: DateTime<Utc>,
    /// Latest status change timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Enrolment row.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = enrollments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct EnrollmentRow {
    /// Enrolment identifier.
    pub id: Uuid,
    /// Enrolled user.
    pub user_id: Uuid,
    /// Group.
    pub group_id: Uuid,
    /// Admission timestamp.
    pub created_at: DateTime<Utc>,
}

/// Audit trail row.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = application_status_audit)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AuditRow {
    /// Record identifier.
    pub id: Uuid,
    /// Changed application.
    pub application_id: Uuid,
    /// Acting user.
    pub actor_id: Uuid,
    /// Role of the acting user.
    pub actor_role: String,
    /// Status before the change.
    pub from_status: String,
    /// Status after the change.
    pub to_status: String,
    /// Reason given for the change.
    pub reason: String,
    /// Change timestamp.
    pub created_at: DateTime<Utc>,
}

/// Interview row.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = interviews)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct InterviewRow {
    /// Interview identifier.
    pub id: Uuid,
    /// Interviewed application.
    pub application_id: Uuid,
    /// Group of the application.
    pub group_id: Uuid,
    /// Candidate.
    pub candidate_id: Uuid,
    /// Recording staff member.
    pub interviewer_id: Uuid,
    /// Capacity of the interviewer.
    pub interviewer_role: String,
    /// Recorded outcome.
    pub result: String,
    /// Interviewer notes.
    pub comment: String,
    /// First recording timestamp.
    pub created_at: DateTime<Utc>,
    /// Latest recording timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Outbox row.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = outbox_events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OutboxRow {
    /// Event identifier.
    pub id: Uuid,
    /// Aggregate kind.
    pub aggregate_type: String,
    /// Aggregate identifier.
    pub aggregate_id: Uuid,
    /// Event type name.
    pub event_type: String,
    /// JSON payload.
    pub payload: Value,
    /// Enqueue timestamp.
    pub created_at: DateTime<Utc>,
    /// Delivery acknowledgement timestamp.
    pub dispatched_at: Option<DateTime<Utc>>,
}

/// Group joined with its programme's visibility flag.
#[derive(Debug, Clone, Queryable)]
pub struct GroupProfileRow {
    /// Group identifier.
    pub group_id: Uuid,
    /// Owning programme.
    pub program_id: Uuid,
    /// Programme visibility.
    pub program_published: bool,
    /// Group accepts applications.
    pub is_open: bool,
    /// Approval requires an interview.
    pub requires_interview: bool,
    /// Seat limit.
    pub capacity: i32,
}
