//! Domain model for the enrolment application lifecycle.
//!
//! The status model, admission policy and event types are pure: they perform
//! no I/O and take time from an injected clock.

mod actor;
mod application;
mod audit;
mod catalog;
mod enrollment;
mod error;
mod event;
mod ids;
mod interview;
mod policy;
mod status;

pub use actor::{Actor, ActorRole, RoleClass};
pub use application::{EnrollmentApplication, PersistedApplicationData, StatusTransition};
pub use audit::AuditRecord;
pub use catalog::GroupProfile;
pub use enrollment::{Enrollment, EnrollmentOutcome};
pub use error::{
    AdmissionError, ParseActorRoleError, ParseApplicationStatusError, ParseInterviewResultError,
    ParseInterviewerRoleError, TransitionError,
};
pub use event::{
    APPLICATION_AGGREGATE, AdmissionEvent, INTERVIEW_AGGREGATE, OutboxEvent, PersistedOutboxData,
};
pub use ids::{
    ApplicationId, AuditRecordId, EnrollmentId, GroupId, InterviewId, OutboxEventId, ProgramId,
    UserId,
};
pub use interview::{
    Interview, InterviewRecording, InterviewResult, InterviewerRole, PersistedInterviewData,
};
pub use policy::AdmissionPolicy;
pub use status::ApplicationStatus;
