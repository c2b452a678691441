//! Application services for the admission engine.

mod interview;
mod lifecycle;

pub use interview::{
    InterviewService, InterviewServiceError, InterviewServiceResult, RecordInterviewRequest,
};
pub use lifecycle::{
    ApplicationLifecycleError, ApplicationLifecycleResult, ApplicationLifecycleService,
    ChangeStatusRequest, CreateApplicationRequest,
};
