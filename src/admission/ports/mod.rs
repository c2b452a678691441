//! Port contracts for the admission engine.
//!
//! Ports define infrastructure-agnostic interfaces used by admission
//! services.

pub mod application;
pub mod catalog;
pub mod interview;
pub mod outbox;

pub use application::{
    ApplicationFilter, ApplicationRepository, ApplicationRepositoryError,
    ApplicationRepositoryResult, OutboxWrite, SeatReservation, TransitionCommit,
};
pub use catalog::{CatalogError, CatalogResult, GroupCatalog};
pub use interview::{
    InterviewRepository, InterviewRepositoryError, InterviewRepositoryResult, StoredInterview,
};
pub use outbox::{OutboxRepository, OutboxRepositoryError, OutboxRepositoryResult};
