//! Enrolment application lifecycle and admission.
//!
//! Candidates apply to a group, staff screen and interview them, and approved
//! candidates are admitted into a capacity-limited group. Every transition is
//! audited and announced through a transactional outbox. The module follows
//! hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
