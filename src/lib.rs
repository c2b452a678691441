//! Intake: enrolment application lifecycle and admission engine.
//!
//! Candidates apply to capacity-limited groups, staff review and interview
//! them, and approval admits the candidate. Every status change is audited
//! and announced through a transactional outbox.
//!
//! # Architecture
//!
//! Intake follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (in-memory, `PostgreSQL`)
//!
//! # Modules
//!
//! - [`admission`]: Application lifecycle, admission policy and outbox
//! - [`config`]: Environment configuration for the `PostgreSQL` adapters

pub mod admission;
pub mod config;
