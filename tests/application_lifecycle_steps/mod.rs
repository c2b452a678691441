//! Step definitions for application lifecycle scenarios.

mod when;
pub mod world;
