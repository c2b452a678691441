//! In-memory adapters for admission tests and local tooling.

mod catalog;
mod store;

pub use catalog::InMemoryGroupCatalog;
pub use store::InMemoryAdmissionStore;
