//! `PostgreSQL` adapters for admission persistence.

mod blocking;
mod catalog;
mod conversion;
mod models;
mod schema;
mod store;

pub use blocking::AdmissionPgPool;
pub use catalog::PostgresGroupCatalog;
pub use conversion::ConversionError;
pub use store::PostgresAdmissionStore;

use crate::config::PostgresConfig;
use diesel::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PoolError};

/// Builds a connection pool from `config`.
///
/// # Errors
///
/// Returns [`PoolError`] when the initial connections cannot be opened.
pub fn build_pool(config: &PostgresConfig) -> Result<AdmissionPgPool, PoolError> {
    let manager = ConnectionManager::<PgConnection>::new(config.database_url());
    Pool::builder()
        .max_size(config.max_connections())
        .connection_timeout(config.connect_timeout())
        .build(manager)
}
