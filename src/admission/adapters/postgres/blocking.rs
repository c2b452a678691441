//! Blocking operation helpers for `PostgreSQL` adapters.
//!
//! Diesel is synchronous, so every query runs on Tokio's blocking pool.

use diesel::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PoolError};
use diesel::result::Error as DieselError;
use tokio::task::JoinError;

/// `PostgreSQL` connection pool type used by admission adapters.
pub type AdmissionPgPool = Pool<ConnectionManager<PgConnection>>;

/// Error-type hooks every port error offers to the blocking helpers.
pub(super) trait StorageFailure: Send + 'static {
    fn from_pool(err: PoolError) -> Self;
    fn from_join(err: JoinError) -> Self;
    fn from_database(err: DieselError) -> Self;
}

/// Failure raised inside a transaction closure.
///
/// Diesel requires the closure error to absorb [`DieselError`]; domain
/// rejections travel alongside so the transaction still rolls back.
#[derive(Debug)]
pub(super) enum TxError<E> {
    Rejected(E),
    Database(DieselError),
}

impl<E> From<DieselError> for TxError<E> {
    fn from(err: DieselError) -> Self {
        Self::Database(err)
    }
}

impl<E: StorageFailure> TxError<E> {
    pub(super) fn into_port_error(self) -> E {
        match self {
            Self::Rejected(err) => err,
            Self::Database(err) => E::from_database(err),
        }
    }
}

/// Checks out a connection and runs `f` on the blocking pool.
pub(super) async fn run_blocking<F, T, E>(pool: &AdmissionPgPool, f: F) -> Result<T, E>
where
    F: FnOnce(&mut PgConnection) -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: StorageFailure,
{
    let shared_pool = pool.clone();
    tokio::task::spawn_blocking(move || {
        let mut connection = shared_pool.get().map_err(E::from_pool)?;
        f(&mut connection)
    })
    .await
    .map_err(E::from_join)?
}
