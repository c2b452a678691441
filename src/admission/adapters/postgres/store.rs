//! `PostgreSQL` store for applications, enrolments, interviews and the
//! outbox.
//!
//! Each write runs in one transaction. Outbox rows are inserted inside a
//! nested transaction (a savepoint) so a failed append leaves the state
//! change intact and surfaces as [`OutboxWrite::Dropped`].

use super::{
    blocking::{AdmissionPgPool, StorageFailure, TxError, run_blocking},
    conversion::{
        row_to_application, row_to_audit, row_to_enrollment, row_to_interview, row_to_outbox,
        to_application_row, to_audit_row, to_enrollment_row, to_interview_row, to_outbox_row,
    },
    models::{ApplicationRow, AuditRow, EnrollmentRow, InterviewRow, OutboxRow},
    schema::{
        application_status_audit, enrollment_applications, enrollments, groups, interviews,
        outbox_events,
    },
};
use crate::admission::{
    domain::{
        AdmissionPolicy, ApplicationId, ApplicationStatus, AuditRecord, Enrollment, EnrollmentApplication,
        EnrollmentOutcome, GroupId, Interview, OutboxEvent, OutboxEventId, UserId,
    },
    ports::{
        ApplicationFilter, ApplicationRepository, ApplicationRepositoryError,
        ApplicationRepositoryResult, InterviewRepository, InterviewRepositoryError,
        InterviewRepositoryResult, OutboxRepository, OutboxRepositoryError,
        OutboxRepositoryResult, OutboxWrite, SeatReservation, StoredInterview, TransitionCommit,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::exists;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::PoolError;
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};
use tokio::task::JoinError;
use uuid::Uuid;

const APPLICATION_PKEY: &str = "enrollment_applications_pkey";
const LIVE_APPLICATION_INDEX: &str = "idx_enrollment_applications_live";
const INTERVIEW_APPLICATION_KEY: &str = "interviews_application_id_key";

/// `PostgreSQL`-backed admission store.
#[derive(Debug, Clone)]
pub struct PostgresAdmissionStore {
    pool: AdmissionPgPool,
}

impl PostgresAdmissionStore {
    /// Creates a new store from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: AdmissionPgPool) -> Self {
        Self { pool }
    }
}

impl StorageFailure for ApplicationRepositoryError {
    fn from_pool(err: PoolError) -> Self {
        Self::persistence(err)
    }

    fn from_join(err: JoinError) -> Self {
        Self::persistence(err)
    }

    fn from_database(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

impl StorageFailure for InterviewRepositoryError {
    fn from_pool(err: PoolError) -> Self {
        Self::persistence(err)
    }

    fn from_join(err: JoinError) -> Self {
        Self::persistence(err)
    }

    fn from_database(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

impl StorageFailure for OutboxRepositoryError {
    fn from_pool(err: PoolError) -> Self {
        Self::persistence(err)
    }

    fn from_join(err: JoinError) -> Self {
        Self::persistence(err)
    }

    fn from_database(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

type ApplicationTxResult<T> = Result<T, TxError<ApplicationRepositoryError>>;
type InterviewTxResult<T> = Result<T, TxError<InterviewRepositoryError>>;

#[async_trait]
impl ApplicationRepository for PostgresAdmissionStore {
    async fn store(
        &self,
        application: &EnrollmentApplication,
        event: &OutboxEvent,
    ) -> ApplicationRepositoryResult<OutboxWrite> {
        let application_id = application.id();
        let applicant_id = application.applicant_id();
        let group_id = application.group_id();
        let row = to_application_row(application);
        let outbox = to_outbox_row(event);

        run_blocking(&self.pool, move |connection| {
            connection
                .transaction::<_, TxError<ApplicationRepositoryError>, _>(|tx| {
                    diesel::insert_into(enrollment_applications::table)
                        .values(&row)
                        .execute(tx)
                        .map_err(|err| {
                            map_application_insert_error(err, application_id, applicant_id, group_id)
                        })?;
                    Ok(append_outbox(tx, &outbox))
                })
                .map_err(TxError::into_port_error)
        })
        .await
    }

    async fn find_by_id(
        &self,
        id: ApplicationId,
    ) -> ApplicationRepositoryResult<Option<EnrollmentApplication>> {
        run_blocking(&self.pool, move |connection| {
            let row = enrollment_applications::table
                .filter(enrollment_applications::id.eq(id.into_inner()))
                .select(ApplicationRow::as_select())
                .first::<ApplicationRow>(connection)
                .optional()
                .map_err(ApplicationRepositoryError::persistence)?;
            row.map(row_to_application)
                .transpose()
                .map_err(ApplicationRepositoryError::persistence)
        })
        .await
    }

    async fn find_latest_for(
        &self,
        applicant_id: UserId,
        group_id: GroupId,
    ) -> ApplicationRepositoryResult<Option<EnrollmentApplication>> {
        run_blocking(&self.pool, move |connection| {
            let row = enrollment_applications::table
                .filter(enrollment_applications::user_id.eq(applicant_id.into_inner()))
                .filter(enrollment_applications::group_id.eq(group_id.into_inner()))
                .order((
                    enrollment_applications::created_at.desc(),
                    enrollment_applications::id.desc(),
                ))
                .select(ApplicationRow::as_select())
                .first::<ApplicationRow>(connection)
                .optional()
                .map_err(ApplicationRepositoryError::persistence)?;
            row.map(row_to_application)
                .transpose()
                .map_err(ApplicationRepositoryError::persistence)
        })
        .await
    }

    async fn has_rejected(
        &self,
        applicant_id: UserId,
        group_id: GroupId,
    ) -> ApplicationRepositoryResult<bool> {
        run_blocking(&self.pool, move |connection| {
            diesel::select(exists(
                enrollment_applications::table
                    .filter(enrollment_applications::user_id.eq(applicant_id.into_inner()))
                    .filter(enrollment_applications::group_id.eq(group_id.into_inner()))
                    .filter(
                        enrollment_applications::status.eq(ApplicationStatus::Rejected.as_str()),
                    ),
            ))
            .get_result::<bool>(connection)
            .map_err(ApplicationRepositoryError::persistence)
        })
        .await
    }

    async fn list_by_applicant(
        &self,
        applicant_id: UserId,
    ) -> ApplicationRepositoryResult<Vec<EnrollmentApplication>> {
        self.list_where(ApplicationQuery::Applicant(applicant_id))
            .await
    }

    async fn list(
        &self,
        filter: ApplicationFilter,
    ) -> ApplicationRepositoryResult<Vec<EnrollmentApplication>> {
        self.list_where(ApplicationQuery::Filter(filter)).await
    }

    async fn commit_transition(
        &self,
        commit: &TransitionCommit,
    ) -> ApplicationRepositoryResult<OutboxWrite> {
        let owned_commit = commit.clone();
        run_blocking(&self.pool, move |connection| {
            connection
                .transaction::<_, TxError<ApplicationRepositoryError>, _>(|tx| {
                    apply_transition(tx, &owned_commit)
                })
                .map_err(TxError::into_port_error)
        })
        .await
    }

    async fn count_enrollments(&self, group_id: GroupId) -> ApplicationRepositoryResult<u64> {
        run_blocking(&self.pool, move |connection| {
            let taken = enrollments::table
                .filter(enrollments::group_id.eq(group_id.into_inner()))
                .count()
                .get_result::<i64>(connection)
                .map_err(ApplicationRepositoryError::persistence)?;
            u64::try_from(taken).map_err(ApplicationRepositoryError::persistence)
        })
        .await
    }

    async fn ensure_enrollment(
        &self,
        enrollment: &Enrollment,
    ) -> ApplicationRepositoryResult<EnrollmentOutcome> {
        let row = to_enrollment_row(enrollment);
        run_blocking(&self.pool, move |connection| {
            let inserted = insert_enrollment(connection, &row)
                .map_err(ApplicationRepositoryError::persistence)?;
            Ok(if inserted {
                EnrollmentOutcome::Created
            } else {
                EnrollmentOutcome::AlreadyEnrolled
            })
        })
        .await
    }

    async fn has_enrollment(
        &self,
        user_id: UserId,
        group_id: GroupId,
    ) -> ApplicationRepositoryResult<bool> {
        run_blocking(&self.pool, move |connection| {
            enrollment_exists(connection, user_id.into_inner(), group_id.into_inner())
                .map_err(ApplicationRepositoryError::persistence)
        })
        .await
    }

    async fn list_enrollments(
        &self,
        group_id: GroupId,
    ) -> ApplicationRepositoryResult<Vec<Enrollment>> {
        run_blocking(&self.pool, move |connection| {
            let rows = enrollments::table
                .filter(enrollments::group_id.eq(group_id.into_inner()))
                .order((enrollments::created_at.asc(), enrollments::id.asc()))
                .select(EnrollmentRow::as_select())
                .load::<EnrollmentRow>(connection)
                .map_err(ApplicationRepositoryError::persistence)?;
            Ok(rows.iter().map(row_to_enrollment).collect())
        })
        .await
    }

    async fn audit_trail(
        &self,
        application_id: ApplicationId,
    ) -> ApplicationRepositoryResult<Vec<AuditRecord>> {
        run_blocking(&self.pool, move |connection| {
            let rows = application_status_audit::table
                .filter(application_status_audit::application_id.eq(application_id.into_inner()))
                .order((
                    application_status_audit::created_at.asc(),
                    application_status_audit::id.asc(),
                ))
                .select(AuditRow::as_select())
                .load::<AuditRow>(connection)
                .map_err(ApplicationRepositoryError::persistence)?;
            rows.into_iter()
                .map(row_to_audit)
                .collect::<Result<Vec<_>, _>>()
                .map_err(ApplicationRepositoryError::persistence)
        })
        .await
    }
}

#[derive(Debug, Clone, Copy)]
enum ApplicationQuery {
    Applicant(UserId),
    Filter(ApplicationFilter),
}

impl PostgresAdmissionStore {
    async fn list_where(
        &self,
        query: ApplicationQuery,
    ) -> ApplicationRepositoryResult<Vec<EnrollmentApplication>> {
        run_blocking(&self.pool, move |connection| {
            let mut statement = enrollment_applications::table
                .select(ApplicationRow::as_select())
                .order((
                    enrollment_applications::created_at.desc(),
                    enrollment_applications::id.desc(),
                ))
                .into_boxed();
            match query {
                ApplicationQuery::Applicant(applicant_id) => {
                    statement = statement
                        .filter(enrollment_applications::user_id.eq(applicant_id.into_inner()));
                }
                ApplicationQuery::Filter(filter) => {
                    if let Some(group_id) = filter.group_id {
                        statement = statement
                            .filter(enrollment_applications::group_id.eq(group_id.into_inner()));
                    }
                    if let Some(status) = filter.status {
                        statement =
                            statement.filter(enrollment_applications::status.eq(status.as_str()));
                    }
                }
            }
            let rows = statement
                .load::<ApplicationRow>(connection)
                .map_err(ApplicationRepositoryError::persistence)?;
            rows.into_iter()
                .map(row_to_application)
                .collect::<Result<Vec<_>, _>>()
                .map_err(ApplicationRepositoryError::persistence)
        })
        .await
    }
}

fn apply_transition(
    tx: &mut PgConnection,
    commit: &TransitionCommit,
) -> ApplicationTxResult<OutboxWrite> {
    let application_id = commit.application.id();
    let expected = commit.expected_status;
    let locked = enrollment_applications::table
        .filter(enrollment_applications::id.eq(application_id.into_inner()))
        .select(enrollment_applications::status)
        .for_update()
        .first::<String>(tx)
        .optional()?;
    let Some(stored_status) = locked else {
        return Err(TxError::Rejected(ApplicationRepositoryError::NotFound(
            application_id,
        )));
    };
    let actual = ApplicationStatus::try_from(stored_status.as_str())
        .map_err(|err| TxError::Rejected(ApplicationRepositoryError::persistence(err)))?;
    if actual != expected {
        return Err(TxError::Rejected(ApplicationRepositoryError::StatusConflict {
            application_id,
            expected,
            actual,
        }));
    }

    if let Some(reservation) = &commit.admission {
        recheck_interview(tx, application_id, reservation.requires_interview)?;
        reserve_seat(tx, reservation)?;
    }

    diesel::update(
        enrollment_applications::table
            .filter(enrollment_applications::id.eq(application_id.into_inner()))
            .filter(enrollment_applications::status.eq(expected.as_str())),
    )
    .set((
        enrollment_applications::status.eq(commit.application.status().as_str()),
        enrollment_applications::updated_at.eq(commit.application.updated_at()),
    ))
    .execute(tx)?;

    diesel::insert_into(application_status_audit::table)
        .values(&to_audit_row(&commit.audit))
        .execute(tx)?;

    Ok(append_outbox(tx, &to_outbox_row(&commit.event)))
}

/// Re-reads the live interview under a share lock.
///
/// An interview upsert takes the row exclusively, so a verdict recorded
/// after the service's check either lands first and is seen here or waits
/// for this approval to commit.
fn recheck_interview(
    tx: &mut PgConnection,
    application_id: ApplicationId,
    requires_interview: bool,
) -> ApplicationTxResult<()> {
    let row = interviews::table
        .filter(interviews::application_id.eq(application_id.into_inner()))
        .select(InterviewRow::as_select())
        .for_share()
        .first::<InterviewRow>(tx)
        .optional()?;
    let interview = row
        .map(row_to_interview)
        .transpose()
        .map_err(|err| TxError::Rejected(ApplicationRepositoryError::persistence(err)))?;
    AdmissionPolicy::ensure_interview(requires_interview, interview.as_ref()).map_err(|refusal| {
        TxError::Rejected(ApplicationRepositoryError::AdmissionRefused(refusal))
    })
}

/// Creates the seat of an approval while holding the group row lock.
///
/// The lock serialises concurrent approvals into the same group, so the
/// count and the insert see a stable seat total.
fn reserve_seat(tx: &mut PgConnection, reservation: &SeatReservation) -> ApplicationTxResult<()> {
    let row = to_enrollment_row(&reservation.enrollment);
    let locked_capacity = groups::table
        .filter(groups::id.eq(row.group_id))
        .select(groups::capacity)
        .for_update()
        .first::<i32>(tx)
        .optional()?;
    let capacity = locked_capacity
        .map(u32::try_from)
        .transpose()
        .map_err(|err| TxError::Rejected(ApplicationRepositoryError::persistence(err)))?
        .unwrap_or(reservation.capacity);

    if enrollment_exists(tx, row.user_id, row.group_id)? {
        return Ok(());
    }
    let taken = enrollments::table
        .filter(enrollments::group_id.eq(row.group_id))
        .count()
        .get_result::<i64>(tx)?;
    if taken >= i64::from(capacity) {
        return Err(TxError::Rejected(
            ApplicationRepositoryError::NoSeatsAvailable {
                group_id: reservation.enrollment.group_id(),
                capacity,
            },
        ));
    }
    insert_enrollment(tx, &row)?;
    Ok(())
}

fn insert_enrollment(connection: &mut PgConnection, row: &EnrollmentRow) -> QueryResult<bool> {
    let inserted = diesel::insert_into(enrollments::table)
        .values(row)
        .on_conflict((enrollments::user_id, enrollments::group_id))
        .do_nothing()
        .execute(connection)?;
    Ok(inserted > 0)
}

fn enrollment_exists(
    connection: &mut PgConnection,
    user_id: Uuid,
    group_id: Uuid,
) -> QueryResult<bool> {
    diesel::select(exists(
        enrollments::table
            .filter(enrollments::user_id.eq(user_id))
            .filter(enrollments::group_id.eq(group_id)),
    ))
    .get_result::<bool>(connection)
}

fn append_outbox(connection: &mut PgConnection, row: &OutboxRow) -> OutboxWrite {
    connection
        .transaction::<_, DieselError, _>(|savepoint| {
            diesel::insert_into(outbox_events::table)
                .values(row)
                .execute(savepoint)
        })
        .map_or_else(
            |err| OutboxWrite::Dropped {
                reason: err.to_string(),
            },
            |_| OutboxWrite::Recorded,
        )
}

fn map_application_insert_error(
    err: DieselError,
    application_id: ApplicationId,
    applicant_id: UserId,
    group_id: GroupId,
) -> TxError<ApplicationRepositoryError> {
    let DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) = &err else {
        return TxError::Database(err);
    };
    if violates(info.as_ref(), LIVE_APPLICATION_INDEX) {
        return TxError::Rejected(ApplicationRepositoryError::ActiveApplicationExists {
            applicant_id,
            group_id,
        });
    }
    if violates(info.as_ref(), APPLICATION_PKEY) {
        return TxError::Rejected(ApplicationRepositoryError::DuplicateApplication(
            application_id,
        ));
    }
    TxError::Database(err)
}

fn violates(info: &dyn DatabaseErrorInformation, constraint: &str) -> bool {
    info.constraint_name().is_some_and(|name| name == constraint)
}

#[async_trait]
impl InterviewRepository for PostgresAdmissionStore {
    async fn find_by_application(
        &self,
        application_id: ApplicationId,
    ) -> InterviewRepositoryResult<Option<Interview>> {
        run_blocking(&self.pool, move |connection| {
            let row = interviews::table
                .filter(interviews::application_id.eq(application_id.into_inner()))
                .select(InterviewRow::as_select())
                .first::<InterviewRow>(connection)
                .optional()
                .map_err(InterviewRepositoryError::persistence)?;
            row.map(row_to_interview)
                .transpose()
                .map_err(InterviewRepositoryError::persistence)
        })
        .await
    }

    async fn upsert(
        &self,
        candidate: &Interview,
        event: &OutboxEvent,
    ) -> InterviewRepositoryResult<StoredInterview> {
        let owned_candidate = candidate.clone();
        let outbox = to_outbox_row(event);

        run_blocking(&self.pool, move |connection| {
            connection
                .transaction::<_, TxError<InterviewRepositoryError>, _>(|tx| {
                    let interview = write_interview(tx, &owned_candidate)?;
                    Ok(StoredInterview {
                        interview,
                        outbox: append_outbox(tx, &outbox),
                    })
                })
                .map_err(TxError::into_port_error)
        })
        .await
    }
}

/// Inserts `candidate`, or replaces the locked existing row with its outcome.
fn write_interview(tx: &mut PgConnection, candidate: &Interview) -> InterviewTxResult<Interview> {
    let application_id = candidate.application_id();
    let locked = interviews::table
        .filter(interviews::application_id.eq(application_id.into_inner()))
        .select(InterviewRow::as_select())
        .for_update()
        .first::<InterviewRow>(tx)
        .optional()?;
    let Some(existing_row) = locked else {
        diesel::insert_into(interviews::table)
            .values(&to_interview_row(candidate))
            .execute(tx)
            .map_err(|err| map_interview_insert_error(err, application_id))?;
        return Ok(candidate.clone());
    };

    let existing = row_to_interview(existing_row)
        .map_err(|err| TxError::Rejected(InterviewRepositoryError::persistence(err)))?;
    let replaced = existing.replaced_by(candidate);
    let row = to_interview_row(&replaced);
    diesel::update(interviews::table.filter(interviews::id.eq(row.id)))
        .set((
            interviews::group_id.eq(row.group_id),
            interviews::candidate_id.eq(row.candidate_id),
            interviews::interviewer_id.eq(row.interviewer_id),
            interviews::interviewer_role.eq(&row.interviewer_role),
            interviews::result.eq(&row.result),
            interviews::comment.eq(&row.comment),
            interviews::updated_at.eq(row.updated_at),
        ))
        .execute(tx)?;
    Ok(replaced)
}

fn map_interview_insert_error(
    err: DieselError,
    application_id: ApplicationId,
) -> TxError<InterviewRepositoryError> {
    match &err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info)
            if violates(info.as_ref(), INTERVIEW_APPLICATION_KEY) =>
        {
            TxError::Rejected(InterviewRepositoryError::AlreadyRecorded(application_id))
        }
        _ => TxError::Database(err),
    }
}

#[async_trait]
impl OutboxRepository for PostgresAdmissionStore {
    async fn pending(&self, limit: usize) -> OutboxRepositoryResult<Vec<OutboxEvent>> {
        let batch = i64::try_from(limit).map_err(OutboxRepositoryError::persistence)?;
        run_blocking(&self.pool, move |connection| {
            let rows = outbox_events::table
                .filter(outbox_events::dispatched_at.is_null())
                .order((outbox_events::created_at.asc(), outbox_events::id.asc()))
                .limit(batch)
                .select(OutboxRow::as_select())
                .load::<OutboxRow>(connection)
                .map_err(OutboxRepositoryError::persistence)?;
            Ok(rows.into_iter().map(row_to_outbox).collect())
        })
        .await
    }

    async fn mark_dispatched(
        &self,
        ids: &[OutboxEventId],
        at: DateTime<Utc>,
    ) -> OutboxRepositoryResult<usize> {
        let raw_ids: Vec<Uuid> = ids.iter().copied().map(OutboxEventId::into_inner).collect();
        run_blocking(&self.pool, move |connection| {
            diesel::update(
                outbox_events::table
                    .filter(outbox_events::id.eq_any(raw_ids))
                    .filter(outbox_events::dispatched_at.is_null()),
            )
            .set(outbox_events::dispatched_at.eq(Some(at)))
            .execute(connection)
            .map_err(OutboxRepositoryError::persistence)
        })
        .await
    }
}
