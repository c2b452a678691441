//! Shared helpers for `PostgreSQL` admission integration tests.

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sql_types::{Bool, Integer, Uuid as SqlUuid};
use intake::admission::{
    adapters::postgres::{PostgresAdmissionStore, PostgresGroupCatalog, build_pool},
    domain::{
        Actor, AdmissionEvent, ApplicationStatus, AuditRecord, Enrollment, EnrollmentApplication,
        GroupId, GroupProfile, Interview, InterviewRecording, InterviewResult, InterviewerRole,
        ProgramId, UserId,
    },
    ports::{SeatReservation, TransitionCommit},
    services::{ApplicationLifecycleService, ChangeStatusRequest, CreateApplicationRequest},
};
use intake::config::PostgresConfig;
use mockable::DefaultClock;
use pg_embedded_setup_unpriv::TestCluster;
use std::sync::Arc;
use tokio::runtime::Runtime;

/// Boxed error used by fixture helpers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// SQL creating the admission schema.
pub const CREATE_ADMISSION_TABLES_SQL: &str =
    include_str!("../../migrations/2026-10-01-000000_create_admission_tables/up.sql");

/// Template database name for the pre-migrated schema.
pub const TEMPLATE_DB: &str = "intake_test_template";

/// Lifecycle service wired to the `PostgreSQL` adapters.
pub type PgLifecycle = ApplicationLifecycleService<
    PostgresAdmissionStore,
    PostgresAdmissionStore,
    PostgresGroupCatalog,
    DefaultClock,
>;

/// Creates a multi-threaded runtime so racing calls use separate connections.
pub fn test_runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .expect("failed to create test runtime")
}

/// Ensures the template database exists with the schema applied.
pub fn ensure_template(cluster: &TestCluster) -> Result<(), BoxError> {
    cluster
        .ensure_template_exists(TEMPLATE_DB, |db_name| {
            let url = cluster.connection().database_url(db_name);
            let mut conn = PgConnection::establish(&url).map_err(|e| eyre::eyre!("{e}"))?;
            conn.batch_execute(CREATE_ADMISSION_TABLES_SQL)
                .map_err(|e| eyre::eyre!("migration failed: {e}"))?;
            Ok(())
        })
        .map_err(|e| Box::new(e) as BoxError)?;
    Ok(())
}

/// Services and adapters sharing one temporary database.
pub struct Admission {
    /// Lifecycle service over the store and catalog.
    pub lifecycle: PgLifecycle,
    /// Store shared with the service.
    pub store: Arc<PostgresAdmissionStore>,
    /// Connection URL of the temporary database.
    pub url: String,
    /// Staff actor driving reviews.
    pub moderator: Actor,
}

/// Creates a test database from the template and wires the adapters to it.
pub fn setup_admission(cluster: &TestCluster, db_name: &str) -> Result<Admission, BoxError> {
    cluster
        .create_database_from_template(db_name, TEMPLATE_DB)
        .map_err(|e| Box::new(e) as BoxError)?;
    let url = cluster.connection().database_url(db_name);
    let pool = build_pool(&PostgresConfig::new(url.clone()).with_max_connections(4))?;
    let store = Arc::new(PostgresAdmissionStore::new(pool.clone()));
    let catalog = Arc::new(PostgresGroupCatalog::new(pool));
    Ok(Admission {
        lifecycle: ApplicationLifecycleService::new(
            Arc::clone(&store),
            Arc::clone(&store),
            catalog,
            Arc::new(DefaultClock),
        ),
        store,
        url,
        moderator: Actor::moderator(UserId::new()),
    })
}

impl Admission {
    /// Inserts a published program with one open group.
    pub fn seed_group(
        &self,
        capacity: u32,
        requires_interview: bool,
    ) -> Result<GroupProfile, BoxError> {
        let profile = GroupProfile::open(GroupId::new(), ProgramId::new(), capacity)
            .with_interview_requirement(requires_interview);
        let mut conn = PgConnection::establish(&self.url)?;
        diesel::sql_query(
            "INSERT INTO programs (id, title, is_published) VALUES ($1, 'Programme', TRUE)",
        )
        .bind::<SqlUuid, _>(profile.program_id.into_inner())
        .execute(&mut conn)?;
        diesel::sql_query(
            "INSERT INTO groups (id, program_id, title, capacity, is_open, requires_interview) \
             VALUES ($1, $2, 'Group', $3, TRUE, $4)",
        )
        .bind::<SqlUuid, _>(profile.group_id.into_inner())
        .bind::<SqlUuid, _>(profile.program_id.into_inner())
        .bind::<Integer, _>(i32::try_from(capacity)?)
        .bind::<Bool, _>(requires_interview)
        .execute(&mut conn)?;
        Ok(profile)
    }

    /// Runs `sql` against the temporary database.
    pub fn execute(&self, sql: &str) -> Result<(), BoxError> {
        let mut conn = PgConnection::establish(&self.url)?;
        conn.batch_execute(sql)?;
        Ok(())
    }

    /// Submits an application from a fresh candidate and moves it to review.
    pub async fn reviewed_application(
        &self,
        group: &GroupProfile,
    ) -> Result<EnrollmentApplication, BoxError> {
        let candidate = Actor::candidate(UserId::new());
        let submitted = self
            .lifecycle
            .create(&candidate, CreateApplicationRequest::new(group.group_id))
            .await?;
        let reviewed = self
            .lifecycle
            .change_status(
                &self.moderator,
                ChangeStatusRequest::new(submitted.id(), ApplicationStatus::InReview),
            )
            .await?;
        Ok(reviewed)
    }

    /// Builds the approval commit the lifecycle service would hand to the store.
    pub fn approval_commit(
        &self,
        application: &EnrollmentApplication,
        requires_interview: bool,
    ) -> Result<TransitionCommit, BoxError> {
        let clock = DefaultClock;
        let actor_id = self.moderator.user_id().ok_or("moderator has no user id")?;
        let role = self.moderator.role();
        let mut approved = application.clone();
        let transition = approved.transition_to(ApplicationStatus::Approved, role, &clock)?;
        let event = AdmissionEvent::StatusChanged {
            application_id: approved.id(),
            user_id: approved.applicant_id(),
            group_id: approved.group_id(),
            actor_id,
            actor_role: role,
            transition,
            reason: String::new(),
        };
        Ok(TransitionCommit {
            expected_status: transition.from,
            audit: AuditRecord::capture(approved.id(), actor_id, role, transition, "", &clock),
            admission: Some(SeatReservation {
                enrollment: Enrollment::admit(approved.applicant_id(), approved.group_id(), &clock),
                capacity: 3,
                requires_interview,
            }),
            event: event.into_outbox(&clock),
            application: approved,
        })
    }

    /// Builds a moderator-recorded interview for `application`.
    pub fn interview(
        &self,
        application: &EnrollmentApplication,
        result: InterviewResult,
    ) -> Interview {
        let recording = InterviewRecording {
            application_id: application.id(),
            group_id: application.group_id(),
            candidate_id: application.applicant_id(),
            interviewer_id: self.moderator.user_id().unwrap_or_else(UserId::new),
            interviewer_role: InterviewerRole::Moderator,
            result,
            comment: String::new(),
        };
        Interview::record(recording, &DefaultClock)
    }
}

/// Cleans up a test database.
fn cleanup_database(cluster: &TestCluster, db_name: &str) {
    if let Err(e) = cluster.drop_database(db_name) {
        eprintln!("Warning: failed to drop test database {db_name}: {e}");
    }
}

/// Guard that ensures test database cleanup runs even if a test panics.
pub struct CleanupGuard<'a> {
    cluster: &'a TestCluster,
    db_name: String,
}

impl<'a> CleanupGuard<'a> {
    /// Drops `db_name` from `cluster` when the guard goes out of scope.
    pub const fn new(cluster: &'a TestCluster, db_name: String) -> Self {
        Self { cluster, db_name }
    }
}

impl Drop for CleanupGuard<'_> {
    fn drop(&mut self) {
        cleanup_database(self.cluster, &self.db_name);
    }
}
