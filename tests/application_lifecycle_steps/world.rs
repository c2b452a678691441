//! Shared world state for application lifecycle BDD scenarios.

use std::sync::Arc;

use intake::admission::{
    adapters::memory::{InMemoryAdmissionStore, InMemoryGroupCatalog},
    domain::{Actor, EnrollmentApplication, GroupProfile, UserId},
    services::{ApplicationLifecycleError, ApplicationLifecycleService, InterviewService},
};
use mockable::DefaultClock;
use rstest::fixture;

/// Lifecycle service type used by the BDD world.
pub type TestLifecycle = ApplicationLifecycleService<
    InMemoryAdmissionStore,
    InMemoryAdmissionStore,
    InMemoryGroupCatalog,
    DefaultClock,
>;

/// Interview service type used by the BDD world.
pub type TestInterviews = InterviewService<
    InMemoryAdmissionStore,
    InMemoryAdmissionStore,
    InMemoryGroupCatalog,
    DefaultClock,
>;

/// Scenario world for application lifecycle behaviour tests.
pub struct LifecycleWorld {
    pub lifecycle: TestLifecycle,
    pub interviews: TestInterviews,
    pub store: Arc<InMemoryAdmissionStore>,
    pub catalog: Arc<InMemoryGroupCatalog>,
    pub candidate: Actor,
    pub moderator: Actor,
    pub group: Option<GroupProfile>,
    pub application: Option<EnrollmentApplication>,
    pub last_error: Option<ApplicationLifecycleError>,
}

impl LifecycleWorld {
    /// Creates a world with empty scenario state.
    #[must_use]
    pub fn new() -> Self {
        let store = Arc::new(InMemoryAdmissionStore::new());
        let catalog = Arc::new(InMemoryGroupCatalog::new());
        let clock = Arc::new(DefaultClock);

        Self {
            lifecycle: ApplicationLifecycleService::new(
                Arc::clone(&store),
                Arc::clone(&store),
                Arc::clone(&catalog),
                Arc::clone(&clock),
            ),
            interviews: InterviewService::new(
                Arc::clone(&store),
                Arc::clone(&store),
                Arc::clone(&catalog),
                clock,
            ),
            store,
            catalog,
            candidate: Actor::candidate(UserId::new()),
            moderator: Actor::moderator(UserId::new()),
            group: None,
            application: None,
            last_error: None,
        }
    }

    /// Returns the scenario's group.
    ///
    /// # Errors
    ///
    /// Returns an error when no group was set up.
    pub fn group(&self) -> Result<GroupProfile, eyre::Report> {
        self.group
            .ok_or_else(|| eyre::eyre!("missing group in scenario world"))
    }

    /// Returns the scenario's application.
    ///
    /// # Errors
    ///
    /// Returns an error when no application was submitted.
    pub fn application(&self) -> Result<&EnrollmentApplication, eyre::Report> {
        self.application
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing application in scenario world"))
    }
}

impl Default for LifecycleWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> LifecycleWorld {
    LifecycleWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
