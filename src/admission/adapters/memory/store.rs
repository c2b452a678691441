//! In-memory store backing the application, interview and outbox ports.
//!
//! A single lock guards all tables, so every port call is serialisable.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::admission::{
    domain::{
        AdmissionPolicy, ApplicationId, ApplicationStatus, AuditRecord, Enrollment, EnrollmentApplication,
        EnrollmentOutcome, GroupId, Interview, OutboxEvent, OutboxEventId, UserId,
    },
    ports::{
        ApplicationFilter, ApplicationRepository, ApplicationRepositoryError,
        ApplicationRepositoryResult, InterviewRepository, InterviewRepositoryError,
        InterviewRepositoryResult, OutboxRepository, OutboxRepositoryError,
        OutboxRepositoryResult, OutboxWrite, StoredInterview, TransitionCommit,
    },
};

/// Thread-safe in-memory admission store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAdmissionStore {
    state: Arc<RwLock<AdmissionState>>,
}

#[derive(Debug, Default)]
struct AdmissionState {
    applications: HashMap<ApplicationId, EnrollmentApplication>,
    submission_order: Vec<ApplicationId>,
    enrollments: Vec<Enrollment>,
    audit: Vec<AuditRecord>,
    interviews: HashMap<ApplicationId, Interview>,
    outbox: Vec<OutboxEvent>,
    reject_outbox_writes: bool,
}

impl AdmissionState {
    fn has_enrollment(&self, user_id: UserId, group_id: GroupId) -> bool {
        self.enrollments
            .iter()
            .any(|seat| seat.user_id() == user_id && seat.group_id() == group_id)
    }

    fn count_enrollments(&self, group_id: GroupId) -> u64 {
        let seats = self
            .enrollments
            .iter()
            .filter(|seat| seat.group_id() == group_id)
            .count();
        u64::try_from(seats).unwrap_or(u64::MAX)
    }

    fn newest_first<'a>(
        &'a self,
        predicate: impl Fn(&EnrollmentApplication) -> bool + 'a,
    ) -> impl Iterator<Item = &'a EnrollmentApplication> + 'a {
        self.submission_order
            .iter()
            .rev()
            .filter_map(|id| self.applications.get(id))
            .filter(move |application| predicate(application))
    }

    fn append_event(&mut self, event: &OutboxEvent) -> OutboxWrite {
        if self.reject_outbox_writes {
            return OutboxWrite::Dropped {
                reason: "outbox writes are disabled".to_owned(),
            };
        }
        self.outbox.push(event.clone());
        OutboxWrite::Recorded
    }
}

impl InMemoryAdmissionStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent outbox appends fail (or succeed again).
    ///
    /// Used to exercise the best-effort event semantics.
    ///
    /// # Errors
    ///
    /// Returns [`OutboxRepositoryError::Persistence`] when the lock is
    /// poisoned.
    pub fn reject_outbox_writes(&self, reject: bool) -> OutboxRepositoryResult<()> {
        let mut state = self.write(OutboxRepositoryError::persistence)?;
        state.reject_outbox_writes = reject;
        Ok(())
    }

    /// Returns every outbox event ever appended, in append order.
    ///
    /// # Errors
    ///
    /// Returns [`OutboxRepositoryError::Persistence`] when the lock is
    /// poisoned.
    pub fn outbox_events(&self) -> OutboxRepositoryResult<Vec<OutboxEvent>> {
        let state = self.read(OutboxRepositoryError::persistence)?;
        Ok(state.outbox.clone())
    }

    fn read<E>(
        &self,
        map_err: impl FnOnce(std::io::Error) -> E,
    ) -> Result<RwLockReadGuard<'_, AdmissionState>, E> {
        self.state
            .read()
            .map_err(|err| map_err(std::io::Error::other(err.to_string())))
    }

    fn write<E>(
        &self,
        map_err: impl FnOnce(std::io::Error) -> E,
    ) -> Result<RwLockWriteGuard<'_, AdmissionState>, E> {
        self.state
            .write()
            .map_err(|err| map_err(std::io::Error::other(err.to_string())))
    }
}

const fn is_live(status: ApplicationStatus) -> bool {
    matches!(
        status,
        ApplicationStatus::Submitted | ApplicationStatus::InReview | ApplicationStatus::Approved
    )
}

#[async_trait]
impl ApplicationRepository for InMemoryAdmissionStore {
    async fn store(
        &self,
        application: &EnrollmentApplication,
        event: &OutboxEvent,
    ) -> ApplicationRepositoryResult<OutboxWrite> {
        let mut state = self.write(ApplicationRepositoryError::persistence)?;
        if state.applications.contains_key(&application.id()) {
            return Err(ApplicationRepositoryError::DuplicateApplication(
                application.id(),
            ));
        }

        let applicant_id = application.applicant_id();
        let group_id = application.group_id();
        let has_live = state
            .newest_first(move |existing| {
                existing.applicant_id() == applicant_id && existing.group_id() == group_id
            })
            .any(|existing| is_live(existing.status()));
        if has_live {
            return Err(ApplicationRepositoryError::ActiveApplicationExists {
                applicant_id,
                group_id,
            });
        }

        state
            .applications
            .insert(application.id(), application.clone());
        state.submission_order.push(application.id());
        Ok(state.append_event(event))
    }

    async fn find_by_id(
        &self,
        id: ApplicationId,
    ) -> ApplicationRepositoryResult<Option<EnrollmentApplication>> {
        let state = self.read(ApplicationRepositoryError::persistence)?;
        Ok(state.applications.get(&id).cloned())
    }

    async fn find_latest_for(
        &self,
        applicant_id: UserId,
        group_id: GroupId,
    ) -> ApplicationRepositoryResult<Option<EnrollmentApplication>> {
        let state = self.read(ApplicationRepositoryError::persistence)?;
        let latest = state
            .newest_first(move |existing| {
                existing.applicant_id() == applicant_id && existing.group_id() == group_id
            })
            .next()
            .cloned();
        Ok(latest)
    }

    async fn has_rejected(
        &self,
        applicant_id: UserId,
        group_id: GroupId,
    ) -> ApplicationRepositoryResult<bool> {
        let state = self.read(ApplicationRepositoryError::persistence)?;
        let rejected = state.applications.values().any(|existing| {
            existing.applicant_id() == applicant_id
                && existing.group_id() == group_id
                && existing.status() == ApplicationStatus::Rejected
        });
        Ok(rejected)
    }

    async fn list_by_applicant(
        &self,
        applicant_id: UserId,
    ) -> ApplicationRepositoryResult<Vec<EnrollmentApplication>> {
        let state = self.read(ApplicationRepositoryError::persistence)?;
        Ok(state
            .newest_first(move |existing| existing.applicant_id() == applicant_id)
            .cloned()
            .collect())
    }

    async fn list(
        &self,
        filter: ApplicationFilter,
    ) -> ApplicationRepositoryResult<Vec<EnrollmentApplication>> {
        let state = self.read(ApplicationRepositoryError::persistence)?;
        Ok(state
            .newest_first(move |existing| filter.matches(existing))
            .cloned()
            .collect())
    }

    async fn commit_transition(
        &self,
        commit: &TransitionCommit,
    ) -> ApplicationRepositoryResult<OutboxWrite> {
        let mut state = self.write(ApplicationRepositoryError::persistence)?;
        let application_id = commit.application.id();
        let stored_status = state
            .applications
            .get(&application_id)
            .map(EnrollmentApplication::status)
            .ok_or(ApplicationRepositoryError::NotFound(application_id))?;
        if stored_status != commit.expected_status {
            return Err(ApplicationRepositoryError::StatusConflict {
                application_id,
                expected: commit.expected_status,
                actual: stored_status,
            });
        }

        if let Some(reservation) = &commit.admission {
            AdmissionPolicy::ensure_interview(
                reservation.requires_interview,
                state.interviews.get(&application_id),
            )
            .map_err(ApplicationRepositoryError::AdmissionRefused)?;
            let seat = &reservation.enrollment;
            if !state.has_enrollment(seat.user_id(), seat.group_id()) {
                if state.count_enrollments(seat.group_id()) >= u64::from(reservation.capacity) {
                    return Err(ApplicationRepositoryError::NoSeatsAvailable {
                        group_id: seat.group_id(),
                        capacity: reservation.capacity,
                    });
                }
                state.enrollments.push(seat.clone());
            }
        }

        state
            .applications
            .insert(application_id, commit.application.clone());
        state.audit.push(commit.audit.clone());
        Ok(state.append_event(&commit.event))
    }

    async fn count_enrollments(&self, group_id: GroupId) -> ApplicationRepositoryResult<u64> {
        let state = self.read(ApplicationRepositoryError::persistence)?;
        Ok(state.count_enrollments(group_id))
    }

    async fn ensure_enrollment(
        &self,
        enrollment: &Enrollment,
    ) -> ApplicationRepositoryResult<EnrollmentOutcome> {
        let mut state = self.write(ApplicationRepositoryError::persistence)?;
        if state.has_enrollment(enrollment.user_id(), enrollment.group_id()) {
            return Ok(EnrollmentOutcome::AlreadyEnrolled);
        }
        state.enrollments.push(enrollment.clone());
        Ok(EnrollmentOutcome::Created)
    }

    async fn has_enrollment(
        &self,
        user_id: UserId,
        group_id: GroupId,
    ) -> ApplicationRepositoryResult<bool> {
        let state = self.read(ApplicationRepositoryError::persistence)?;
        Ok(state.has_enrollment(user_id, group_id))
    }

    async fn list_enrollments(
        &self,
        group_id: GroupId,
    ) -> ApplicationRepositoryResult<Vec<Enrollment>> {
        let state = self.read(ApplicationRepositoryError::persistence)?;
        Ok(state
            .enrollments
            .iter()
            .filter(|seat| seat.group_id() == group_id)
            .cloned()
            .collect())
    }

    async fn audit_trail(
        &self,
        application_id: ApplicationId,
    ) -> ApplicationRepositoryResult<Vec<AuditRecord>> {
        let state = self.read(ApplicationRepositoryError::persistence)?;
        Ok(state
            .audit
            .iter()
            .filter(|record| record.application_id == application_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl InterviewRepository for InMemoryAdmissionStore {
    async fn find_by_application(
        &self,
        application_id: ApplicationId,
    ) -> InterviewRepositoryResult<Option<Interview>> {
        let state = self.read(InterviewRepositoryError::persistence)?;
        Ok(state.interviews.get(&application_id).cloned())
    }

    async fn upsert(
        &self,
        candidate: &Interview,
        event: &OutboxEvent,
    ) -> InterviewRepositoryResult<StoredInterview> {
        let mut state = self.write(InterviewRepositoryError::persistence)?;
        let application_id = candidate.application_id();
        let interview = state
            .interviews
            .get(&application_id)
            .map_or_else(|| candidate.clone(), |existing| existing.replaced_by(candidate));
        state.interviews.insert(application_id, interview.clone());
        let outbox = state.append_event(event);
        Ok(StoredInterview { interview, outbox })
    }
}

#[async_trait]
impl OutboxRepository for InMemoryAdmissionStore {
    async fn pending(&self, limit: usize) -> OutboxRepositoryResult<Vec<OutboxEvent>> {
        let state = self.read(OutboxRepositoryError::persistence)?;
        Ok(state
            .outbox
            .iter()
            .filter(|event| event.dispatched_at().is_none())
            .take(limit)
            .cloned()
            .collect())
    }

    async fn mark_dispatched(
        &self,
        ids: &[OutboxEventId],
        at: DateTime<Utc>,
    ) -> OutboxRepositoryResult<usize> {
        let mut state = self.write(OutboxRepositoryError::persistence)?;
        let changed = state
            .outbox
            .iter_mut()
            .filter(|event| ids.contains(&event.id()))
            .map(|event| event.mark_dispatched(at))
            .filter(|changed| *changed)
            .count();
        Ok(changed)
    }
}
