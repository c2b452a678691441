//! Racing transitions against `PostgreSQL` row locks.

use crate::postgres::helpers::{CleanupGuard, ensure_template, setup_admission, test_runtime};
use intake::admission::{
    domain::{AdmissionError, ApplicationStatus},
    ports::ApplicationRepository,
    services::{ApplicationLifecycleError, ChangeStatusRequest},
};
use pg_embedded_setup_unpriv::{TestCluster, test_support::shared_test_cluster};
use rstest::rstest;

#[rstest]
fn last_seat_goes_to_exactly_one_of_two_racing_approvals(
    shared_test_cluster: &'static TestCluster,
) {
    ensure_template(shared_test_cluster).expect("template setup");
    let db_name = format!("test_last_seat_race_{}", uuid::Uuid::new_v4());
    let _guard = CleanupGuard::new(shared_test_cluster, db_name.clone());
    let admission = setup_admission(shared_test_cluster, &db_name).expect("admission setup");
    let group = admission.seed_group(1, false).expect("seed group");

    let rt = test_runtime();
    let first = rt
        .block_on(admission.reviewed_application(&group))
        .expect("first application");
    let second = rt
        .block_on(admission.reviewed_application(&group))
        .expect("second application");

    let approve = |application_id| {
        admission.lifecycle.change_status(
            &admission.moderator,
            ChangeStatusRequest::new(application_id, ApplicationStatus::Approved),
        )
    };
    let (first_outcome, second_outcome) =
        rt.block_on(async { tokio::join!(approve(first.id()), approve(second.id())) });
    let outcomes = [first_outcome, second_outcome];

    let approved = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
    let refused = outcomes
        .iter()
        .filter(|outcome| {
            matches!(
                outcome,
                Err(ApplicationLifecycleError::Admission(
                    AdmissionError::NoSeatsAvailable { .. }
                ))
            )
        })
        .count();
    assert_eq!(approved, 1, "expected one approval, got {outcomes:?}");
    assert_eq!(refused, 1, "expected one refusal, got {outcomes:?}");
    let seats = rt
        .block_on(admission.store.count_enrollments(group.group_id))
        .expect("count");
    assert_eq!(seats, 1);
}

#[rstest]
fn racing_decisions_apply_exactly_once(shared_test_cluster: &'static TestCluster) {
    ensure_template(shared_test_cluster).expect("template setup");
    let db_name = format!("test_decision_race_{}", uuid::Uuid::new_v4());
    let _guard = CleanupGuard::new(shared_test_cluster, db_name.clone());
    let admission = setup_admission(shared_test_cluster, &db_name).expect("admission setup");
    let group = admission.seed_group(3, false).expect("seed group");

    let rt = test_runtime();
    let application = rt
        .block_on(admission.reviewed_application(&group))
        .expect("reviewed application");

    let decide = |to| {
        admission.lifecycle.change_status(
            &admission.moderator,
            ChangeStatusRequest::new(application.id(), to),
        )
    };
    let (approve_outcome, reject_outcome) = rt.block_on(async {
        tokio::join!(
            decide(ApplicationStatus::Approved),
            decide(ApplicationStatus::Rejected)
        )
    });

    assert_ne!(
        approve_outcome.is_ok(),
        reject_outcome.is_ok(),
        "expected exactly one decision, got {approve_outcome:?} and {reject_outcome:?}"
    );
    let loser = if approve_outcome.is_ok() {
        &reject_outcome
    } else {
        &approve_outcome
    };
    assert!(
        matches!(
            loser,
            Err(ApplicationLifecycleError::ConcurrentTransition(_)
                | ApplicationLifecycleError::Transition(_))
        ),
        "Expected the losing decision to conflict, got: {loser:?}"
    );

    let stored = rt
        .block_on(admission.store.find_by_id(application.id()))
        .expect("query ok")
        .expect("application exists");
    let expected_status = if approve_outcome.is_ok() {
        ApplicationStatus::Approved
    } else {
        ApplicationStatus::Rejected
    };
    assert_eq!(stored.status(), expected_status);
    let seats = rt
        .block_on(admission.store.count_enrollments(group.group_id))
        .expect("count");
    assert_eq!(seats, u64::from(approve_outcome.is_ok()));
    let trail = rt
        .block_on(admission.store.audit_trail(application.id()))
        .expect("audit");
    assert_eq!(trail.len(), 2);
}
