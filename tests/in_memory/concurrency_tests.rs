//! Concurrency tests for racing transitions against the in-memory store.

use super::helpers::{Admission, admission};
use intake::admission::{
    domain::{AdmissionError, ApplicationStatus},
    services::{ApplicationLifecycleError, ChangeStatusRequest},
};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn last_seat_goes_to_exactly_one_of_two_racing_approvals(
    admission: Admission,
) -> Result<(), eyre::Report> {
    let group = admission.open_group(1)?;
    let first = admission.reviewed_application(&group).await?;
    let second = admission.reviewed_application(&group).await?;

    let approve = |application_id| {
        let lifecycle = admission.lifecycle.clone();
        let moderator = admission.moderator;
        tokio::spawn(async move {
            lifecycle
                .change_status(
                    &moderator,
                    ChangeStatusRequest::new(application_id, ApplicationStatus::Approved),
                )
                .await
        })
    };
    let first_handle = approve(first.id());
    let second_handle = approve(second.id());
    let outcomes = [first_handle.await?, second_handle.await?];

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
    eyre::ensure!(approved == 1, "expected one approval, got {outcomes:?}");
    eyre::ensure!(refused == 1, "expected one refusal, got {outcomes:?}");

    let seats = admission
        .lifecycle
        .enrolled_in(&admission.moderator, group.group_id)
        .await?;
    eyre::ensure!(seats.len() == 1);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_decisions_apply_exactly_once(admission: Admission) -> Result<(), eyre::Report> {
    let group = admission.open_group(3)?;
    let application = admission.reviewed_application(&group).await?;

    let decide = |to| {
        let lifecycle = admission.lifecycle.clone();
        let moderator = admission.moderator;
        let application_id = application.id();
        tokio::spawn(async move {
            lifecycle
                .change_status(&moderator, ChangeStatusRequest::new(application_id, to))
                .await
        })
    };
    let approve = decide(ApplicationStatus::Approved);
    let reject = decide(ApplicationStatus::Rejected);
    let outcomes = [approve.await?, reject.await?];

    let succeeded = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
    eyre::ensure!(succeeded == 1, "expected one decision, got {outcomes:?}");
    let trail = admission
        .lifecycle
        .audit_trail(&admission.moderator, application.id())
        .await?;
    eyre::ensure!(trail.len() == 2, "expected review and one decision");

    let [approve_outcome, _] = &outcomes;
    let expected_seats = usize::from(approve_outcome.is_ok());
    let seats = admission
        .lifecycle
        .enrolled_in(&admission.moderator, group.group_id)
        .await?;
    eyre::ensure!(
        seats.len() == expected_seats,
        "approval won: {}, seats: {}",
        approve_outcome.is_ok(),
        seats.len()
    );
    let stored = admission
        .lifecycle
        .find(&admission.moderator, application.id())
        .await?;
    let expected_status = if approve_outcome.is_ok() {
        ApplicationStatus::Approved
    } else {
        ApplicationStatus::Rejected
    };
    eyre::ensure!(stored.status() == expected_status);
    Ok(())
}
