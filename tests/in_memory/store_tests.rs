//! Store-level tests for commit-time admission checks and interview upserts.

use super::helpers::{Admission, admission, approval_commit, moderator_interview};
use intake::admission::{
    domain::{AdmissionError, AdmissionEvent, ApplicationStatus, InterviewResult},
    ports::{ApplicationRepository, ApplicationRepositoryError, InterviewRepository},
};
use mockable::DefaultClock;
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn approval_commit_reads_the_verdict_recorded_after_the_service_check(
    admission: Admission,
) -> Result<(), eyre::Report> {
    let group = admission.open_group(3)?;
    let application = admission.reviewed_application(&group).await?;
    let commit = approval_commit(&application, &admission.moderator, false)?;

    let verdict = moderator_interview(
        &application,
        &admission.moderator,
        InterviewResult::NotRecommended,
    );
    let event = AdmissionEvent::interview_recorded(&verdict).into_outbox(&DefaultClock);
    admission.store.upsert(&verdict, &event).await?;

    let outcome = admission.store.commit_transition(&commit).await;
    eyre::ensure!(
        matches!(
            outcome,
            Err(ApplicationRepositoryError::AdmissionRefused(
                AdmissionError::InterviewNotPassed {
                    result: InterviewResult::NotRecommended
                }
            ))
        ),
        "expected refusal, got {outcome:?}"
    );

    let stored = admission.store.find_by_id(application.id()).await?;
    eyre::ensure!(stored.map(|found| found.status()) == Some(ApplicationStatus::InReview));
    eyre::ensure!(admission.store.count_enrollments(group.group_id).await? == 0);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn approval_commit_requires_an_interview_when_the_group_does(
    admission: Admission,
) -> Result<(), eyre::Report> {
    let group = admission.open_group(3)?;
    let application = admission.reviewed_application(&group).await?;
    let commit = approval_commit(&application, &admission.moderator, true)?;

    let outcome = admission.store.commit_transition(&commit).await;
    eyre::ensure!(
        matches!(
            outcome,
            Err(ApplicationRepositoryError::AdmissionRefused(
                AdmissionError::InterviewRequired
            ))
        ),
        "expected refusal, got {outcome:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn interview_upsert_replaces_in_place(admission: Admission) -> Result<(), eyre::Report> {
    let group = admission.open_group(3)?;
    let application = admission.reviewed_application(&group).await?;

    let first = moderator_interview(&application, &admission.moderator, InterviewResult::NeedsMore);
    let first_event = AdmissionEvent::interview_recorded(&first).into_outbox(&DefaultClock);
    let stored_first = admission.store.upsert(&first, &first_event).await?;
    eyre::ensure!(stored_first.interview == first);

    let second = moderator_interview(
        &application,
        &admission.moderator,
        InterviewResult::Recommended,
    );
    let second_event = AdmissionEvent::interview_recorded(&second).into_outbox(&DefaultClock);
    let stored_second = admission.store.upsert(&second, &second_event).await?;

    eyre::ensure!(stored_second.interview.id() == first.id());
    eyre::ensure!(stored_second.interview.created_at() == first.created_at());
    eyre::ensure!(stored_second.interview.result() == InterviewResult::Recommended);
    let live = admission.store.find_by_application(application.id()).await?;
    eyre::ensure!(live == Some(stored_second.interview));
    Ok(())
}
