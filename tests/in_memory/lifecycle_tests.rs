//! In-memory integration tests for full application lifecycles.

use super::helpers::{Admission, admission};
use intake::admission::{
    domain::{Actor, ApplicationStatus, Enrollment, EnrollmentOutcome, InterviewResult, UserId},
    ports::ApplicationRepository,
    services::{
        ApplicationLifecycleError, ChangeStatusRequest, CreateApplicationRequest,
        RecordInterviewRequest,
    },
};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn interviewed_candidate_is_admitted(admission: Admission) -> Result<(), eyre::Report> {
    let group = admission.open_group(3)?;
    let gated = group.with_interview_requirement(true);
    admission.catalog.upsert_group(gated)?;
    let application = admission.reviewed_application(&gated).await?;

    admission
        .interviews
        .record(
            &admission.moderator,
            RecordInterviewRequest::new(application.id(), InterviewResult::Recommended),
        )
        .await?;
    let approved = admission
        .lifecycle
        .change_status(
            &admission.moderator,
            ChangeStatusRequest::new(application.id(), ApplicationStatus::Approved),
        )
        .await?;

    eyre::ensure!(approved.status() == ApplicationStatus::Approved);
    let seats = admission
        .lifecycle
        .enrolled_in(&admission.moderator, gated.group_id)
        .await?;
    eyre::ensure!(seats.len() == 1, "expected one seat, found {}", seats.len());
    eyre::ensure!(
        seats
            .first()
            .is_some_and(|seat| seat.user_id() == application.applicant_id())
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rejected_application_leaves_no_seat(admission: Admission) -> Result<(), eyre::Report> {
    let group = admission.open_group(1)?;
    let application = admission.reviewed_application(&group).await?;

    admission
        .lifecycle
        .change_status(
            &admission.moderator,
            ChangeStatusRequest::new(application.id(), ApplicationStatus::Rejected)
                .with_reason("missing prerequisites"),
        )
        .await?;

    let seats = admission.store.count_enrollments(group.group_id).await?;
    eyre::ensure!(seats == 0);
    let trail = admission
        .lifecycle
        .audit_trail(&admission.moderator, application.id())
        .await?;
    eyre::ensure!(trail.len() == 2);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reapplication_after_rejection_is_blocked_even_after_cancelling_elsewhere(
    admission: Admission,
) -> Result<(), eyre::Report> {
    let group = admission.open_group(2)?;
    let candidate = Actor::candidate(UserId::new());
    let first = admission
        .lifecycle
        .create(&candidate, CreateApplicationRequest::new(group.group_id))
        .await?;
    admission
        .lifecycle
        .change_status(
            &admission.moderator,
            ChangeStatusRequest::new(first.id(), ApplicationStatus::InReview),
        )
        .await?;
    admission
        .lifecycle
        .change_status(
            &admission.moderator,
            ChangeStatusRequest::new(first.id(), ApplicationStatus::Rejected),
        )
        .await?;

    let result = admission
        .lifecycle
        .create(&candidate, CreateApplicationRequest::new(group.group_id))
        .await;
    eyre::ensure!(
        matches!(result, Err(ApplicationLifecycleError::ReapplicationBlocked(_))),
        "expected reapplication to be blocked, got {result:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn approved_applicant_keeps_a_single_seat(admission: Admission) -> Result<(), eyre::Report> {
    let group = admission.open_group(5)?;
    let application = admission.reviewed_application(&group).await?;
    let applicant = application.applicant_id();
    admission
        .lifecycle
        .change_status(
            &admission.moderator,
            ChangeStatusRequest::new(application.id(), ApplicationStatus::Approved),
        )
        .await?;

    let again = admission
        .lifecycle
        .change_status(
            &admission.moderator,
            ChangeStatusRequest::new(application.id(), ApplicationStatus::Approved),
        )
        .await;
    eyre::ensure!(
        again.as_ref().err().map(ApplicationLifecycleError::code) == Some("final_status")
    );

    let seats = admission
        .lifecycle
        .enrolled_in(&admission.moderator, group.group_id)
        .await?;
    eyre::ensure!(
        seats
            .iter()
            .filter(|seat| seat.user_id() == applicant)
            .count()
            == 1
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn enrolment_side_effect_is_idempotent(admission: Admission) -> Result<(), eyre::Report> {
    let group = admission.open_group(4)?;
    let user = UserId::new();
    let clock = mockable::DefaultClock;

    let first = admission
        .store
        .ensure_enrollment(&Enrollment::admit(user, group.group_id, &clock))
        .await?;
    let second = admission
        .store
        .ensure_enrollment(&Enrollment::admit(user, group.group_id, &clock))
        .await?;

    eyre::ensure!(first == EnrollmentOutcome::Created);
    eyre::ensure!(second == EnrollmentOutcome::AlreadyEnrolled);
    eyre::ensure!(admission.store.count_enrollments(group.group_id).await? == 1);
    eyre::ensure!(admission.store.has_enrollment(user, group.group_id).await?);
    Ok(())
}
