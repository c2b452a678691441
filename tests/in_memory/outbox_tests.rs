//! Relay-facing outbox tests against the in-memory store.

use super::helpers::{Admission, admission};
use intake::admission::{
    domain::{APPLICATION_AGGREGATE, OutboxEvent, OutboxEventId},
    ports::OutboxRepository,
};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn pending_events_drain_in_order_and_marking_is_idempotent(
    admission: Admission,
) -> Result<(), eyre::Report> {
    let group = admission.open_group(2)?;
    let application = admission.reviewed_application(&group).await?;

    let pending = admission.store.pending(10).await?;
    let types: Vec<&str> = pending.iter().map(OutboxEvent::event_type).collect();
    eyre::ensure!(
        types == ["application.created", "application.status_changed"],
        "unexpected events {types:?}"
    );
    eyre::ensure!(
        pending
            .iter()
            .all(|event| event.aggregate_type() == APPLICATION_AGGREGATE
                && event.aggregate_id() == application.id().into_inner())
    );

    let first_batch = admission.store.pending(1).await?;
    let ids: Vec<OutboxEventId> = first_batch.iter().map(OutboxEvent::id).collect();
    let now = chrono::Utc::now();
    eyre::ensure!(admission.store.mark_dispatched(&ids, now).await? == 1);
    eyre::ensure!(admission.store.mark_dispatched(&ids, now).await? == 0);

    let remaining = admission.store.pending(10).await?;
    eyre::ensure!(remaining.len() == 1);
    eyre::ensure!(
        remaining
            .first()
            .is_some_and(|event| event.event_type() == "application.status_changed")
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn status_change_payload_is_stable_json(admission: Admission) -> Result<(), eyre::Report> {
    let group = admission.open_group(2)?;
    let application = admission.reviewed_application(&group).await?;

    let pending = admission.store.pending(10).await?;
    let changed = pending
        .iter()
        .find(|event| event.event_type() == "application.status_changed")
        .ok_or_else(|| eyre::eyre!("missing status change event"))?;
    let payload = changed.payload();
    eyre::ensure!(payload["from"] == "submitted");
    eyre::ensure!(payload["to"] == "in_review");
    eyre::ensure!(payload["actor_role"] == "moderator");
    eyre::ensure!(payload["user_id"] == serde_json::json!(application.applicant_id()));
    Ok(())
}
