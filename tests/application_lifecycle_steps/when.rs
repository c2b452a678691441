//! When steps for application lifecycle BDD scenarios.

use super::world::{LifecycleWorld, run_async};
use eyre::WrapErr;
use intake::admission::{
    domain::{ApplicationStatus, InterviewResult},
    services::{ChangeStatusRequest, RecordInterviewRequest},
};
use rstest_bdd_macros::when;

/// Requests a staff transition and records the outcome in the world.
pub(super) fn move_application(
    world: &mut LifecycleWorld,
    status: &str,
) -> Result<(), eyre::Report> {
    let target = ApplicationStatus::try_from(status)
        .map_err(|err| eyre::eyre!("invalid status in scenario: {err}"))?;
    let application_id = world.application()?.id();

    let result = run_async(world.lifecycle.change_status(
        &world.moderator,
        ChangeStatusRequest::new(application_id, target),
    ));
    match result {
        Ok(updated) => {
            world.application = Some(updated);
            world.last_error = None;
        }
        Err(err) => world.last_error = Some(err),
    }
    Ok(())
}

#[when(r#"staff move the application to "{status}""#)]
fn staff_move_application(world: &mut LifecycleWorld, status: String) -> Result<(), eyre::Report> {
    move_application(world, &status)
}

#[when("the candidate cancels the application")]
fn candidate_cancels(world: &mut LifecycleWorld) -> Result<(), eyre::Report> {
    let application_id = world.application()?.id();
    match run_async(world.lifecycle.cancel(&world.candidate, application_id)) {
        Ok(updated) => {
            world.application = Some(updated);
            world.last_error = None;
        }
        Err(err) => world.last_error = Some(err),
    }
    Ok(())
}

#[when(r#"staff record the interview result "{result}""#)]
fn staff_record_interview(world: &mut LifecycleWorld, result: String) -> Result<(), eyre::Report> {
    let outcome = InterviewResult::try_from(result.as_str())
        .map_err(|err| eyre::eyre!("invalid interview result in scenario: {err}"))?;
    let application_id = world.application()?.id();
    run_async(world.interviews.record(
        &world.moderator,
        RecordInterviewRequest::new(application_id, outcome),
    ))
    .wrap_err("record scenario interview")?;
    Ok(())
}
