//! Admission decision beyond state-machine legality.

use super::{AdmissionError, GroupProfile, Interview};

/// Pure admission checks evaluated before an application is approved.
///
/// The counted enrolments are a point-in-time read; stores re-check the seat
/// count under a group lock when the approval is committed.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdmissionPolicy;

impl AdmissionPolicy {
    /// Decides whether an application may be admitted into `group`.
    ///
    /// Checks run in order: interview presence (when required), interview
    /// verdict (whenever one exists), then free capacity.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionError::InterviewRequired`],
    /// [`AdmissionError::InterviewNotPassed`] or
    /// [`AdmissionError::NoSeatsAvailable`].
    pub fn can_admit(
        group: &GroupProfile,
        interview: Option<&Interview>,
        enrolled: u64,
    ) -> Result<(), AdmissionError> {
        Self::ensure_interview(group.requires_interview, interview)?;
        Self::ensure_seat(group, enrolled)
    }

    /// Checks only the interview rules.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionError::InterviewRequired`] when an interview is
    /// required and missing, and [`AdmissionError::InterviewNotPassed`] when
    /// a recorded interview does not recommend the candidate.
    pub const fn ensure_interview(
        requires_interview: bool,
        interview: Option<&Interview>,
    ) -> Result<(), AdmissionError> {
        match interview {
            None if requires_interview => Err(AdmissionError::InterviewRequired),
            Some(recorded) if !recorded.result().permits_admission() => {
                Err(AdmissionError::InterviewNotPassed {
                    result: recorded.result(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Checks only the capacity rule.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionError::NoSeatsAvailable`] when `enrolled` has
    /// reached the group capacity.
    pub fn ensure_seat(group: &GroupProfile, enrolled: u64) -> Result<(), AdmissionError> {
        if enrolled >= u64::from(group.capacity) {
            return Err(AdmissionError::NoSeatsAvailable {
                group_id: group.group_id,
                capacity: group.capacity,
            });
        }
        Ok(())
    }
}
