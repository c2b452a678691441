//! Read-only view of catalog data that gates admission.

use super::{GroupId, ProgramId};
use serde::{Deserialize, Serialize};

/// Snapshot of the catalog facts the engine needs about one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupProfile {
    /// Group identifier.
    pub group_id: GroupId,
    /// Program the group belongs to.
    pub program_id: ProgramId,
    /// Whether the owning program is published.
    pub program_published: bool,
    /// Whether the group accepts new applications.
    pub is_open: bool,
    /// Whether approval requires a recorded interview.
    pub requires_interview: bool,
    /// Maximum number of enrolments.
    pub capacity: u32,
}

impl GroupProfile {
    /// Creates a published, open group without an interview requirement.
    #[must_use]
    pub const fn open(group_id: GroupId, program_id: ProgramId, capacity: u32) -> Self {
        Self {
            group_id,
            program_id,
            program_published: true,
            is_open: true,
            requires_interview: false,
            capacity,
        }
    }

    /// Sets whether approval requires an interview.
    #[must_use]
    pub const fn with_interview_requirement(mut self, requires_interview: bool) -> Self {
        self.requires_interview = requires_interview;
        self
    }

    /// Sets whether the owning program is published.
    #[must_use]
    pub const fn with_program_published(mut self, program_published: bool) -> Self {
        self.program_published = program_published;
        self
    }

    /// Sets whether the group accepts applications.
    #[must_use]
    pub const fn with_open(mut self, is_open: bool) -> Self {
        self.is_open = is_open;
        self
    }
}
