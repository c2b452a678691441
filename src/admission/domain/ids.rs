//! Identifier types for the admission domain.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the wrapped UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl AsRef<Uuid> for $name {
            fn as_ref(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_identifier!(
    /// Unique identifier for an enrolment application.
    ApplicationId
);

uuid_identifier!(
    /// Identity of a person resolved by the identity provider.
    UserId
);

uuid_identifier!(
    /// Identifier of a capacity-limited study group.
    GroupId
);

uuid_identifier!(
    /// Identifier of the educational program a group belongs to.
    ProgramId
);

uuid_identifier!(
    /// Identifier of a recorded interview.
    InterviewId
);

uuid_identifier!(
    /// Identifier of a group enrolment (seat).
    EnrollmentId
);

uuid_identifier!(
    /// Identifier of an append-only status audit record.
    AuditRecordId
);

uuid_identifier!(
    /// Identifier of an outbox event.
    OutboxEventId
);
