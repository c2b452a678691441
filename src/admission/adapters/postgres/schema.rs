//! Diesel schema for admission persistence.

diesel::table! {
    /// Published and draft programmes.
    programs (id) {
        /// Programme identifier.
        id -> Uuid,
        /// Display title.
        #[max_length = 255]
        title -> Varchar,
        /// Whether candidates may see and apply to the programme.
        is_published -> Bool,
    }
}

diesel::table! {
    /// Capacity-limited groups within a programme.
    groups (id) {
        /// Group identifier.
        id -> Uuid,
        /// Owning programme.
        program_id -> Uuid,
        /// Display title.
        #[max_length = 255]
        title -> Varchar,
        /// Maximum number of enrolments.
        capacity -> Int4,
        /// Whether the group accepts applications.
        is_open -> Bool,
        /// Whether approval requires a recorded interview.
        requires_interview -> Bool,
    }
}

diesel::table! {
    /// Teachers assigned to groups.
    group_teachers (group_id, teacher_id) {
        /// Group.
        group_id -> Uuid,
        /// Assigned teacher.
        teacher_id -> Uuid,
    }
}

diesel::table! {
    /// Enrolment applications.
    enrollment_applications (id) {
        /// Application identifier.
        id -> Uuid,
        /// Applicant.
        user_id -> Uuid,
        /// Target group.
        group_id -> Uuid,
        /// Lifecycle status.
        #[max_length = 32]
        status -> Varchar,
        /// Applicant's comment.
        comment -> Text,
        /// Submission timestamp.
        created_at -> Timestamptz,
        /// Latest status change timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Group seats created by approvals.
    enrollments (id) {
        /// Enrolment identifier.
        id -> Uuid,
        /// Enrolled user.
        user_id -> Uuid,
        /// Group.
        group_id -> Uuid,
        /// Admission timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only status change log.
    application_status_audit (id) {
        /// Record identifier.
        id -> Uuid,
        /// Changed application.
        application_id -> Uuid,
        /// Acting user.
        actor_id -> Uuid,
        /// Role of the acting user.
        #[max_length = 32]
        actor_role -> Varchar,
        /// Status before the change.
        #[max_length = 32]
        from_status -> Varchar,
        /// Status after the change.
        #[max_length = 32]
        to_status -> Varchar,
        /// Reason given for the change.
        reason -> Text,
        /// Change timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Live interview outcome per application.
    interviews (id) {
        /// Interview identifier.
        id -> Uuid,
        /// Interviewed application, unique.
        application_id -> Uuid,
        /// Group of the application.
        group_id -> Uuid,
        /// Candidate.
        candidate_id -> Uuid,
        /// Recording staff member.
        interviewer_id -> Uuid,
        /// Capacity of the interviewer.
        #[max_length = 32]
        interviewer_role -> Varchar,
        /// Recorded outcome.
        #[max_length = 32]
        result -> Varchar,
        /// Interviewer notes.
        comment -> Text,
        /// First recording timestamp.
        created_at -> Timestamptz,
        /// Latest recording timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Transactional outbox consumed by the event relay.
    outbox_events (id) {
        /// Event identifier.
        id -> Uuid,
        /// Aggregate kind.
        #[max_length = 64]
        aggregate_type -> Varchar,
        /// Aggregate identifier.
        aggregate_id -> Uuid,
        /// Event type name.
        #[max_length = 64]
        event_type -> Varchar,
        /// JSON payload.
        payload -> Jsonb,
        /// Enqueue timestamp.
        created_at -> Timestamptz,
        /// Delivery acknowledgement timestamp.
        dispatched_at -> Nullable<Timestamptz>,
    }
}

diesel::joinable!(groups -> programs (program_id));
diesel::joinable!(group_teachers -> groups (group_id));

diesel::allow_tables_to_appear_in_same_query!(
    programs,
    groups,
    group_teachers,
    enrollment_applications,
    enrollments,
    application_status_audit,
    interviews,
    outbox_events,
);
