//! Diesel schema for ticket lifecycle persistence.

diesel::table! {
    /// User directory records read by recipient resolution.
    users (id) {
        /// Internal user identifier.
        id -> Uuid,
        /// Display name used in notification copy.
        #[max_length = 255]
        display_name -> Varchar,
        /// Optional email address.
        #[max_length = 255]
        email -> Nullable<Varchar>,
        /// User role.
        #[max_length = 50]
        role -> Varchar,
        /// Optional branch binding; null for global users.
        branch_id -> Nullable<Uuid>,
        /// Whether the account is active.
        active -> Bool,
    }
}

diesel::table! {
    /// Branch reference records.
    branches (id) {
        /// Internal branch identifier.
        id -> Uuid,
        /// Branch name.
        #[max_length = 255]
        name -> Varchar,
        /// City the branch operates in.
        #[max_length = 255]
        city -> Varchar,
        /// Whether tickets in this branch require attachment gating.
        requires_attachments -> Bool,
    }
}

diesel::table! {
    /// Ticket records.
    tickets (id) {
        /// Internal ticket identifier.
        id -> Uuid,
        /// Business date of the reported event.
        occurred_on -> Date,
        /// Optional business time of the reported event.
        occurred_at -> Nullable<Time>,
        /// Owning branch.
        branch_id -> Uuid,
        /// Creating operator.
        created_by -> Uuid,
        /// Lifecycle state.
        #[max_length = 50]
        state -> Varchar,
        /// Subject line.
        #[max_length = 255]
        subject -> Varchar,
        /// Optional free-text description.
        description -> Nullable<Text>,
        /// Optional append-only remarks log.
        remarks -> Nullable<Text>,
        /// Closure timestamp; set exactly when the state is `closed`.
        closed_at -> Nullable<Timestamptz>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Immutable ticket state-transition history.
    ticket_transitions (id) {
        /// Internal entry identifier.
        id -> Uuid,
        /// Owning ticket.
        ticket_id -> Uuid,
        /// State before the change; null for the synthetic first entry.
        #[max_length = 50]
        previous_state -> Nullable<Varchar>,
        /// State after the change.
        #[max_length = 50]
        next_state -> Varchar,
        /// User who caused the change.
        actor -> Uuid,
        /// Optional free-text comment.
        comment -> Nullable<Text>,
        /// Commit-time timestamp.
        recorded_at -> Timestamptz,
    }
}

diesel::table! {
    /// Attachment records bound to tickets.
    ticket_attachments (id) {
        /// Internal attachment identifier.
        id -> Uuid,
        /// Owning ticket.
        ticket_id -> Uuid,
        /// Attachment classification.
        #[max_length = 50]
        kind -> Varchar,
        /// Filename as originally submitted.
        #[max_length = 255]
        original_name -> Varchar,
        /// Stable locator issued by the file store.
        #[max_length = 512]
        locator -> Varchar,
        /// MIME content type.
        #[max_length = 255]
        content_type -> Varchar,
        /// Size of the stored blob in bytes.
        byte_size -> Int8,
        /// Whether this is the ticket's primary attachment.
        is_primary -> Bool,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Notification rows for both channels.
    notifications (id) {
        /// Internal notification identifier.
        id -> Uuid,
        /// Optional ticket reference.
        ticket_id -> Nullable<Uuid>,
        /// Optional origin user.
        origin -> Nullable<Uuid>,
        /// Destination user.
        recipient -> Uuid,
        /// Delivery channel.
        #[max_length = 50]
        channel -> Varchar,
        /// Rendered subject line.
        #[max_length = 255]
        subject -> Varchar,
        /// Rendered body.
        body -> Text,
        /// Delivery state.
        #[max_length = 50]
        delivery -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Delivery-outcome timestamp, if any.
        sent_at -> Nullable<Timestamptz>,
        /// Read timestamp, if any (internal channel only).
        read_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Append-only audit log.
    audit_log (id) {
        /// Monotonic entry identifier.
        id -> Int8,
        /// Acting user.
        actor -> Uuid,
        /// Recorded action.
        #[max_length = 100]
        action -> Varchar,
        /// Ticket the action applied to.
        ticket_id -> Uuid,
        /// Action-specific detail payload.
        detail -> Jsonb,
        /// Commit-time timestamp of the audited operation.
        recorded_at -> Timestamptz,
    }
}

diesel::joinable!(ticket_transitions -> tickets (ticket_id));
diesel::joinable!(ticket_attachments -> tickets (ticket_id));
diesel::joinable!(tickets -> branches (branch_id));

diesel::allow_tables_to_appear_in_same_query!(
    audit_log,
    branches,
    notifications,
    ticket_attachments,
    ticket_transitions,
    tickets,
    users,
);
