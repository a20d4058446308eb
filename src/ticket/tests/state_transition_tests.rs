//! Unit tests for ticket state machine rules.

use crate::ticket::domain::{
    Subject, Ticket, TicketDraft, TicketState, TicketStateError, UserId,
};
use chrono::{NaiveDate, TimeZone, Utc};
use eyre::{OptionExt, Result, ensure};
use rstest::rstest;

use super::fixtures;

fn sample_ticket(initial_state: TicketState) -> Result<Ticket> {
    let branch = fixtures::branch("Centro", false);
    let draft = TicketDraft {
        occurred_on: NaiveDate::from_ymd_opt(2024, 3, 11).ok_or_eyre("valid date")?,
        occurred_at: None,
        branch_id: branch.id,
        created_by: UserId::new(),
        subject: Subject::new("Broken card reader")?,
        description: None,
    };
    let now = Utc.with_ymd_and_hms(2024, 3, 11, 9, 0, 0)
        .single()
        .ok_or_eyre("valid timestamp")?;
    Ok(Ticket::open(draft, initial_state, now))
}

#[rstest]
#[case(TicketState::Open, TicketState::Open, false)]
#[case(TicketState::Open, TicketState::Pending, true)]
#[case(TicketState::Open, TicketState::PendingAttachments, false)]
#[case(TicketState::Open, TicketState::Authorized, true)]
#[case(TicketState::Open, TicketState::Rejected, true)]
#[case(TicketState::Open, TicketState::Closed, true)]
#[case(TicketState::Pending, TicketState::Open, false)]
#[case(TicketState::Pending, TicketState::Pending, false)]
#[case(TicketState::Pending, TicketState::PendingAttachments, false)]
#[case(TicketState::Pending, TicketState::Authorized, true)]
#[case(TicketState::Pending, TicketState::Rejected, true)]
#[case(TicketState::Pending, TicketState::Closed, true)]
#[case(TicketState::PendingAttachments, TicketState::Open, false)]
#[case(TicketState::PendingAttachments, TicketState::Pending, true)]
#[case(TicketState::PendingAttachments, TicketState::PendingAttachments, false)]
#[case(TicketState::PendingAttachments, TicketState::Authorized, true)]
#[case(TicketState::PendingAttachments, TicketState::Rejected, true)]
#[case(TicketState::PendingAttachments, TicketState::Closed, true)]
#[case(TicketState::Authorized, TicketState::Open, false)]
#[case(TicketState::Authorized, TicketState::Pending, true)]
#[case(TicketState::Authorized, TicketState::PendingAttachments, false)]
#[case(TicketState::Authorized, TicketState::Authorized, false)]
#[case(TicketState::Authorized, TicketState::Rejected, true)]
#[case(TicketState::Authorized, TicketState::Closed, true)]
#[case(TicketState::Rejected, TicketState::Open, false)]
#[case(TicketState::Rejected, TicketState::Pending, true)]
#[case(TicketState::Rejected, TicketState::PendingAttachments, false)]
#[case(TicketState::Rejected, TicketState::Authorized, true)]
#[case(TicketState::Rejected, TicketState::Rejected, false)]
#[case(TicketState::Rejected, TicketState::Closed, true)]
#[case(TicketState::Closed, TicketState::Open, false)]
#[case(TicketState::Closed, TicketState::Pending, false)]
#[case(TicketState::Closed, TicketState::PendingAttachments, false)]
#[case(TicketState::Closed, TicketState::Authorized, false)]
#[case(TicketState::Closed, TicketState::Rejected, false)]
#[case(TicketState::Closed, TicketState::Closed, false)]
fn can_transition_to_returns_expected(
    #[case] from: TicketState,
    #[case] to: TicketState,
    #[case] expected: bool,
) {
    assert_eq!(from.can_transition_to(to), expected);
}

#[rstest]
fn change_state_to_closed_stamps_closed_at() -> Result<()> {
    let mut ticket = sample_ticket(TicketState::Pending)?;
    let closing = Utc.with_ymd_and_hms(2024, 3, 12, 17, 30, 0)
        .single()
        .ok_or_eyre("valid timestamp")?;

    let previous = ticket.change_state(TicketState::Closed, None, closing)?;

    ensure!(previous == TicketState::Pending, "previous state mismatch");
    ensure!(ticket.state() == TicketState::Closed, "state mismatch");
    ensure!(ticket.closed_at() == Some(closing), "closed_at not stamped");
    ensure!(ticket.updated_at() == closing, "updated_at not touched");
    Ok(())
}

#[rstest]
#[case(TicketState::Authorized)]
#[case(TicketState::Rejected)]
#[case(TicketState::Closed)]
fn change_state_records_remark_for_decision_states(#[case] to: TicketState) -> Result<()> {
    let mut ticket = sample_ticket(TicketState::Pending)?;
    let now = Utc::now();

    ticket.change_state(to, Some("  looks complete  "), now)?;

    ensure!(
        ticket.remarks() == Some("looks complete"),
        "remark not trimmed and appended: {:?}",
        ticket.remarks()
    );
    Ok(())
}

#[rstest]
fn remarks_accumulate_with_newline_separator() -> Result<()> {
    let mut ticket = sample_ticket(TicketState::Pending)?;
    let now = Utc::now();

    ticket.change_state(TicketState::Rejected, Some("missing receipt"), now)?;
    ticket.change_state(TicketState::Pending, Some("ignored for pending"), now)?;
    ticket.change_state(TicketState::Authorized, Some("receipt arrived"), now)?;

    ensure!(
        ticket.remarks() == Some("missing receipt\nreceipt arrived"),
        "remarks log mismatch: {:?}",
        ticket.remarks()
    );
    Ok(())
}

#[rstest]
fn blank_comment_is_not_appended() -> Result<()> {
    let mut ticket = sample_ticket(TicketState::Pending)?;

    ticket.change_state(TicketState::Authorized, Some("   "), Utc::now())?;

    ensure!(ticket.remarks().is_none(), "blank comment must be dropped");
    Ok(())
}

#[rstest]
fn change_state_on_closed_ticket_is_rejected() -> Result<()> {
    let mut ticket = sample_ticket(TicketState::Closed)?;

    let result = ticket.change_state(TicketState::Pending, None, Utc::now());

    ensure!(
        matches!(result, Err(TicketStateError::TicketClosed { .. })),
        "expected TicketClosed, got {result:?}"
    );
    Ok(())
}

#[rstest]
fn no_op_transition_is_rejected() -> Result<()> {
    let mut ticket = sample_ticket(TicketState::Pending)?;

    let result = ticket.change_state(TicketState::Pending, None, Utc::now());

    ensure!(
        matches!(result, Err(TicketStateError::AlreadyInState { .. })),
        "expected AlreadyInState, got {result:?}"
    );
    Ok(())
}

#[rstest]
#[case(TicketState::Open)]
#[case(TicketState::PendingAttachments)]
fn creation_only_targets_are_rejected(#[case] to: TicketState) -> Result<()> {
    let mut ticket = sample_ticket(TicketState::Pending)?;

    let result = ticket.change_state(to, None, Utc::now());

    ensure!(
        matches!(result, Err(TicketStateError::CreationOnlyTarget { .. })),
        "expected CreationOnlyTarget, got {result:?}"
    );
    Ok(())
}

#[rstest]
fn activate_moves_gated_ticket_to_pending() -> Result<()> {
    let mut ticket = sample_ticket(TicketState::PendingAttachments)?;
    let now = Utc::now();

    ticket.activate(now)?;

    ensure!(ticket.state() == TicketState::Pending, "gate did not fire");
    ensure!(ticket.updated_at() == now, "updated_at not touched");
    Ok(())
}

#[rstest]
#[case(TicketState::Open)]
#[case(TicketState::Pending)]
#[case(TicketState::Authorized)]
#[case(TicketState::Closed)]
fn activate_outside_gate_state_is_rejected(#[case] state: TicketState) -> Result<()> {
    let mut ticket = sample_ticket(state)?;

    let result = ticket.activate(Utc::now());

    ensure!(
        matches!(result, Err(TicketStateError::NotAwaitingAttachments { .. })),
        "expected NotAwaitingAttachments, got {result:?}"
    );
    Ok(())
}
