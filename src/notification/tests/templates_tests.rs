//! Unit tests for the fixed notification templates.

use crate::notification::domain::Channel;
use crate::notification::services::{
    TicketMessageContext, render_created_body, render_created_subject, render_email_html,
    render_email_text,
};
use eyre::{Result, ensure};
use rstest::rstest;

fn context() -> TicketMessageContext {
    TicketMessageContext {
        ticket_id: "f9b0d3a2".to_owned(),
        operator: "Olga".to_owned(),
        branch: "Centro".to_owned(),
        city: "Montevideo".to_owned(),
        state: "pending".to_owned(),
        subject: "Till drawer stuck".to_owned(),
        channel: Channel::Internal.label().to_owned(),
    }
}

#[rstest]
fn subject_contains_ticket_id_and_subject() -> Result<()> {
    let subject = render_created_subject(&context())?;

    ensure!(subject == "Ticket f9b0d3a2: Till drawer stuck", "got {subject}");
    Ok(())
}

#[rstest]
fn body_mentions_operator_branch_and_channel() -> Result<()> {
    let body = render_created_body(&context())?;

    ensure!(body.contains("Olga"), "operator missing: {body}");
    ensure!(body.contains("Centro"), "branch missing: {body}");
    ensure!(body.contains("Montevideo"), "city missing: {body}");
    ensure!(body.contains("inbox"), "channel label missing: {body}");
    ensure!(body.contains("pending"), "state missing: {body}");
    Ok(())
}

#[rstest]
fn email_bodies_render_both_variants() -> Result<()> {
    let html = render_email_html(&context())?;
    let text = render_email_text(&context())?;

    ensure!(html.contains("<strong>Olga</strong>"), "html markup missing");
    ensure!(html.contains("Till drawer stuck"), "html subject missing");
    ensure!(!text.contains('<'), "text variant must stay plain");
    ensure!(text.contains("Till drawer stuck"), "text subject missing");
    Ok(())
}
