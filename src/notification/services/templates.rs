//! Fixed message templates for ticket notifications.
//!
//! All copy sent to users is rendered from the constants in this module;
//! wording is part of the crate, not configuration.

use crate::notification::domain::Channel;
use crate::ticket::domain::{Branch, Ticket};
use minijinja::Environment;
use serde::Serialize;
use thiserror::Error;

const CREATED_SUBJECT: &str = "Ticket {{ ticket_id }}: {{ subject }}";

const CREATED_BODY: &str = "\
{{ operator }} raised ticket {{ ticket_id }} at {{ branch }} ({{ city }}).\n\
Subject: {{ subject }}\n\
Status: {{ state }}\n\
Delivered via {{ channel }}.";

const EMAIL_HTML: &str = "\
<html><body>\
<p><strong>{{ operator }}</strong> raised ticket <strong>{{ ticket_id }}</strong> \
at {{ branch }} ({{ city }}).</p>\
<p>Subject: {{ subject }}<br>Status: {{ state }}</p>\
</body></html>";

const EMAIL_TEXT: &str = "\
{{ operator }} raised ticket {{ ticket_id }} at {{ branch }} ({{ city }}).\n\
Subject: {{ subject }}\n\
Status: {{ state }}";

/// Error returned when a template fails to render.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("template render failed: {0}")]
pub struct TemplateError(String);

/// Parameters available to every ticket message template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketMessageContext {
    /// Ticket identifier.
    pub ticket_id: String,
    /// Display name of the creating operator.
    pub operator: String,
    /// Branch name.
    pub branch: String,
    /// Branch city.
    pub city: String,
    /// Current ticket state.
    pub state: String,
    /// Ticket subject.
    pub subject: String,
    /// Channel label.
    pub channel: String,
}

impl TicketMessageContext {
    /// Builds the context for a ticket message on the given channel.
    #[must_use]
    pub fn for_ticket(ticket: &Ticket, operator_name: &str, branch: &Branch, channel: Channel) -> Self {
        Self {
            ticket_id: ticket.id().to_string(),
            operator: operator_name.to_owned(),
            branch: branch.name.clone(),
            city: branch.city.clone(),
            state: ticket.state().as_str().to_owned(),
            subject: ticket.subject().as_str().to_owned(),
            channel: channel.label().to_owned(),
        }
    }
}

/// Renders the subject line for a ticket-created notification.
///
/// # Errors
///
/// Returns [`TemplateError`] when rendering fails.
pub fn render_created_subject(context: &TicketMessageContext) -> Result<String, TemplateError> {
    render(CREATED_SUBJECT, context)
}

/// Renders the body for a ticket-created notification.
///
/// # Errors
///
/// Returns [`TemplateError`] when rendering fails.
pub fn render_created_body(context: &TicketMessageContext) -> Result<String, TemplateError> {
    render(CREATED_BODY, context)
}

/// Renders the HTML body for a ticket-created email.
///
/// # Errors
///
/// Returns [`TemplateError`] when rendering fails.
pub fn render_email_html(context: &TicketMessageContext) -> Result<String, TemplateError> {
    render(EMAIL_HTML, context)
}

/// Renders the plain-text body for a ticket-created email.
///
/// # Errors
///
/// Returns [`TemplateError`] when rendering fails.
pub fn render_email_text(context: &TicketMessageContext) -> Result<String, TemplateError> {
    render(EMAIL_TEXT, context)
}

fn render(template: &str, context: &TicketMessageContext) -> Result<String, TemplateError> {
    let environment = Environment::new();
    environment
        .render_str(template, context)
        .map_err(|error| TemplateError(error.to_string()))
}
