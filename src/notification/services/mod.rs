//! Application services for notification delivery and inbox access.

mod delivery;
mod inbox;
mod templates;

pub use delivery::{
    DeliveryError, DeliveryReport, EmailDeliveryWorker, TokioDeliveryScheduler,
};
pub use inbox::{InboxError, InboxSummary, NotificationInboxService};
pub use templates::{
    TemplateError, TicketMessageContext, render_created_body, render_created_subject,
    render_email_html, render_email_text,
};
