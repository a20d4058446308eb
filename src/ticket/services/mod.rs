//! Application services for the ticket lifecycle.

mod fanout;
mod lifecycle;
mod recipients;

pub use fanout::{FanOutError, fan_out_ticket_created};
pub use lifecycle::{
    AttachFilesOutcome, ChangeStateOutcome, CreateTicketRequest, PermissionError,
    TicketLifecycleService, TicketServiceError, ValidationError,
};
pub use recipients::resolve_supervision_recipients;
