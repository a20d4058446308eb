//! Domain model for the ticket lifecycle.
//!
//! The ticket domain models the fixed six-state machine, the append-only
//! transition history, attachment classification, and the reference data
//! (users, branches, acting identities) consumed by the lifecycle
//! protocols, while keeping all infrastructure concerns outside of the
//! domain boundary.

mod actor;
mod attachment;
mod directory;
mod error;
mod history;
mod ids;
mod ticket;

pub use actor::{Actor, Role};
pub use attachment::{Attachment, AttachmentKind, FileUpload};
pub use directory::{Branch, User};
pub use error::{
    EmptySubjectError, ParseAttachmentKindError, ParseRoleError, ParseTicketStateError,
    TicketStateError,
};
pub use history::StateTransition;
pub use ids::{AttachmentId, BranchId, NotificationId, TicketId, TransitionId, UserId};
pub use ticket::{PersistedTicketData, Subject, Ticket, TicketDraft, TicketState};
