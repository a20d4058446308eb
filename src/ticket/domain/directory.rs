//! Reference data consumed by the lifecycle protocols.
//!
//! User and branch records are owned by an out-of-scope CRUD layer; this
//! module models only the attributes the ticket core reads.

use super::{BranchId, Role, UserId};
use serde::{Deserialize, Serialize};

/// A user record as read by recipient resolution and delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User identifier.
    pub id: UserId,
    /// Display name used in notification copy.
    pub display_name: String,
    /// Email address, if the user has one on file.
    pub email: Option<String>,
    /// Role of the user.
    pub role: Role,
    /// Branch the user is bound to; `None` for global users.
    pub branch_id: Option<BranchId>,
    /// Whether the account is active.
    pub active: bool,
}

impl User {
    /// Returns the user's email address when it is usable for delivery
    /// (present and not blank).
    #[must_use]
    pub fn usable_email(&self) -> Option<&str> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
    }
}

/// A branch record as read by ticket creation and notification copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    /// Branch identifier.
    pub id: BranchId,
    /// Branch name.
    pub name: String,
    /// City the branch operates in.
    pub city: String,
    /// When set, tickets raised in this branch start in
    /// `pending_attachments` and stay invisible to supervisors until the
    /// first attachment arrives.
    pub requires_attachments: bool,
}
