//! Acting identity context resolved by the out-of-scope authentication
//! layer.

use super::{BranchId, ParseRoleError, UserId};
use serde::{Deserialize, Serialize};

/// Role of an authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Branch operator; raises tickets and uploads attachments to their
    /// own tickets.
    Operator,
    /// Supervisor; authorises, rejects and closes tickets.
    Supervisor,
    /// Administrator; full access including hard deletion.
    Admin,
}

impl Role {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Operator => "operator",
            Self::Supervisor => "supervisor",
            Self::Admin => "admin",
        }
    }

    /// Returns `true` for roles allowed to drive supervisor-only
    /// operations (state changes, uploads to foreign tickets).
    #[must_use]
    pub const fn is_supervisory(self) -> bool {
        matches!(self, Self::Supervisor | Self::Admin)
    }
}

impl TryFrom<&str> for Role {
    type Error = ParseRoleError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "operator" => Ok(Self::Operator),
            "supervisor" => Ok(Self::Supervisor),
            "admin" => Ok(Self::Admin),
            _ => Err(ParseRoleError(value.to_owned())),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity context of the caller of a lifecycle operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    user_id: UserId,
    role: Role,
    home_branch: Option<BranchId>,
}

impl Actor {
    /// Creates an actor from resolved identity data.
    #[must_use]
    pub const fn new(user_id: UserId, role: Role, home_branch: Option<BranchId>) -> Self {
        Self {
            user_id,
            role,
            home_branch,
        }
    }

    /// Returns the acting user's identifier.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the acting user's role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Returns the acting user's home branch, if any.
    #[must_use]
    pub const fn home_branch(&self) -> Option<BranchId> {
        self.home_branch
    }
}
