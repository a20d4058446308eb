//! Tiered fallback resolution of supervision recipients.

use crate::ticket::domain::{BranchId, User};
use crate::ticket::ports::{StoreResult, StoreTx};

/// Recipient pools tried in order until one is non-empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SupervisionTier {
    BranchSupervisors,
    GlobalSupervisors,
    Admins,
}

impl SupervisionTier {
    const ORDER: [Self; 3] = [
        Self::BranchSupervisors,
        Self::GlobalSupervisors,
        Self::Admins,
    ];

    fn query(self, tx: &mut dyn StoreTx, branch_id: BranchId) -> StoreResult<Vec<User>> {
        match self {
            Self::BranchSupervisors => tx.active_supervisors_for_branch(branch_id),
            Self::GlobalSupervisors => tx.active_global_supervisors(),
            Self::Admins => tx.active_admins(),
        }
    }
}

/// Returns the users to notify about ticket creation in a branch: the
/// first non-empty tier of (1) active supervisors bound to the branch,
/// (2) active supervisors with no branch binding, (3) active admins.
///
/// An empty result means "no one to notify" and is not an error.
///
/// # Errors
///
/// Returns [`crate::ticket::ports::StoreError`] when a tier query fails.
pub fn resolve_supervision_recipients(
    tx: &mut dyn StoreTx,
    branch_id: BranchId,
) -> StoreResult<Vec<User>> {
    for tier in SupervisionTier::ORDER {
        let users = tier.query(tx, branch_id)?;
        if !users.is_empty() {
            return Ok(users);
        }
    }
    Ok(Vec::new())
}
