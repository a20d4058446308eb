//! Unit tests for tiered supervision recipient resolution.

use crate::ticket::adapters::memory::InMemoryTicketStore;
use crate::ticket::domain::{BranchId, Role, User};
use crate::ticket::ports::{StoreError, TicketStore};
use crate::ticket::services::resolve_supervision_recipients;
use eyre::{Result, ensure};
use rstest::rstest;

use super::fixtures;

async fn resolve(store: &InMemoryTicketStore, branch_id: BranchId) -> Result<Vec<User>> {
    let users = store
        .transaction(move |tx| resolve_supervision_recipients(tx, branch_id))
        .await
        .map_err(|err: StoreError| eyre::eyre!(err))?;
    Ok(users)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn branch_supervisors_win_over_later_tiers() -> Result<()> {
    let store = InMemoryTicketStore::new();
    let branch = fixtures::branch("Centro", false);
    store.seed_branch(branch.clone());
    let local = fixtures::user("Lena", Role::Supervisor, Some(branch.id), Some("l@x.test"));
    store.seed_user(local.clone());
    store.seed_user(fixtures::user("Gus", Role::Supervisor, None, Some("g@x.test")));
    store.seed_user(fixtures::user("Ada", Role::Admin, None, Some("a@x.test")));

    let recipients = resolve(&store, branch.id).await?;

    ensure!(
        recipients.iter().map(|user| user.id).collect::<Vec<_>>() == vec![local.id],
        "expected only the branch supervisor"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn falls_back_to_global_supervisors() -> Result<()> {
    let store = InMemoryTicketStore::new();
    let branch = fixtures::branch("Centro", false);
    store.seed_branch(branch.clone());
    let global = fixtures::user("Gus", Role::Supervisor, None, Some("g@x.test"));
    store.seed_user(global.clone());
    store.seed_user(fixtures::user("Ada", Role::Admin, None, Some("a@x.test")));

    let recipients = resolve(&store, branch.id).await?;

    ensure!(
        recipients.iter().map(|user| user.id).collect::<Vec<_>>() == vec![global.id],
        "expected only the global supervisor"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn falls_back_to_admins_when_no_supervisors_exist() -> Result<()> {
    let store = InMemoryTicketStore::new();
    let branch = fixtures::branch("Centro", false);
    store.seed_branch(branch.clone());
    let admin = fixtures::user("Ada", Role::Admin, None, Some("a@x.test"));
    store.seed_user(admin.clone());
    store.seed_user(fixtures::user("Olga", Role::Operator, Some(branch.id), Some("o@x.test")));

    let recipients = resolve(&store, branch.id).await?;

    ensure!(
        recipients.iter().map(|user| user.id).collect::<Vec<_>>() == vec![admin.id],
        "expected only the admin"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn inactive_users_never_resolve() -> Result<()> {
    let store = InMemoryTicketStore::new();
    let branch = fixtures::branch("Centro", false);
    store.seed_branch(branch.clone());
    let mut dormant = fixtures::user("Lena", Role::Supervisor, Some(branch.id), Some("l@x.test"));
    dormant.active = false;
    store.seed_user(dormant);
    let global = fixtures::user("Gus", Role::Supervisor, None, Some("g@x.test"));
    store.seed_user(global.clone());

    let recipients = resolve(&store, branch.id).await?;

    ensure!(
        recipients.iter().map(|user| user.id).collect::<Vec<_>>() == vec![global.id],
        "inactive branch supervisor must not block the fallback"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn empty_directory_resolves_to_no_one() -> Result<()> {
    let store = InMemoryTicketStore::new();
    let branch = fixtures::branch("Centro", false);
    store.seed_branch(branch.clone());

    let recipients = resolve(&store, branch.id).await?;

    ensure!(recipients.is_empty(), "expected no recipients");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn supervisors_of_other_branches_do_not_match() -> Result<()> {
    let store = InMemoryTicketStore::new();
    let branch = fixtures::branch("Centro", false);
    let other = fixtures::branch("Norte", false);
    store.seed_branch(branch.clone());
    store.seed_branch(other.clone());
    store.seed_user(fixtures::user("Nina", Role::Supervisor, Some(other.id), Some("n@x.test")));
    let admin = fixtures::user("Ada", Role::Admin, None, Some("a@x.test"));
    store.seed_user(admin.clone());

    let recipients = resolve(&store, branch.id).await?;

    ensure!(
        recipients.iter().map(|user| user.id).collect::<Vec<_>>() == vec![admin.id],
        "foreign-branch supervisor must not match"
    );
    Ok(())
}
