//! Shared builders for ticket tests.

use crate::ticket::adapters::memory::{
    InMemoryAuditLog, InMemoryFileStore, InMemoryTicketStore, RecordingScheduler,
};
use crate::ticket::domain::{
    Actor, AttachmentKind, Branch, BranchId, FileUpload, Role, User, UserId,
};
use crate::ticket::services::TicketLifecycleService;
use mockable::DefaultClock;
use std::sync::Arc;

/// Lifecycle service wired to in-memory adapters, with handles to the
/// doubles for inspection.
pub struct TestHarness {
    pub service: TicketLifecycleService<InMemoryTicketStore, DefaultClock>,
    pub store: Arc<InMemoryTicketStore>,
    pub files: Arc<InMemoryFileStore>,
    pub audit: Arc<InMemoryAuditLog>,
    pub scheduler: Arc<RecordingScheduler>,
}

pub fn harness() -> TestHarness {
    let store = Arc::new(InMemoryTicketStore::new());
    let files = Arc::new(InMemoryFileStore::new());
    let audit = Arc::new(InMemoryAuditLog::new());
    let scheduler = Arc::new(RecordingScheduler::new());
    let service = TicketLifecycleService::new(
        Arc::clone(&store),
        Arc::clone(&files) as _,
        Arc::clone(&audit) as _,
        Arc::clone(&scheduler) as _,
        Arc::new(DefaultClock),
    );
    TestHarness {
        service,
        store,
        files,
        audit,
        scheduler,
    }
}

pub fn user(name: &str, role: Role, branch_id: Option<BranchId>, email: Option<&str>) -> User {
    User {
        id: UserId::new(),
        display_name: name.to_owned(),
        email: email.map(str::to_owned),
        role,
        branch_id,
        active: true,
    }
}

pub fn branch(name: &str, requires_attachments: bool) -> Branch {
    Branch {
        id: BranchId::new(),
        name: name.to_owned(),
        city: "Montevideo".to_owned(),
        requires_attachments,
    }
}

pub fn actor_for(user: &User) -> Actor {
    Actor::new(user.id, user.role, user.branch_id)
}

pub fn png_upload(name: &str) -> FileUpload {
    FileUpload {
        original_name: name.to_owned(),
        content_type: "image/png".to_owned(),
        bytes: vec![0x89, 0x50, 0x4e, 0x47],
        kind_override: None,
        is_primary: false,
    }
}

pub fn primary_pdf_upload(name: &str) -> FileUpload {
    FileUpload {
        original_name: name.to_owned(),
        content_type: "application/pdf".to_owned(),
        bytes: b"%PDF-1.7".to_vec(),
        kind_override: Some(AttachmentKind::Pdf),
        is_primary: true,
    }
}
