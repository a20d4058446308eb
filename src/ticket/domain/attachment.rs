//! Ticket attachments and their classification.

use super::{AttachmentId, ParseAttachmentKindError, TicketId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Classification of an attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    /// Photographic or scanned evidence.
    Image,
    /// Spreadsheet exports (CSV, Excel, OpenDocument).
    Spreadsheet,
    /// PDF documents.
    Pdf,
    /// Anything else.
    Other,
}

impl AttachmentKind {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Spreadsheet => "spreadsheet",
            Self::Pdf => "pdf",
            Self::Other => "other",
        }
    }

    /// Infers a classification from a MIME content type.
    #[must_use]
    pub fn from_content_type(content_type: &str) -> Self {
        let normalized = content_type.trim().to_ascii_lowercase();
        if normalized.starts_with("image/") {
            return Self::Image;
        }
        match normalized.as_str() {
            "application/pdf" => Self::Pdf,
            "text/csv"
            | "application/vnd.ms-excel"
            | "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            | "application/vnd.oasis.opendocument.spreadsheet" => Self::Spreadsheet,
            _ => Self::Other,
        }
    }
}

impl TryFrom<&str> for AttachmentKind {
    type Error = ParseAttachmentKindError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "image" => Ok(Self::Image),
            "spreadsheet" => Ok(Self::Spreadsheet),
            "pdf" => Ok(Self::Pdf),
            "other" => Ok(Self::Other),
            _ => Err(ParseAttachmentKindError(value.to_owned())),
        }
    }
}

/// One raw file submitted by an upload operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    /// Filename as submitted by the caller.
    pub original_name: String,
    /// MIME content type as submitted by the caller.
    pub content_type: String,
    /// Raw file bytes.
    pub bytes: Vec<u8>,
    /// Explicit classification; inferred from the content type when
    /// `None`.
    pub kind_override: Option<AttachmentKind>,
    /// Whether this upload becomes the ticket's primary attachment.
    pub is_primary: bool,
}

/// A stored file bound to a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Attachment identifier.
    pub id: AttachmentId,
    /// Owning ticket.
    pub ticket_id: TicketId,
    /// Classification.
    pub kind: AttachmentKind,
    /// Filename as originally submitted.
    pub original_name: String,
    /// Stable locator issued by the file store.
    pub locator: String,
    /// MIME content type.
    pub content_type: String,
    /// Size of the stored blob in bytes.
    pub byte_size: u64,
    /// Whether this is the ticket's primary attachment. At most one
    /// attachment per ticket carries the flag.
    pub is_primary: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Attachment {
    /// Creates an attachment row from a stored upload.
    #[must_use]
    pub fn from_upload(
        ticket_id: TicketId,
        upload: FileUpload,
        locator: String,
        now: DateTime<Utc>,
    ) -> Self {
        let kind = upload
            .kind_override
            .unwrap_or_else(|| AttachmentKind::from_content_type(&upload.content_type));
        Self {
            id: AttachmentId::new(),
            ticket_id,
            kind,
            original_name: upload.original_name,
            locator,
            content_type: upload.content_type,
            byte_size: upload.bytes.len() as u64,
            is_primary: upload.is_primary,
            created_at: now,
        }
    }
}
