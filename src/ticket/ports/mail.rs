//! Outbound mail transport port.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// One rendered outbound email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    /// Destination address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// HTML body.
    pub html_body: String,
    /// Plain-text body.
    pub text_body: String,
}

/// Errors returned by mail transport implementations.
#[derive(Debug, Clone, Error)]
pub enum MailTransportError {
    /// An address could not be parsed.
    #[error("invalid mail address: {0}")]
    InvalidAddress(String),

    /// Delivery failed at the transport.
    #[error("mail transport failure: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),
}

impl MailTransportError {
    /// Wraps a transport error.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }
}

/// Mail delivery contract. No delivery-receipt callback is assumed; a
/// successful return means the transport accepted the message.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Attempts delivery of one email.
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailTransportError>;
}
