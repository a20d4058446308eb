//! SMTP mail transport backed by `lettre`.

use crate::ticket::ports::{MailTransport, MailTransportError, OutboundEmail};
use async_trait::async_trait;
use lettre::message::MultiPart;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::sync::Arc;

/// Connection settings for the outbound SMTP relay.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    /// Relay host name.
    pub host: String,
    /// Relay port.
    pub port: u16,
    /// Authentication user name.
    pub username: String,
    /// Authentication password.
    pub password: String,
    /// Sender address, optionally with a display name.
    pub from: String,
}

/// Mail transport sending through an authenticated SMTP relay.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: Arc<SmtpTransport>,
    from: String,
}

impl SmtpMailer {
    /// Builds a mailer from relay settings.
    ///
    /// # Errors
    ///
    /// Returns [`MailTransportError::Transport`] when the relay
    /// connection cannot be configured.
    pub fn new(config: &SmtpConfig) -> Result<Self, MailTransportError> {
        let transport = SmtpTransport::relay(&config.host)
            .map_err(MailTransportError::transport)?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();
        Ok(Self {
            transport: Arc::new(transport),
            from: config.from.clone(),
        })
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailTransportError> {
        let message = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|_| MailTransportError::InvalidAddress(self.from.clone()))?,
            )
            .to(email
                .to
                .parse()
                .map_err(|_| MailTransportError::InvalidAddress(email.to.clone()))?)
            .subject(email.subject.clone())
            .multipart(MultiPart::alternative_plain_html(
                email.text_body.clone(),
                email.html_body.clone(),
            ))
            .map_err(MailTransportError::transport)?;

        let transport = Arc::clone(&self.transport);
        tokio::task::spawn_blocking(move || transport.send(&message))
            .await
            .map_err(MailTransportError::transport)?
            .map_err(MailTransportError::transport)?;
        Ok(())
    }
}
