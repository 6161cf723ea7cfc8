//! The `MailTransport` contract and its single implementation over channels

use super::channel::MailChannel;
use super::error::EmailError;
use super::sendgrid::SendGridChannel;
use super::sender::SenderRegistry;
use super::smtp::SmtpChannel;
use super::templates::{RenderError, TemplateRenderer};
use crate::domain::{EmailMessage, EmailSendResult, OutgoingEmail, TransportConfig, DEFAULT_SENDER};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

/// Sends templated emails as a named sender
///
/// Callers program against this trait; whether mail leaves over SMTP or an
/// HTTP API is decided once, when the transport is built.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Render `message` and deliver it as the sender profile `sender`
    async fn send(
        &self,
        message: &EmailMessage,
        sender: &str,
    ) -> Result<EmailSendResult, EmailError>;

    /// Send as the `"default"` sender profile
    async fn send_default(&self, message: &EmailMessage) -> Result<EmailSendResult, EmailError> {
        self.send(message, DEFAULT_SENDER).await
    }

    /// Check connectivity and credentials of the underlying channel
    async fn test_connection(&self) -> Result<(), EmailError>;

    /// Get the transport name
    fn transport_name(&self) -> &'static str;
}

/// Resolves the sender, renders the body and hands the result to a channel
pub struct Emailer<C: MailChannel> {
    senders: Arc<SenderRegistry>,
    renderer: Arc<dyn TemplateRenderer>,
    channel: C,
}

/// Emailer delivering over SMTP
pub type SmtpEmailer = Emailer<SmtpChannel>;

/// Emailer delivering over the SendGrid API
pub type SendGridEmailer = Emailer<SendGridChannel>;

impl<C: MailChannel> Emailer<C> {
    pub fn new(
        channel: C,
        senders: impl Into<Arc<SenderRegistry>>,
        renderer: Arc<dyn TemplateRenderer>,
    ) -> Self {
        Self {
            senders: senders.into(),
            renderer,
            channel,
        }
    }

    pub fn senders(&self) -> &SenderRegistry {
        &self.senders
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    async fn send_inner(
        &self,
        message: &EmailMessage,
        sender: &str,
    ) -> Result<EmailSendResult, EmailError> {
        let profile = self.senders.resolve(sender)?;

        let data = serde_json::to_value(message).map_err(|e| RenderError::Data(e.to_string()))?;
        let html_body = self.renderer.render(message.template_id(), &data).await?;

        let email = OutgoingEmail {
            from: profile.clone(),
            to: message.recipient().to_string(),
            subject: message.subject().to_string(),
            html_body,
        };

        Ok(self.channel.deliver(&email).await?)
    }
}

#[async_trait]
impl<C: MailChannel> MailTransport for Emailer<C> {
    async fn send(
        &self,
        message: &EmailMessage,
        sender: &str,
    ) -> Result<EmailSendResult, EmailError> {
        let transport = self.channel.name();
        let span = tracing::info_span!(
            "email_send",
            transport,
            sender,
            template_id = message.template_id(),
        );

        async {
            let started = Instant::now();
            let result = self.send_inner(message, sender).await;

            let outcome = match &result {
                Ok(sent) => {
                    tracing::info!(message_id = ?sent.message_id, "Email sent");
                    "success"
                }
                Err(e) => {
                    tracing::warn!(error = %e, kind = e.kind(), "Email send failed");
                    e.kind()
                }
            };

            metrics::counter!("emailer_send_total", "transport" => transport, "outcome" => outcome)
                .increment(1);
            metrics::histogram!("emailer_send_duration_seconds", "transport" => transport)
                .record(started.elapsed().as_secs_f64());

            result
        }
        .instrument(span)
        .await
    }

    async fn test_connection(&self) -> Result<(), EmailError> {
        self.channel
            .test_connection(self.senders.default_profile())
            .await
            .map_err(|e| {
                tracing::warn!(transport = self.channel.name(), error = %e, "Connection test failed");
                EmailError::Delivery(e)
            })
    }

    fn transport_name(&self) -> &'static str {
        self.channel.name()
    }
}

/// Build the transport selected by configuration
pub fn build_transport(
    config: &TransportConfig,
    senders: SenderRegistry,
    renderer: Arc<dyn TemplateRenderer>,
) -> crate::error::Result<Arc<dyn MailTransport>> {
    if senders.default_profile().is_none() {
        tracing::warn!(
            "No \"{}\" sender profile configured; sends without an explicit sender will fail",
            DEFAULT_SENDER
        );
    }

    let transport: Arc<dyn MailTransport> = match config {
        TransportConfig::Smtp(smtp_config) => {
            let channel = SmtpChannel::from_config(smtp_config)?;
            Arc::new(Emailer::new(channel, senders, renderer))
        }
        TransportConfig::SendGrid(sendgrid_config) => {
            let channel = SendGridChannel::from_config(sendgrid_config)?;
            Arc::new(Emailer::new(channel, senders, renderer))
        }
    };

    tracing::info!(transport = transport.transport_name(), "Mail transport ready");
    Ok(transport)
}
