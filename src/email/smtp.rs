//! SMTP mail channel using lettre
//!
//! Host, port, TLS and timeout are shared by every send. Credentials belong
//! to the sender profile: each delivery authenticates as the sender's
//! address with the sender's password, so a transport is built per send.

use super::channel::{DeliveryError, MailChannel};
use crate::domain::{EmailSendResult, OutgoingEmail, SenderProfile, SmtpConfig};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::time::Duration;

/// SMTP reply codes that mean the server refused our credentials
const AUTH_FAILURE_CODES: [&str; 3] = ["530", "534", "535"];

/// Channel that opens an SMTP session per delivery
#[derive(Debug, Clone)]
pub struct SmtpChannel {
    config: SmtpConfig,
}

impl SmtpChannel {
    /// Create a new SMTP channel from configuration
    pub fn from_config(config: &SmtpConfig) -> Result<Self> {
        let channel = Self {
            config: config.clone(),
        };

        // Surface TLS/host problems at startup instead of on the first send
        channel
            .transport_for(None)
            .map_err(|e| AppError::Config(format!("Invalid SMTP configuration: {}", e)))?;

        Ok(channel)
    }

    fn transport_for(
        &self,
        sender: Option<&SenderProfile>,
    ) -> std::result::Result<AsyncSmtpTransport<Tokio1Executor>, DeliveryError> {
        let mut builder = if self.config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.host)
                .map_err(|e| DeliveryError::Connection(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.config.host)
        };

        builder = builder
            .port(self.config.port)
            .timeout(Some(Duration::from_millis(self.config.timeout_ms)));

        if let Some(sender) = sender {
            if let Some(password) = &sender.password {
                builder = builder.credentials(Credentials::new(
                    sender.address.clone(),
                    password.clone(),
                ));
            }
        }

        Ok(builder.build())
    }

    fn build_message(email: &OutgoingEmail) -> std::result::Result<Message, DeliveryError> {
        let from = sender_mailbox(&email.from)?;
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|e| DeliveryError::InvalidMessage(format!("Invalid to address: {}", e)))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(&email.subject)
            .header(ContentType::TEXT_HTML)
            .body(email.html_body.clone())
            .map_err(|e| DeliveryError::InvalidMessage(e.to_string()))
    }
}

/// The sender as a mailbox; lettre quotes display names that need it
fn sender_mailbox(sender: &SenderProfile) -> std::result::Result<Mailbox, DeliveryError> {
    let address = sender
        .address
        .parse()
        .map_err(|e| DeliveryError::InvalidMessage(format!("Invalid from address: {}", e)))?;
    let name = sender.name.clone().filter(|n| !n.is_empty());

    Ok(Mailbox::new(name, address))
}

fn classify_smtp_error(e: lettre::transport::smtp::Error) -> DeliveryError {
    let error_msg = e.to_string();

    if let Some(code) = e.status() {
        let code = code.to_string();
        if AUTH_FAILURE_CODES.contains(&code.as_str()) {
            return DeliveryError::AuthenticationFailed(error_msg);
        }
        return DeliveryError::Rejected(error_msg);
    }

    if error_msg.contains("authentication") || error_msg.contains("AUTH") {
        DeliveryError::AuthenticationFailed(error_msg)
    } else {
        DeliveryError::Connection(error_msg)
    }
}

#[async_trait]
impl MailChannel for SmtpChannel {
    async fn deliver(
        &self,
        email: &OutgoingEmail,
    ) -> std::result::Result<EmailSendResult, DeliveryError> {
        let message = Self::build_message(email)?;
        let transport = self.transport_for(Some(&email.from))?;

        let response = transport.send(message).await.map_err(classify_smtp_error)?;

        let message_id = response.message().next().map(|s| s.to_string());
        Ok(EmailSendResult::new(message_id))
    }

    async fn test_connection<'a>(
        &self,
        sender: Option<&'a SenderProfile>,
    ) -> std::result::Result<(), DeliveryError> {
        let transport = self.transport_for(sender)?;

        match transport.test_connection().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(DeliveryError::Connection(format!(
                "SMTP server {}:{} did not respond to NOOP",
                self.config.host, self.config.port
            ))),
            Err(e) => Err(classify_smtp_error(e)),
        }
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}
