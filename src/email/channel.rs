//! Mail channel trait and delivery error types

use crate::domain::{EmailSendResult, OutgoingEmail, SenderProfile};
use async_trait::async_trait;
use thiserror::Error;

/// Failure while handing a message to a channel
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Message rejected: {0}")]
    Rejected(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Invalid message: {0}")]
    InvalidMessage(String),
}

/// A concrete way of delivering a fully built email
///
/// Channels know nothing about sender names or templates; they receive an
/// [`OutgoingEmail`] and make exactly one delivery attempt.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailChannel: Send + Sync {
    /// Deliver a message
    async fn deliver(&self, email: &OutgoingEmail) -> Result<EmailSendResult, DeliveryError>;

    /// Check that the channel is reachable and accepts our credentials
    ///
    /// Channels with per-sender credentials authenticate as `sender` when given.
    async fn test_connection<'a>(&self, sender: Option<&'a SenderProfile>) -> Result<(), DeliveryError>;

    /// Get the channel name
    fn name(&self) -> &'static str;
}
