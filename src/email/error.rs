//! Errors returned by [`MailTransport::send`](super::MailTransport::send)

use super::channel::DeliveryError;
use super::templates::RenderError;
use thiserror::Error;

/// Why a send failed. Exactly one kind per failed call.
#[derive(Error, Debug)]
pub enum EmailError {
    /// The requested sender profile is not configured
    #[error("Unknown sender: {0}")]
    UnknownSender(String),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),
}

impl EmailError {
    /// Short label used for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownSender(_) => "unknown_sender",
            Self::Render(_) => "render_error",
            Self::Delivery(_) => "delivery_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_error_display() {
        let err = EmailError::UnknownSender("mkt".to_string());
        assert_eq!(err.to_string(), "Unknown sender: mkt");
        assert_eq!(err.kind(), "unknown_sender");
    }

    #[test]
    fn test_email_error_from_delivery() {
        let err: EmailError = DeliveryError::RateLimited.into();
        assert!(matches!(err, EmailError::Delivery(DeliveryError::RateLimited)));
        assert_eq!(err.kind(), "delivery_error");
    }

    #[test]
    fn test_email_error_from_render() {
        let err: EmailError = RenderError::NotFound("welcome".to_string()).into();
        assert!(matches!(err, EmailError::Render(RenderError::NotFound(_))));
        assert_eq!(err.kind(), "render_error");
    }
}
