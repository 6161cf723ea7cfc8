//! Email sending functionality for Emailer
//!
//! This module provides templated email sending with two interchangeable channels:
//! - SMTP (using lettre), credentials per sender profile
//! - SendGrid v3 HTTP API, one API key for all senders

pub mod channel;
pub mod error;
pub mod sender;
pub mod sendgrid;
pub mod smtp;
pub mod templates;
pub mod transport;

pub use channel::{DeliveryError, MailChannel};
pub use error::EmailError;
pub use sender::SenderRegistry;
pub use sendgrid::SendGridChannel;
pub use smtp::SmtpChannel;
pub use templates::{
    FileTemplateRenderer, InMemoryTemplateRenderer, RenderError, TemplateEngine, TemplateRenderer,
};
pub use transport::{build_transport, Emailer, MailTransport, SendGridEmailer, SmtpEmailer};
