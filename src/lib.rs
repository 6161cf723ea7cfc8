//! Emailer - templated email sending
//!
//! This crate renders a template into an HTML body and delivers it as one of
//! a set of named sender profiles, over either SMTP or the SendGrid API.
//! Callers program against [`MailTransport`]; which channel carries the mail
//! is a configuration choice.

pub mod config;
pub mod domain;
pub mod email;
pub mod error;
pub mod telemetry;

// Re-export commonly used types
pub use config::Config;
pub use domain::{EmailMessage, EmailSendResult, SenderProfile, TransportConfig, DEFAULT_SENDER};
pub use email::{build_transport, EmailError, MailTransport, SenderRegistry, TemplateRenderer};
pub use error::{AppError, Result};
