//! Email domain types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use validator::Validate;

/// Name of the sender profile used when the caller does not pick one
pub const DEFAULT_SENDER: &str = "default";

/// A templated email to be sent to a single recipient
///
/// The whole value is handed to the template renderer as template data, so
/// `subject`, `recipient` and `template_id` are available as variables next
/// to anything added with [`EmailMessage::with_variable`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailMessage {
    template_id: String,
    subject: String,
    recipient: String,
    #[serde(flatten)]
    variables: BTreeMap<String, serde_json::Value>,
}

impl EmailMessage {
    pub fn new(
        template_id: impl Into<String>,
        subject: impl Into<String>,
        recipient: impl Into<String>,
    ) -> Self {
        Self {
            template_id: template_id.into(),
            subject: subject.into(),
            recipient: recipient.into(),
            variables: BTreeMap::new(),
        }
    }

    /// Attach an extra template variable
    ///
    /// Keys that collide with the built-in fields are ignored.
    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        let key = key.into();
        if !matches!(key.as_str(), "template_id" | "subject" | "recipient") {
            self.variables.insert(key, value.into());
        }
        self
    }

    pub fn template_id(&self) -> &str {
        &self.template_id
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    pub fn variables(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.variables
    }
}

/// Named sender identity and its credentials
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct SenderProfile {
    /// From address, also the SMTP username
    #[validate(email)]
    pub address: String,

    /// Display name shown next to the address (optional)
    #[serde(default)]
    pub name: Option<String>,

    /// SMTP password for this sender. Unused by the API transport.
    #[serde(default)]
    pub password: Option<String>,
}

impl SenderProfile {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: None,
            password: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }
}

impl fmt::Debug for SenderProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SenderProfile")
            .field("address", &self.address)
            .field("name", &self.name)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Transport selection and connection parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransportConfig {
    /// Direct SMTP session, credentials come from the sender profile
    Smtp(SmtpConfig),

    /// SendGrid v3 HTTP API, one API key for every sender
    #[serde(rename = "sendgrid")]
    SendGrid(SendGridConfig),
}

impl TransportConfig {
    /// Get the transport type as a string
    pub fn transport_type(&self) -> &'static str {
        match self {
            Self::Smtp(_) => "smtp",
            Self::SendGrid(_) => "sendgrid",
        }
    }
}

/// SMTP connection parameters shared by all senders
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct SmtpConfig {
    /// SMTP server host
    #[validate(length(min = 1, max = 255))]
    pub host: String,

    /// SMTP server port (typically 587 for STARTTLS, 25 for unencrypted)
    #[serde(default = "default_smtp_port")]
    pub port: u16,

    /// Upgrade the session with STARTTLS
    #[serde(default = "default_true")]
    pub use_tls: bool,

    /// Connection and command timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// SendGrid API parameters
#[derive(Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct SendGridConfig {
    #[validate(length(min = 1))]
    pub api_key: String,

    /// API root, overridable for tests and regional endpoints
    #[serde(default = "default_sendgrid_base_url")]
    #[validate(url)]
    pub base_url: String,

    /// Request timeout in milliseconds. The HTTP client default applies when unset.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl fmt::Debug for SendGridConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SendGridConfig")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

pub(crate) fn default_true() -> bool {
    true
}

pub(crate) fn default_smtp_port() -> u16 {
    587
}

pub(crate) fn default_timeout_ms() -> u64 {
    10_000
}

pub(crate) fn default_sendgrid_base_url() -> String {
    "https://api.sendgrid.com".to_string()
}

/// Email ready for a channel: sender resolved and body rendered
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub from: SenderProfile,
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// Result of sending an email
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailSendResult {
    /// Channel-specific message id, when the channel reports one
    pub message_id: Option<String>,
}

impl EmailSendResult {
    pub fn new(message_id: Option<String>) -> Self {
        Self { message_id }
    }
}
