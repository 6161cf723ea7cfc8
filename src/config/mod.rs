//! Configuration management for Emailer
//!
//! Configuration comes either from environment variables ([`Config::from_env`])
//! or from a settings file ([`Config::from_file`]). Both are read once at
//! startup; nothing here changes afterwards.

use crate::domain::{
    default_sendgrid_base_url, default_smtp_port, default_timeout_ms, SendGridConfig,
    SenderProfile, SmtpConfig, TransportConfig,
};
use crate::email::SenderRegistry;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use validator::Validate;

/// Prefix for environment overrides of file settings (`EMAILER__SMTP__HOST`)
const FILE_ENV_PREFIX: &str = "EMAILER";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Transport selection and connection parameters
    pub transport: TransportConfig,
    /// Sender profiles by name
    pub senders: SenderRegistry,
    /// Template lookup
    pub templates: TemplatesConfig,
    /// Logging configuration
    pub telemetry: TelemetryConfig,
}

/// Where file templates live: `<content_root>/<emails_folder>/<id>.html`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TemplatesConfig {
    #[serde(default = "default_content_root")]
    pub content_root: PathBuf,
    #[serde(default = "default_emails_folder")]
    pub emails_folder: String,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            content_root: default_content_root(),
            emails_folder: default_emails_folder(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TelemetryConfig {
    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_format: default_log_format(),
        }
    }
}

fn default_content_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_emails_folder() -> String {
    "Emails".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

/// Shape of a settings file
#[derive(Debug, Deserialize)]
struct FileConfig {
    #[serde(default = "default_transport")]
    transport: String,
    smtp: Option<SmtpConfig>,
    sendgrid: Option<SendGridConfig>,
    #[serde(default)]
    senders: Vec<FileSender>,
    #[serde(default)]
    templates: TemplatesConfig,
    #[serde(default)]
    telemetry: TelemetryConfig,
}

/// One `[[senders]]` entry
///
/// The profile name is a value rather than a table key: the `config` crate
/// lowercases keys, values keep their case.
#[derive(Debug, Deserialize)]
struct FileSender {
    profile: String,
    address: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

impl FileConfig {
    fn sender_registry(&self) -> Result<SenderRegistry> {
        let mut profiles = HashMap::with_capacity(self.senders.len());
        for sender in &self.senders {
            let profile = SenderProfile {
                address: sender.address.clone(),
                name: sender.name.clone(),
                password: sender.password.clone(),
            };
            if profiles.insert(sender.profile.clone(), profile).is_some() {
                bail!("Sender profile \"{}\" is configured more than once", sender.profile);
            }
        }
        Ok(SenderRegistry::new(profiles))
    }
}

fn default_transport() -> String {
    "smtp".to_string()
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load configuration through a variable lookup function
    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let transport_type = var("EMAIL_TRANSPORT").unwrap_or_else(default_transport);

        let transport = match transport_type.to_lowercase().as_str() {
            "smtp" => TransportConfig::Smtp(SmtpConfig {
                host: var("SMTP_HOST").context("SMTP_HOST is required for the smtp transport")?,
                port: match var("SMTP_PORT") {
                    Some(port) => port.parse::<u16>().context("Invalid SMTP_PORT")?,
                    None => default_smtp_port(),
                },
                use_tls: var("SMTP_USE_TLS")
                    .map(|s| s.to_lowercase() == "true")
                    .unwrap_or(true),
                timeout_ms: match var("SMTP_TIMEOUT_MS") {
                    Some(timeout) => timeout.parse::<u64>().context("Invalid SMTP_TIMEOUT_MS")?,
                    None => default_timeout_ms(),
                },
            }),
            "sendgrid" => TransportConfig::SendGrid(SendGridConfig {
                api_key: var("SENDGRID_API_KEY")
                    .context("SENDGRID_API_KEY is required for the sendgrid transport")?,
                base_url: var("SENDGRID_BASE_URL").unwrap_or_else(default_sendgrid_base_url),
                timeout_ms: var("SENDGRID_TIMEOUT_MS")
                    .map(|s| s.parse::<u64>().context("Invalid SENDGRID_TIMEOUT_MS"))
                    .transpose()?,
            }),
            other => bail!("Unknown EMAIL_TRANSPORT: {}", other),
        };

        Ok(Self {
            transport,
            senders: Self::senders_from_vars(&var)?,
            templates: TemplatesConfig {
                content_root: var("EMAIL_TEMPLATES_ROOT")
                    .map(PathBuf::from)
                    .unwrap_or_else(default_content_root),
                emails_folder: var("EMAIL_TEMPLATES_FOLDER")
                    .unwrap_or_else(default_emails_folder),
            },
            telemetry: TelemetryConfig {
                log_format: var("LOG_FORMAT").unwrap_or_else(default_log_format),
            },
        })
    }

    /// Load only the sender profiles from environment variables
    pub fn senders_from_env() -> Result<SenderRegistry> {
        Self::senders_from_vars(|key| env::var(key).ok())
    }

    /// Read `EMAIL_SENDERS`, a JSON object of profile name to profile
    pub fn senders_from_vars<F>(var: F) -> Result<SenderRegistry>
    where
        F: Fn(&str) -> Option<String>,
    {
        let profiles: HashMap<String, SenderProfile> = match var("EMAIL_SENDERS") {
            Some(json) => serde_json::from_str(&json).context("Invalid EMAIL_SENDERS JSON")?,
            None => HashMap::new(),
        };
        Ok(SenderRegistry::new(profiles))
    }

    /// Load configuration from a settings file (TOML, JSON or YAML by extension)
    ///
    /// `EMAILER__*` environment variables override file values, e.g.
    /// `EMAILER__SMTP__HOST`. Sender profiles are a list of entries, each
    /// naming its profile with `profile`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_settings(load_settings(path.as_ref())?)
    }

    /// Load only the sender profiles from a settings file
    pub fn senders_from_file(path: impl AsRef<Path>) -> Result<SenderRegistry> {
        read_file_config(load_settings(path.as_ref())?)?.sender_registry()
    }

    fn from_settings(settings: ::config::Config) -> Result<Self> {
        let file = read_file_config(settings)?;
        let senders = file.sender_registry()?;

        let transport = match file.transport.to_lowercase().as_str() {
            "smtp" => TransportConfig::Smtp(
                file.smtp
                    .context("[smtp] section is required for the smtp transport")?,
            ),
            "sendgrid" => TransportConfig::SendGrid(
                file.sendgrid
                    .context("[sendgrid] section is required for the sendgrid transport")?,
            ),
            other => bail!("Unknown transport: {}", other),
        };

        Ok(Self {
            transport,
            senders,
            templates: file.templates,
            telemetry: file.telemetry,
        })
    }

    /// Check transport parameters and sender profiles
    pub fn validate(&self) -> crate::error::Result<()> {
        match &self.transport {
            TransportConfig::Smtp(smtp) => smtp.validate()?,
            TransportConfig::SendGrid(sendgrid) => sendgrid.validate()?,
        }

        self.senders.validate()
    }
}

fn load_settings(path: &Path) -> Result<::config::Config> {
    ::config::Config::builder()
        .add_source(::config::File::from(path))
        .add_source(::config::Environment::with_prefix(FILE_ENV_PREFIX).separator("__"))
        .build()
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

fn read_file_config(settings: ::config::Config) -> Result<FileConfig> {
    settings
        .try_deserialize()
        .context("Invalid configuration file")
}
