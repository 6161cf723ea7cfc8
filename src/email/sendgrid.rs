//! SendGrid v3 API mail channel
//!
//! Sends through `POST /v3/mail/send`. The API key is global to the channel;
//! sender profiles only contribute the from address and display name.

use super::channel::{DeliveryError, MailChannel};
use crate::domain::{EmailSendResult, OutgoingEmail, SendGridConfig, SenderProfile};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;
use url::Url;

const MESSAGE_ID_HEADER: &str = "x-message-id";

/// Channel backed by the SendGrid HTTP API
#[derive(Clone)]
pub struct SendGridChannel {
    http_client: Client,
    api_key: String,
    send_url: Url,
    scopes_url: Url,
}

#[derive(Debug, Serialize)]
struct MailSendRequest<'a> {
    personalizations: Vec<Personalization<'a>>,
    from: Address<'a>,
    subject: &'a str,
    content: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Personalization<'a> {
    to: Vec<Address<'a>>,
}

#[derive(Debug, Serialize)]
struct Address<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    content_type: &'a str,
    value: &'a str,
}

impl<'a> MailSendRequest<'a> {
    fn from_email(email: &'a OutgoingEmail) -> Self {
        Self {
            personalizations: vec![Personalization {
                to: vec![Address {
                    email: &email.to,
                    name: None,
                }],
            }],
            from: Address {
                email: &email.from.address,
                name: email.from.name.as_deref().filter(|n| !n.is_empty()),
            },
            subject: &email.subject,
            content: vec![Content {
                content_type: "text/html",
                value: &email.html_body,
            }],
        }
    }
}

impl SendGridChannel {
    /// Create a new SendGrid channel from configuration
    pub fn from_config(config: &SendGridConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(AppError::Config("SendGrid API key is empty".to_string()));
        }

        let send_url = api_url(&config.base_url, "v3/mail/send")?;
        let scopes_url = api_url(&config.base_url, "v3/scopes")?;

        let mut builder = Client::builder();
        if let Some(timeout_ms) = config.timeout_ms {
            builder = builder.timeout(Duration::from_millis(timeout_ms));
        }
        let http_client = builder
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            api_key: config.api_key.clone(),
            send_url,
            scopes_url,
        })
    }

    async fn error_from_response(response: reqwest::Response) -> DeliveryError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                DeliveryError::AuthenticationFailed(format!("{} - {}", status, body))
            }
            StatusCode::TOO_MANY_REQUESTS => DeliveryError::RateLimited,
            _ => DeliveryError::Rejected(format!("{} - {}", status, body)),
        }
    }
}

/// Resolve `endpoint` below `base_url`, keeping any path prefix of the base
fn api_url(base_url: &str, endpoint: &str) -> Result<Url> {
    let mut base = base_url.to_string();
    if !base.ends_with('/') {
        base.push('/');
    }

    Url::parse(&base)
        .and_then(|url| url.join(endpoint))
        .map_err(|e| AppError::Config(format!("Invalid SendGrid base URL: {}", e)))
}

fn connection_error(e: reqwest::Error) -> DeliveryError {
    DeliveryError::Connection(e.to_string())
}

#[async_trait]
impl MailChannel for SendGridChannel {
    async fn deliver(
        &self,
        email: &OutgoingEmail,
    ) -> std::result::Result<EmailSendResult, DeliveryError> {
        let request = MailSendRequest::from_email(email);

        let response = self
            .http_client
            .post(self.send_url.clone())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(connection_error)?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let message_id = response
            .headers()
            .get(MESSAGE_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        Ok(EmailSendResult::new(message_id))
    }

    async fn test_connection<'a>(
        &self,
        _sender: Option<&'a SenderProfile>,
    ) -> std::result::Result<(), DeliveryError> {
        let response = self
            .http_client
            .get(self.scopes_url.clone())
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(connection_error)?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "sendgrid"
    }
}
