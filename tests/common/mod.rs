//! Common test utilities

#![allow(dead_code)]

use async_trait::async_trait;
use emailer::domain::{EmailSendResult, OutgoingEmail, SenderProfile};
use emailer::email::{DeliveryError, InMemoryTemplateRenderer, MailChannel};
use emailer::SenderRegistry;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Channel that records every delivery instead of sending it
#[derive(Default)]
pub struct RecordingChannel {
    delivered: Mutex<Vec<OutgoingEmail>>,
    attempts: AtomicUsize,
    fail_with: Option<fn() -> DeliveryError>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// A channel whose every delivery fails
    pub fn failing(error: fn() -> DeliveryError) -> Self {
        Self {
            fail_with: Some(error),
            ..Self::default()
        }
    }

    pub fn delivered(&self) -> Vec<OutgoingEmail> {
        self.delivered.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MailChannel for RecordingChannel {
    async fn deliver(&self, email: &OutgoingEmail) -> Result<EmailSendResult, DeliveryError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(error) = self.fail_with {
            return Err(error());
        }

        self.delivered.lock().unwrap().push(email.clone());
        Ok(EmailSendResult::new(Some(format!("recorded-{}", attempt))))
    }

    async fn test_connection<'a>(&self, _sender: Option<&'a SenderProfile>) -> Result<(), DeliveryError> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Registry with a single `"default"` sender `A <a@x.com>`
pub fn default_registry() -> SenderRegistry {
    [(
        "default".to_string(),
        SenderProfile::new("a@x.com").with_name("A"),
    )]
    .into_iter()
    .collect()
}

/// Renderer knowing only the `welcome` template
pub fn welcome_renderer() -> InMemoryTemplateRenderer {
    InMemoryTemplateRenderer::new().with_template("welcome", "<p>{{subject}}</p>")
}
