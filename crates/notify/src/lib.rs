//! Outbound notification contract.
//!
//! Only the contract lives here: callers compose a [`Mail`] and hand it to
//! a [`Mailer`]. Delivery failures are reported but never affect the
//! outcome of the operation that triggered them — senders log and move on.
//! Real transport is out of scope; [`ConsoleMailer`] writes to the log and
//! [`RecordingMailer`] captures mail for test assertions.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use thiserror::Error;

/// An outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mail {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

/// Errors that can occur when handing off a message.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The transport rejected the message.
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Trait for outbound mail delivery.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Hands a message to the transport.
    async fn send(&self, mail: Mail) -> Result<(), NotifyError>;
}

/// Mailer that writes messages to the log instead of sending them.
///
/// Used when no transport is configured, so reset links and order notices
/// remain visible to an operator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleMailer;

impl ConsoleMailer {
    /// Creates a new console mailer.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Mailer for ConsoleMailer {
    async fn send(&self, mail: Mail) -> Result<(), NotifyError> {
        tracing::info!(to = %mail.to, subject = %mail.subject, body = %mail.body, "outbound mail");
        Ok(())
    }
}

/// Mailer that records every message for test assertions.
#[derive(Debug, Clone, Default)]
pub struct RecordingMailer {
    sent: Arc<RwLock<Vec<Mail>>>,
}

impl RecordingMailer {
    /// Creates a new recording mailer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all messages sent so far.
    pub fn sent(&self) -> Vec<Mail> {
        self.sent.read().unwrap().clone()
    }

    /// Returns the most recent message addressed to `to`.
    pub fn last_to(&self, to: &str) -> Option<Mail> {
        self.sent
            .read()
            .unwrap()
            .iter()
            .rev()
            .find(|m| m.to == to)
            .cloned()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, mail: Mail) -> Result<(), NotifyError> {
        self.sent.write().unwrap().push(mail);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn recording_mailer_captures_messages() {
        let mailer = RecordingMailer::new();
        mailer
            .send(Mail {
                to: "a@example.com".to_string(),
                subject: "First".to_string(),
                body: "one".to_string(),
            })
            .await
            .unwrap();
        mailer
            .send(Mail {
                to: "a@example.com".to_string(),
                subject: "Second".to_string(),
                body: "two".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(mailer.sent().len(), 2);
        assert_eq!(mailer.last_to("a@example.com").unwrap().subject, "Second");
        assert!(mailer.last_to("b@example.com").is_none());
    }

    #[tokio::test]
    async fn console_mailer_accepts_messages() {
        let mailer = ConsoleMailer::new();
        let result = mailer
            .send(Mail {
                to: "a@example.com".to_string(),
                subject: "Hello".to_string(),
                body: "world".to_string(),
            })
            .await;
        assert!(result.is_ok());
    }
}
