use std::error::Error as StdError;
use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

/// Marker trait for mailer errors.
pub trait MailerError: Debug + StdError + Send + Sync + 'static {}

/// A rendered outbound email.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Email {
    /// Recipient address.
    pub to: String,

    /// Subject line.
    pub subject: String,

    /// Rendered body.
    pub body: String,
}

/// The outbound-mail boundary. SMTP delivery of a rendered message is an
/// external collaborator; the core only hands it the finished email.
#[async_trait]
pub trait Mailer
where
    Self: Clone + Debug + Send + Sync + 'static,
{
    /// The error type for the mailer.
    type Error: MailerError;

    /// Delivers one rendered email.
    async fn send(&self, email: Email) -> Result<(), Self::Error>;
}

/// Error type for the built-in mailers, which cannot fail.
#[derive(Clone, Debug, thiserror::Error)]
#[error("mailer error")]
pub struct Error;

impl MailerError for Error {}

/// A mailer that logs instead of delivering, for local development.
#[derive(Clone, Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    type Error = Error;

    async fn send(&self, email: Email) -> Result<(), Self::Error> {
        tracing::info!(to = %email.to, subject = %email.subject, "email sent");
        tracing::debug!(body = %email.body);
        Ok(())
    }
}

/// A mailer that records every email, for tests.
#[derive(Clone, Debug, Default)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<Email>>>,
}

impl RecordingMailer {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything sent so far.
    pub async fn sent(&self) -> Vec<Email> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    type Error = Error;

    async fn send(&self, email: Email) -> Result<(), Self::Error> {
        self.sent.lock().await.push(email);
        Ok(())
    }
}
