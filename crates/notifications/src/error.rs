use thiserror::Error;
use ticketline_messaging::consumer_handler::ConsumerHandlerError;

use crate::mailer::MailerError;

/// Errors that can occur in this crate.
#[derive(Debug, Error)]
pub enum Error<ME>
where
    ME: MailerError,
{
    /// Errors passed through from the mailer. These fail the handler, so
    /// the message stays unacknowledged and delivery is retried.
    #[error(transparent)]
    Mailer(ME),
}

impl<ME> ConsumerHandlerError for Error<ME> where ME: MailerError {}
