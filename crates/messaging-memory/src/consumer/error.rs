use thiserror::Error;
use ticketline_messaging::consumer::ConsumerError;

/// Errors that can occur in a consumer.
#[derive(Debug, Error)]
pub enum Error {
    /// The filter subject is invalid.
    #[error(transparent)]
    Subject(#[from] ticketline_messaging::subject::Error),

    /// The stream has not been provisioned.
    #[error("stream {0} does not exist")]
    UnknownStream(String),
}

impl ConsumerError for Error {}
