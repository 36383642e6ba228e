use thiserror::Error;
use ticketline_messaging::consumer::ConsumerError;

/// Errors that can occur in a consumer.
#[derive(Debug, Error)]
pub enum Error {
    /// Consumer create error.
    #[error("failed to create consumer: {0}")]
    Create(async_nats::jetstream::stream::ConsumerErrorKind),

    /// Consumer info error.
    #[error("failed to get consumer info: {0}")]
    Info(async_nats::jetstream::context::RequestErrorKind),

    /// The filter subject is invalid.
    #[error(transparent)]
    Subject(#[from] ticketline_messaging::subject::Error),
}

impl ConsumerError for Error {}
