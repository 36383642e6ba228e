use std::error::Error as StdError;
use std::fmt::Debug;

use thiserror::Error;
use ticketline_messaging::stream::StreamError;

/// Error type for NATS stream operations.
#[derive(Debug, Error)]
pub enum Error<S>
where
    S: Debug + Send + StdError + Sync + 'static,
{
    /// Errors passed through from the broker connection.
    #[error(transparent)]
    Broker(crate::broker::Error),

    /// Stream create error.
    #[error("failed to create stream: {0}")]
    Create(async_nats::jetstream::context::CreateStreamErrorKind),

    /// Stream info error.
    #[error("failed to get stream info: {0}")]
    Info(async_nats::jetstream::context::RequestErrorKind),

    /// Publish error.
    #[error("failed to publish: {0}")]
    Publish(async_nats::jetstream::context::PublishErrorKind),

    /// The event could not be encoded.
    #[error("failed to encode event: {0}")]
    Serialize(S),
}

impl<S> StreamError for Error<S> where S: Debug + Send + StdError + Sync + 'static {}
