use thiserror::Error;
use ticketline_messaging::consumer_handler::ConsumerHandlerError;
use ticketline_store::StoreError;

/// Errors that can occur in this crate.
#[derive(Debug, Error)]
pub enum Error<SE>
where
    SE: StoreError,
{
    /// Errors passed through from the replica store. These fail the
    /// handler, leaving the message unacknowledged for redelivery.
    #[error(transparent)]
    Store(SE),

    /// The stored entity could not be (de)serialized.
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

impl<SE> ConsumerHandlerError for Error<SE> where SE: StoreError {}
