use thiserror::Error;
use ticketline_messaging::stream::StreamError;
use ticketline_store::StoreError;
use uuid::Uuid;

/// Errors that can occur in this crate.
#[derive(Debug, Error)]
pub enum Error<SE, STE>
where
    SE: StoreError,
    STE: StreamError,
{
    /// Errors passed through from the underlying store.
    #[error(transparent)]
    Store(SE),

    /// Errors passed through from the event stream.
    #[error(transparent)]
    Stream(STE),

    /// The stored entity could not be (de)serialized.
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// No user with the requested id.
    #[error("user {0} not found")]
    NotFound(Uuid),
}
