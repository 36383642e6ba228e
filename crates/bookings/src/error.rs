use thiserror::Error;
use ticketline_messaging::consumer_handler::ConsumerHandlerError;
use ticketline_messaging::stream::StreamError;
use ticketline_store::StoreError;
use uuid::Uuid;

/// Errors that can occur on the replica path.
#[derive(Debug, Error)]
pub enum ReplicaError<SE>
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

impl<SE> ConsumerHandlerError for ReplicaError<SE> where SE: StoreError {}

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

    /// Errors passed through from the mirrored event replica.
    #[error(transparent)]
    Replica(ReplicaError<SE>),

    /// The stored entity could not be (de)serialized.
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// No booking with the requested id.
    #[error("booking {0} not found")]
    NotFound(Uuid),

    /// The referenced listing is not (yet) known locally. Nothing was
    /// committed and nothing was published.
    #[error("event {0} is not known to the bookings service")]
    UnknownEvent(Uuid),

    /// Not enough remaining capacity. Nothing was committed and nothing
    /// was published.
    #[error("requested {requested} tickets but only {available} are available")]
    CapacityExceeded {
        /// Tickets requested.
        requested: u32,
        /// Tickets remaining on the listing.
        available: u32,
    },
}

impl<SE, STE> ConsumerHandlerError for Error<SE, STE>
where
    SE: StoreError,
    STE: StreamError,
{
}
