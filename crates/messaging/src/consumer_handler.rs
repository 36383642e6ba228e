use std::error::Error as StdError;
use std::fmt::Debug;

use async_trait::async_trait;

/// Marker trait for consumer-handler errors.
pub trait ConsumerHandlerError: Debug + StdError + Send + Sync + 'static {}

/// Processes decoded events for a durable consumer.
///
/// Returning `Ok` acknowledges the message; returning `Err` leaves it
/// unacknowledged, and the broker's redelivery policy is the retry
/// mechanism. Under at-least-once delivery every handler must be
/// idempotent, and outcomes that are merely redundant (a create for an id
/// that already exists, an update or delete for an id never seen locally)
/// must be `Ok`: the effect is already present or absent, and retrying
/// cannot improve on that.
#[async_trait]
pub trait ConsumerHandler<T>
where
    Self: Clone + Debug + Send + Sync + 'static,
    T: Clone + Debug + Send + Sync + 'static,
{
    /// The error type for the handler.
    type Error: ConsumerHandlerError;

    /// Handles one event at the given stream sequence.
    async fn handle(&self, event: T, stream_sequence: u64) -> Result<(), Self::Error>;
}
