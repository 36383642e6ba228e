use std::error::Error as StdError;
use std::fmt::Debug;

use async_trait::async_trait;
use bytes::Bytes;

use crate::Routed;
use crate::consumer_handler::ConsumerHandler;

/// Marker trait for consumer errors.
pub trait ConsumerError: Debug + StdError + Send + Sync + 'static {}

/// A named, durable cursor over a stream with explicit acknowledgement.
///
/// The cursor advances only on acknowledgement, never on mere receipt:
/// any message not acknowledged (handler failure, crash, restart) is
/// redelivered by the broker. The name is the cursor identity and must be
/// stable across restarts.
#[async_trait]
pub trait Consumer<X, T, D, S>
where
    Self: Clone + Debug + Send + Sync + 'static,
    X: ConsumerHandler<T>,
    T: Routed
        + Clone
        + Debug
        + Send
        + Sync
        + TryFrom<Bytes, Error = D>
        + TryInto<Bytes, Error = S>
        + 'static,
    D: Debug + Send + StdError + Sync + 'static,
    S: Debug + Send + StdError + Sync + 'static,
{
    /// The error type for the consumer.
    type Error: ConsumerError;

    /// The durable name of the consumer.
    fn name(&self) -> String;

    /// The last stream sequence acknowledged by this consumer.
    async fn last_seq(&self) -> Result<u64, Self::Error>;

    /// Stops the consumer loop.
    ///
    /// In production the loop runs for the lifetime of the process; this
    /// exists for tests and orderly shutdown. Unacknowledged messages are
    /// redelivered to the next consumer with the same name.
    async fn shutdown(&self);
}
