use std::error::Error as StdError;
use std::fmt::Debug;

use async_trait::async_trait;

/// Marker trait for subscription-handler errors.
pub trait SubscriptionHandlerError: Debug + StdError + Send + Sync + 'static {}

/// Processes events for a non-durable subscription.
///
/// A failure is logged and the message is dropped; there is no
/// acknowledgement and no redelivery on this path.
#[async_trait]
pub trait SubscriptionHandler<T>
where
    Self: Clone + Debug + Send + Sync + 'static,
    T: Clone + Debug + Send + Sync + 'static,
{
    /// The error type for the handler.
    type Error: SubscriptionHandlerError;

    /// Handles one event observed on `subject`.
    async fn handle(&self, subject: String, event: T) -> Result<(), Self::Error>;
}
