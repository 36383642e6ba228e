use std::error::Error as StdError;
use std::fmt::Debug;

use async_trait::async_trait;

/// Marker trait for subscription errors.
pub trait SubscriptionError: Debug + StdError + Send + Sync + 'static {}

/// A non-durable, at-most-once subscription to a subject filter.
///
/// Observation only: messages received before the subscription existed, or
/// while the subscriber lags, are gone. Anything that must not be missed
/// belongs on a durable consumer instead.
#[async_trait]
pub trait Subscription
where
    Self: Clone + Debug + Send + Sync + 'static,
{
    /// The error type for the subscription.
    type Error: SubscriptionError;

    /// Stops observing.
    async fn shutdown(&self);
}
