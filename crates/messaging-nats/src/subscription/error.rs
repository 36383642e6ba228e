use thiserror::Error;
use ticketline_messaging::subscription::SubscriptionError;

/// Errors that can occur in a subscription.
#[derive(Debug, Error)]
pub enum Error {
    /// Errors passed through from the broker connection.
    #[error(transparent)]
    Broker(crate::broker::Error),

    /// Subscribe error.
    #[error("failed to subscribe")]
    Subscribe(#[source] async_nats::SubscribeError),
}

impl SubscriptionError for Error {}
