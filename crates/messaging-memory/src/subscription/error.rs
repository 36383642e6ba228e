use thiserror::Error;
use ticketline_messaging::subscription::SubscriptionError;

/// Errors that can occur in a subscription.
#[derive(Debug, Error)]
pub enum Error {
    /// The subject filter is empty.
    #[error("empty subject filter")]
    EmptyFilter,
}

impl SubscriptionError for Error {}
