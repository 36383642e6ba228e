mod error;

pub use error::Error;

use std::error::Error as StdError;
use std::fmt::Debug;
use std::marker::PhantomData;

use async_trait::async_trait;
use bytes::Bytes;
use ticketline_messaging::subscription::Subscription;
use ticketline_messaging::subscription_handler::SubscriptionHandler;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::MemoryBroker;

/// A non-durable, at-most-once subscription to a subject filter.
///
/// Messages published while the subscriber lags are dropped, matching the
/// fire-and-forget observation contract.
#[derive(Debug)]
pub struct MemorySubscription<X, T, D>
where
    X: SubscriptionHandler<T>,
    T: Clone + Debug + Send + Sync + TryFrom<Bytes, Error = D> + 'static,
    D: Debug + Send + StdError + Sync + 'static,
{
    filter: String,
    token: CancellationToken,
    _marker: PhantomData<(T, X, D)>,
}

impl<X, T, D> Clone for MemorySubscription<X, T, D>
where
    X: SubscriptionHandler<T>,
    T: Clone + Debug + Send + Sync + TryFrom<Bytes, Error = D> + 'static,
    D: Debug + Send + StdError + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            filter: self.filter.clone(),
            token: self.token.clone(),
            _marker: PhantomData,
        }
    }
}

impl<X, T, D> MemorySubscription<X, T, D>
where
    X: SubscriptionHandler<T>,
    T: Clone + Debug + Send + Sync + TryFrom<Bytes, Error = D> + 'static,
    D: Debug + Send + StdError + Sync + 'static,
{
    /// Starts observing `filter` (wildcards allowed) on the broker.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyFilter`] if `filter` is empty.
    pub async fn new(broker: &MemoryBroker, filter: &str, handler: X) -> Result<Self, Error> {
        if filter.is_empty() {
            return Err(Error::EmptyFilter);
        }

        let receiver = broker.tap(filter).await;
        let token = CancellationToken::new();

        tokio::spawn(Self::process_messages(
            filter.to_string(),
            receiver,
            handler,
            token.clone(),
        ));

        Ok(Self {
            filter: filter.to_string(),
            token,
            _marker: PhantomData,
        })
    }

    /// The filter this subscription observes.
    #[must_use]
    pub fn filter(&self) -> &str {
        &self.filter
    }

    async fn process_messages(
        filter: String,
        mut receiver: broadcast::Receiver<(String, Bytes)>,
        handler: X,
        token: CancellationToken,
    ) {
        loop {
            tokio::select! {
                () = token.cancelled() => return,
                received = receiver.recv() => match received {
                    Err(broadcast::error::RecvError::Closed) => return,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(%filter, skipped, "subscription lagged; messages dropped");
                    }
                    Ok((subject, payload)) => match T::try_from(payload) {
                        Err(error) => {
                            tracing::warn!(%filter, %subject, %error, "dropping message with unrecognized shape");
                        }
                        Ok(event) => {
                            if let Err(error) = handler.handle(subject, event).await {
                                tracing::warn!(%filter, %error, "subscription handler failed; message dropped");
                            }
                        }
                    },
                },
            }
        }
    }
}

#[async_trait]
impl<X, T, D> Subscription for MemorySubscription<X, T, D>
where
    X: SubscriptionHandler<T>,
    T: Clone + Debug + Send + Sync + TryFrom<Bytes, Error = D> + 'static,
    D: Debug + Send + StdError + Sync + 'static,
{
    type Error = Error;

    async fn shutdown(&self) {
        self.token.cancel();
    }
}
