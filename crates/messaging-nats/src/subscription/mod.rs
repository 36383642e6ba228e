mod error;

pub use error::Error;

use std::error::Error as StdError;
use std::fmt::Debug;
use std::marker::PhantomData;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use ticketline_messaging::subscription::Subscription;
use ticketline_messaging::subscription_handler::SubscriptionHandler;
use tokio_util::sync::CancellationToken;

use crate::NatsBroker;

/// A non-durable, at-most-once subscription over core NATS.
///
/// Nothing is persisted and nothing is acknowledged: messages published
/// while the subscriber is away are gone. Observation only.
#[derive(Debug)]
pub struct NatsSubscription<X, T, D>
where
    X: SubscriptionHandler<T>,
    T: Clone + Debug + Send + Sync + TryFrom<Bytes, Error = D> + 'static,
    D: Debug + Send + StdError + Sync + 'static,
{
    filter: String,
    token: CancellationToken,
    _marker: PhantomData<(T, X, D)>,
}

impl<X, T, D> Clone for NatsSubscription<X, T, D>
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

impl<X, T, D> NatsSubscription<X, T, D>
where
    X: SubscriptionHandler<T>,
    T: Clone + Debug + Send + Sync + TryFrom<Bytes, Error = D> + 'static,
    D: Debug + Send + StdError + Sync + 'static,
{
    /// Starts observing `filter` (wildcards allowed) on the broker.
    ///
    /// # Errors
    ///
    /// Returns an error if the broker is unreachable or the subscribe
    /// fails.
    pub async fn new(broker: &NatsBroker, filter: &str, handler: X) -> Result<Self, Error> {
        let client = broker.client().await.map_err(Error::Broker)?;
        let mut subscriber = client
            .subscribe(filter.to_string())
            .await
            .map_err(Error::Subscribe)?;

        let token = CancellationToken::new();

        {
            let filter = filter.to_string();
            let token = token.clone();
            tokio::spawn(async move {
                loop {
                    let message = tokio::select! {
                        () = token.cancelled() => return,
                        message = subscriber.next() => message,
                    };

                    let Some(message) = message else {
                        return;
                    };

                    let subject = message.subject.to_string();
                    match T::try_from(message.payload) {
                        Err(error) => {
                            tracing::warn!(%filter, %subject, %error, "dropping message with unrecognized shape");
                        }
                        Ok(event) => {
                            if let Err(error) = handler.handle(subject, event).await {
                                tracing::warn!(%filter, %error, "subscription handler failed; message dropped");
                            }
                        }
                    }
                }
            });
        }

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
}

#[async_trait]
impl<X, T, D> Subscription for NatsSubscription<X, T, D>
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
