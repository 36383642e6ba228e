mod error;

pub use error::Error;

use std::error::Error as StdError;
use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use ticketline_messaging::Routed;
use ticketline_messaging::consumer::Consumer;
use ticketline_messaging::consumer_handler::ConsumerHandler;
use tokio::sync::Notify;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::MemoryBroker;

/// How long a failed message rests before redelivery. Kept short so
/// redelivery converges quickly in tests.
const REDELIVERY_DELAY: Duration = Duration::from_millis(25);

/// A durable consumer over an in-memory stream.
///
/// The cursor lives in the broker, keyed by the consumer name, so a new
/// consumer under the same name resumes where its predecessor stopped and
/// unacknowledged messages are redelivered.
#[derive(Debug)]
pub struct MemoryConsumer<X, T, D, S>
where
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
    broker: MemoryBroker,
    name: String,
    stream_name: String,
    token: CancellationToken,
    _marker: PhantomData<(T, X, D, S)>,
}

impl<X, T, D, S> Clone for MemoryConsumer<X, T, D, S>
where
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
    fn clone(&self) -> Self {
        Self {
            broker: self.broker.clone(),
            name: self.name.clone(),
            stream_name: self.stream_name.clone(),
            token: self.token.clone(),
            _marker: PhantomData,
        }
    }
}

impl<X, T, D, S> MemoryConsumer<X, T, D, S>
where
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
    pub(crate) async fn new(
        broker: MemoryBroker,
        stream_name: String,
        name: String,
        filter: String,
        handler: X,
    ) -> Result<Self, Error> {
        let notify = broker
            .ensure_consumer(&stream_name, &name, &filter)
            .await
            .map_err(|unknown| Error::UnknownStream(unknown.0))?;

        let token = CancellationToken::new();

        tokio::spawn(Self::process_messages(
            broker.clone(),
            stream_name.clone(),
            name.clone(),
            handler,
            notify,
            token.clone(),
        ));

        Ok(Self {
            broker,
            name,
            stream_name,
            token,
            _marker: PhantomData,
        })
    }

    /// Processes messages one at a time, in stream order. A message is
    /// acknowledged after the handler succeeds; a failed message is retried
    /// after [`REDELIVERY_DELAY`] and nothing past it is delivered until it
    /// is acknowledged.
    async fn process_messages(
        broker: MemoryBroker,
        stream_name: String,
        name: String,
        handler: X,
        notify: Arc<Notify>,
        token: CancellationToken,
    ) {
        loop {
            // Register for a wakeup before checking, so an append landing
            // between the check and the await is not lost.
            let notified = notify.notified();

            let Some((seq, payload)) = broker.next_pending(&stream_name, &name).await else {
                tokio::select! {
                    () = token.cancelled() => return,
                    () = notified => continue,
                }
            };

            match T::try_from(payload) {
                Err(error) => {
                    tracing::warn!(
                        consumer = %name,
                        %seq,
                        %error,
                        "dropping message with unrecognized shape"
                    );
                    broker.ack(&stream_name, &name, seq).await;
                }
                Ok(event) => match handler.handle(event, seq).await {
                    Ok(()) => broker.ack(&stream_name, &name, seq).await,
                    Err(error) => {
                        tracing::error!(
                            consumer = %name,
                            %seq,
                            %error,
                            "handler failed; leaving message unacknowledged for redelivery"
                        );
                        tokio::select! {
                            () = token.cancelled() => return,
                            () = sleep(REDELIVERY_DELAY) => {}
                        }
                    }
                },
            }

            if token.is_cancelled() {
                return;
            }
        }
    }
}

#[async_trait]
impl<X, T, D, S> Consumer<X, T, D, S> for MemoryConsumer<X, T, D, S>
where
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
    type Error = Error;

    fn name(&self) -> String {
        self.name.clone()
    }

    async fn last_seq(&self) -> Result<u64, Self::Error> {
        Ok(self
            .broker
            .consumer_cursor(&self.stream_name, &self.name)
            .await)
    }

    async fn shutdown(&self) {
        self.token.cancel();
    }
}
