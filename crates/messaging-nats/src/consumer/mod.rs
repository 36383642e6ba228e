mod error;

pub use error::Error;

use std::error::Error as StdError;
use std::fmt::Debug;
use std::marker::PhantomData;
use std::time::Duration;

use async_nats::jetstream::consumer::pull::Config as NatsConsumerConfig;
use async_nats::jetstream::consumer::{AckPolicy, Consumer as NatsConsumerType};
use async_nats::jetstream::stream::Stream as NatsStreamType;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use ticketline_messaging::Routed;
use ticketline_messaging::consumer::Consumer;
use ticketline_messaging::consumer_handler::ConsumerHandler;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// How long to wait before re-acquiring the message stream after a
/// transport error.
const REACQUIRE_DELAY: Duration = Duration::from_secs(1);

/// A durable, explicit-acknowledgement pull consumer.
///
/// `max_ack_pending` is pinned to 1 so messages are handled strictly one
/// at a time in stream order: a failed message blocks everything behind it
/// until the broker redelivers it and the handler succeeds. This is what
/// gives per-subject-per-service FIFO without extra locking.
#[derive(Debug)]
pub struct NatsConsumer<X, T, D, S>
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
    name: String,
    nats_consumer: NatsConsumerType<NatsConsumerConfig>,
    token: CancellationToken,
    _marker: PhantomData<(T, X, D, S)>,
}

impl<X, T, D, S> Clone for NatsConsumer<X, T, D, S>
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
            name: self.name.clone(),
            nats_consumer: self.nats_consumer.clone(),
            token: self.token.clone(),
            _marker: PhantomData,
        }
    }
}

impl<X, T, D, S> NatsConsumer<X, T, D, S>
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
        name: String,
        nats_stream: NatsStreamType,
        filter_subject: String,
        handler: X,
    ) -> Result<Self, Error> {
        // get_or_create is the race-tolerant provisioning primitive: the
        // loser of a concurrent creation race observes the existing
        // consumer, cursor intact, and treats it as success.
        let nats_consumer = nats_stream
            .get_or_create_consumer(
                &name,
                NatsConsumerConfig {
                    durable_name: Some(name.clone()),
                    filter_subject: filter_subject.clone(),
                    ack_policy: AckPolicy::Explicit,
                    max_ack_pending: 1,
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| Error::Create(e.kind()))?;

        tracing::info!(consumer = %name, filter = %filter_subject, "durable consumer ready");

        let token = CancellationToken::new();

        tokio::spawn(Self::process_messages(
            name.clone(),
            nats_consumer.clone(),
            handler,
            token.clone(),
        ));

        Ok(Self {
            name,
            nats_consumer,
            token,
            _marker: PhantomData,
        })
    }

    /// Pulls messages for the life of the process: decode, handle, and
    /// acknowledge only after the handler succeeds. A failed handler leaves
    /// the message unacknowledged; broker redelivery is the retry policy.
    async fn process_messages(
        name: String,
        nats_consumer: NatsConsumerType<NatsConsumerConfig>,
        handler: X,
        token: CancellationToken,
    ) {
        loop {
            let mut messages = match nats_consumer.messages().await {
                Ok(messages) => messages,
                Err(error) => {
                    tracing::error!(consumer = %name, %error, "failed to acquire message stream");
                    tokio::select! {
                        () = token.cancelled() => return,
                        () = sleep(REACQUIRE_DELAY) => continue,
                    }
                }
            };

            loop {
                let received = tokio::select! {
                    () = token.cancelled() => return,
                    received = messages.next() => received,
                };

                let Some(received) = received else {
                    // Stream ended; re-acquire.
                    break;
                };

                let message = match received {
                    Ok(message) => message,
                    Err(error) => {
                        tracing::error!(consumer = %name, %error, "failed to receive message");
                        break;
                    }
                };

                let seq = message.info().map_or(0, |info| info.stream_sequence);

                match T::try_from(message.payload.clone()) {
                    Err(error) => {
                        tracing::warn!(
                            consumer = %name,
                            %seq,
                            %error,
                            "dropping message with unrecognized shape"
                        );
                        if let Err(error) = message.ack().await {
                            tracing::warn!(consumer = %name, %seq, %error, "failed to acknowledge");
                        }
                    }
                    Ok(event) => match handler.handle(event, seq).await {
                        Ok(()) => {
                            if let Err(error) = message.ack().await {
                                tracing::warn!(
                                    consumer = %name,
                                    %seq,
                                    %error,
                                    "failed to acknowledge; the message will be redelivered"
                                );
                            }
                        }
                        Err(error) => {
                            tracing::error!(
                                consumer = %name,
                                %seq,
                                %error,
                                "handler failed; leaving message unacknowledged for redelivery"
                            );
                        }
                    },
                }
            }
        }
    }
}

#[async_trait]
impl<X, T, D, S> Consumer<X, T, D, S> for NatsConsumer<X, T, D, S>
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
            .nats_consumer
            .clone()
            .info()
            .await
            .map_err(|e| Error::Info(e.kind()))?
            .ack_floor
            .stream_sequence)
    }

    async fn shutdown(&self) {
        self.token.cancel();
    }
}
