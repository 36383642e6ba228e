mod error;

pub use error::Error;

use std::error::Error as StdError;
use std::fmt::Debug;
use std::marker::PhantomData;

use async_nats::jetstream::Context;
use async_nats::jetstream::stream::{
    Config as NatsStreamConfig, Stream as NatsStreamType,
};
use async_trait::async_trait;
use bytes::Bytes;
use ticketline_messaging::consumer::Consumer;
use ticketline_messaging::consumer_handler::ConsumerHandler;
use ticketline_messaging::stream::Stream;
use ticketline_messaging::{Routed, Subject};

use crate::NatsBroker;
use crate::consumer::NatsConsumer;

/// A JetStream-backed stream bound to a subject family.
#[derive(Debug)]
pub struct NatsStream<T, D, S>
where
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
    context: Context,
    name: String,
    nats_stream: NatsStreamType,
    _marker: PhantomData<(T, D, S)>,
}

impl<T, D, S> Clone for NatsStream<T, D, S>
where
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
            context: self.context.clone(),
            name: self.name.clone(),
            nats_stream: self.nats_stream.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T, D, S> NatsStream<T, D, S>
where
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
    /// Declaratively asserts the stream and its subject bindings.
    ///
    /// Safe to call concurrently from multiple process instances: the loser
    /// of a creation race observes the existing stream and treats it as
    /// success. An existing stream with a different subject binding is
    /// reported as a warning and its definition is kept, never a panic.
    ///
    /// # Errors
    ///
    /// Returns an error if the broker is unreachable or the stream cannot
    /// be created.
    pub async fn ensure(
        broker: &NatsBroker,
        name: impl Into<String>,
        subjects: &[&str],
    ) -> Result<Self, Error<S>> {
        let name = name.into();
        let subjects: Vec<String> = subjects.iter().map(ToString::to_string).collect();

        let context = broker.jetstream().await.map_err(Error::Broker)?;

        let nats_stream = context
            .get_or_create_stream(NatsStreamConfig {
                name: name.clone(),
                subjects: subjects.clone(),
                ..Default::default()
            })
            .await
            .map_err(|e| Error::Create(e.kind()))?;

        let existing = &nats_stream.cached_info().config.subjects;
        if *existing == subjects {
            tracing::info!(stream = %name, ?subjects, "stream ready");
        } else {
            tracing::warn!(
                stream = %name,
                ?existing,
                requested = ?subjects,
                "stream already exists with a different subject binding; keeping the existing definition"
            );
        }

        Ok(Self {
            context,
            name,
            nats_stream,
            _marker: PhantomData,
        })
    }
}

#[async_trait]
impl<T, D, S> Stream<T, D, S> for NatsStream<T, D, S>
where
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
    type Error = Error<S>;

    type Consumer<X>
        = NatsConsumer<X, T, D, S>
    where
        X: ConsumerHandler<T>;

    fn name(&self) -> String {
        self.name.clone()
    }

    async fn publish(&self, event: T) -> Result<u64, Self::Error> {
        let subject = event.subject();
        let payload: Bytes = event.try_into().map_err(Error::Serialize)?;

        // The first await hands the message to the broker; the second waits
        // for the JetStream acknowledgement that it was written durably.
        let seq = self
            .context
            .publish(subject, payload)
            .await
            .map_err(|e| Error::Publish(e.kind()))?
            .await
            .map_err(|e| Error::Publish(e.kind()))?
            .sequence;

        Ok(seq)
    }

    async fn last_seq(&self) -> Result<u64, Self::Error> {
        Ok(self
            .nats_stream
            .clone()
            .info()
            .await
            .map_err(|e| Error::Info(e.kind()))?
            .state
            .last_sequence)
    }

    async fn start_consumer<X>(
        &self,
        service: &str,
        subject: &str,
        handler: X,
    ) -> Result<Self::Consumer<X>, <Self::Consumer<X> as Consumer<X, T, D, S>>::Error>
    where
        X: ConsumerHandler<T>,
    {
        let subject = Subject::new(subject)?;

        NatsConsumer::new(
            subject.consumer_name(service),
            self.nats_stream.clone(),
            subject.as_str().to_string(),
            handler,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::error::Error as TestStdError;
    use std::fmt;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde::{Deserialize, Serialize};
    use ticketline_messaging::consumer_handler::ConsumerHandlerError;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    #[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
    #[serde(tag = "subject", content = "data")]
    enum TestEvent {
        #[serde(rename = "test.created")]
        Created { id: u32 },
    }

    impl Routed for TestEvent {
        fn subject(&self) -> &'static str {
            "test.created"
        }
    }

    impl TryFrom<Bytes> for TestEvent {
        type Error = serde_json::Error;

        fn try_from(bytes: Bytes) -> Result<Self, Self::Error> {
            serde_json::from_slice(&bytes)
        }
    }

    impl TryInto<Bytes> for TestEvent {
        type Error = serde_json::Error;

        fn try_into(self) -> Result<Bytes, Self::Error> {
            Ok(Bytes::from(serde_json::to_vec(&self)?))
        }
    }

    #[derive(Clone, Debug)]
    struct TestHandlerError;

    impl fmt::Display for TestHandlerError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "test handler error")
        }
    }

    impl TestStdError for TestHandlerError {}
    impl ConsumerHandlerError for TestHandlerError {}

    #[derive(Clone, Debug)]
    struct TestHandler {
        sender: mpsc::UnboundedSender<TestEvent>,
    }

    #[async_trait]
    impl ConsumerHandler<TestEvent> for TestHandler {
        type Error = TestHandlerError;

        async fn handle(&self, event: TestEvent, _seq: u64) -> Result<(), Self::Error> {
            self.sender.send(event).map_err(|_| TestHandlerError)
        }
    }

    #[tokio::test]
    #[ignore = "requires a running nats-server with JetStream on localhost:4222"]
    async fn test_publish_and_consume() {
        let broker = NatsBroker::from_env();

        // Start from a clean slate; the stream might not exist.
        let context = broker.jetstream().await.expect("failed to connect");
        let _ = context.delete_stream("TLTEST").await;

        let stream = NatsStream::<TestEvent, serde_json::Error, serde_json::Error>::ensure(
            &broker,
            "TLTEST",
            &["test.*"],
        )
        .await
        .expect("failed to ensure stream");

        // Idempotent against re-assertion.
        let _ = NatsStream::<TestEvent, serde_json::Error, serde_json::Error>::ensure(
            &broker,
            "TLTEST",
            &["test.*"],
        )
        .await
        .expect("failed to re-ensure stream");

        let (sender, mut receiver) = mpsc::unbounded_channel();
        let consumer = stream
            .start_consumer("svc", "test.created", TestHandler { sender })
            .await
            .expect("failed to start consumer");
        assert_eq!(consumer.name(), "svc-test-created");

        let seq = stream
            .publish(TestEvent::Created { id: 42 })
            .await
            .expect("failed to publish");
        assert!(seq > 0);

        let received = timeout(Duration::from_secs(5), receiver.recv())
            .await
            .expect("timed out waiting for event")
            .expect("channel closed");
        assert_eq!(received, TestEvent::Created { id: 42 });

        consumer.shutdown().await;
        let _ = context.delete_stream("TLTEST").await;
    }
}
