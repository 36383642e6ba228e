//! In-process implementation of the messaging layer.
//!
//! The broker keeps streams, durable-consumer cursors, and non-durable taps
//! in shared process memory while preserving the semantics the platform
//! relies on: append-only per-stream ordering, explicit acknowledgement,
//! redelivery of unacknowledged messages, and cursor survival across
//! consumer restarts (within the process). Tests and local runs exercise
//! the same contracts the NATS implementation provides.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Durable consumers over in-memory streams.
pub mod consumer;

/// In-memory streams.
pub mod stream;

/// Non-durable, at-most-once subscriptions.
pub mod subscription;

pub use consumer::MemoryConsumer;
pub use stream::MemoryStream;
pub use subscription::MemorySubscription;

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use ticketline_messaging::subject::matches_filter;
use tokio::sync::{Mutex, Notify, broadcast};

const TAP_CAPACITY: usize = 128;

#[derive(Debug)]
struct ConsumerState {
    filter: String,
    /// Next stream index to inspect. Advances only on acknowledgement
    /// (or past messages the filter excludes).
    cursor: usize,
}

#[derive(Debug)]
struct StreamState {
    subjects: Vec<String>,
    messages: Vec<(String, Bytes)>,
    consumers: HashMap<String, ConsumerState>,
    notify: Arc<Notify>,
}

#[derive(Debug)]
struct Tap {
    filter: String,
    sender: broadcast::Sender<(String, Bytes)>,
}

#[derive(Debug, Default)]
struct BrokerState {
    streams: HashMap<String, StreamState>,
    taps: Vec<Tap>,
}

/// An in-process message broker.
///
/// One instance stands in for the process's single broker connection:
/// created once, cloned into every stream, consumer, and subscription that
/// needs it, and safe for concurrent use by all of them.
#[derive(Clone, Debug, Default)]
pub struct MemoryBroker {
    state: Arc<Mutex<BrokerState>>,
}

impl MemoryBroker {
    /// Creates a new broker with no streams.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declaratively asserts a stream and its subject bindings.
    ///
    /// Creating an existing stream is a no-op. A conflicting definition is
    /// reported as a warning and the existing definition is kept.
    pub async fn ensure_stream(&self, name: &str, subjects: &[&str]) {
        let mut state = self.state.lock().await;
        if let Some(existing) = state.streams.get(name) {
            if existing.subjects != subjects {
                tracing::warn!(
                    stream = name,
                    existing = ?existing.subjects,
                    requested = ?subjects,
                    "stream already exists with a different subject binding; keeping the existing definition"
                );
            } else {
                tracing::debug!(stream = name, "stream already exists");
            }
            return;
        }

        state.streams.insert(
            name.to_string(),
            StreamState {
                subjects: subjects.iter().map(ToString::to_string).collect(),
                messages: Vec::new(),
                consumers: HashMap::new(),
                notify: Arc::new(Notify::new()),
            },
        );
        tracing::info!(stream = name, ?subjects, "stream created");
    }

    async fn append(
        &self,
        stream_name: &str,
        subject: &str,
        payload: Bytes,
    ) -> Result<u64, AppendError> {
        let mut state = self.state.lock().await;

        let stream = state
            .streams
            .get_mut(stream_name)
            .ok_or_else(|| AppendError::UnknownStream(stream_name.to_string()))?;

        if !stream
            .subjects
            .iter()
            .any(|filter| matches_filter(filter, subject))
        {
            return Err(AppendError::SubjectNotBound {
                stream: stream_name.to_string(),
                subject: subject.to_string(),
            });
        }

        stream.messages.push((subject.to_string(), payload.clone()));
        let seq = stream.messages.len() as u64;
        stream.notify.notify_waiters();

        state.taps.retain(|tap| tap.sender.receiver_count() > 0);
        for tap in &state.taps {
            if matches_filter(&tap.filter, subject) {
                let _ = tap.sender.send((subject.to_string(), payload.clone()));
            }
        }

        Ok(seq)
    }

    /// Asserts a durable consumer on a stream and returns the stream's
    /// wakeup handle. Idempotent: an existing consumer keeps its cursor
    /// (and, on a filter conflict, its filter).
    async fn ensure_consumer(
        &self,
        stream_name: &str,
        consumer_name: &str,
        filter: &str,
    ) -> Result<Arc<Notify>, UnknownStream> {
        let mut state = self.state.lock().await;
        let stream = state
            .streams
            .get_mut(stream_name)
            .ok_or_else(|| UnknownStream(stream_name.to_string()))?;

        match stream.consumers.get(consumer_name) {
            Some(existing) if existing.filter != filter => {
                tracing::warn!(
                    consumer = consumer_name,
                    existing = %existing.filter,
                    requested = filter,
                    "consumer already exists with a different filter; keeping the existing one"
                );
            }
            Some(_) => {
                tracing::debug!(consumer = consumer_name, "consumer already exists");
            }
            None => {
                stream.consumers.insert(
                    consumer_name.to_string(),
                    ConsumerState {
                        filter: filter.to_string(),
                        cursor: 0,
                    },
                );
                tracing::info!(consumer = consumer_name, filter, "consumer created");
            }
        }

        Ok(stream.notify.clone())
    }

    /// The next unacknowledged message matching the consumer's filter, if
    /// any. Positions the filter excludes are skipped permanently.
    async fn next_pending(
        &self,
        stream_name: &str,
        consumer_name: &str,
    ) -> Option<(u64, Bytes)> {
        let mut state = self.state.lock().await;
        let stream = state.streams.get_mut(stream_name)?;
        let consumer = stream.consumers.get_mut(consumer_name)?;

        while consumer.cursor < stream.messages.len() {
            let (subject, payload) = &stream.messages[consumer.cursor];
            if matches_filter(&consumer.filter, subject) {
                return Some(((consumer.cursor + 1) as u64, payload.clone()));
            }
            consumer.cursor += 1;
        }

        None
    }

    /// Acknowledges the message at `seq`, advancing the cursor past it.
    async fn ack(&self, stream_name: &str, consumer_name: &str, seq: u64) {
        let mut state = self.state.lock().await;
        if let Some(stream) = state.streams.get_mut(stream_name) {
            if let Some(consumer) = stream.consumers.get_mut(consumer_name) {
                consumer.cursor = consumer.cursor.max(seq as usize);
            }
        }
    }

    async fn consumer_cursor(&self, stream_name: &str, consumer_name: &str) -> u64 {
        let state = self.state.lock().await;
        state
            .streams
            .get(stream_name)
            .and_then(|stream| stream.consumers.get(consumer_name))
            .map_or(0, |consumer| consumer.cursor as u64)
    }

    async fn stream_len(&self, stream_name: &str) -> Option<u64> {
        let state = self.state.lock().await;
        state
            .streams
            .get(stream_name)
            .map(|stream| stream.messages.len() as u64)
    }

    async fn tap(&self, filter: &str) -> broadcast::Receiver<(String, Bytes)> {
        let (sender, receiver) = broadcast::channel(TAP_CAPACITY);
        let mut state = self.state.lock().await;
        state.taps.push(Tap {
            filter: filter.to_string(),
            sender,
        });
        receiver
    }
}

#[derive(Debug)]
enum AppendError {
    UnknownStream(String),
    SubjectNotBound { stream: String, subject: String },
}

#[derive(Debug)]
struct UnknownStream(String);

#[cfg(test)]
mod tests {
    use super::*;

    use std::error::Error as StdError;
    use std::fmt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use serde::{Deserialize, Serialize};
    use ticketline_messaging::Routed;
    use ticketline_messaging::consumer::Consumer;
    use ticketline_messaging::consumer_handler::{ConsumerHandler, ConsumerHandlerError};
    use ticketline_messaging::stream::Stream;
    use ticketline_messaging::subscription_handler::{
        SubscriptionHandler, SubscriptionHandlerError,
    };
    use tokio::sync::mpsc;
    use tokio::time::{sleep, timeout};

    #[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
    #[serde(tag = "subject", content = "data")]
    enum TestEvent {
        #[serde(rename = "test.created")]
        Created { id: u32 },
        #[serde(rename = "test.deleted")]
        Deleted { id: u32 },
    }

    impl Routed for TestEvent {
        fn subject(&self) -> &'static str {
            match self {
                Self::Created { .. } => "test.created",
                Self::Deleted { .. } => "test.deleted",
            }
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

    impl StdError for TestHandlerError {}
    impl ConsumerHandlerError for TestHandlerError {}
    impl SubscriptionHandlerError for TestHandlerError {}

    #[derive(Clone, Debug)]
    struct RecordingHandler {
        sender: mpsc::UnboundedSender<TestEvent>,
    }

    #[async_trait]
    impl ConsumerHandler<TestEvent> for RecordingHandler {
        type Error = TestHandlerError;

        async fn handle(&self, event: TestEvent, _seq: u64) -> Result<(), Self::Error> {
            self.sender.send(event).map_err(|_| TestHandlerError)
        }
    }

    /// Fails the first `failures` deliveries, then records.
    #[derive(Clone, Debug)]
    struct FlakyHandler {
        failures: usize,
        attempts: Arc<AtomicUsize>,
        sender: mpsc::UnboundedSender<TestEvent>,
    }

    #[async_trait]
    impl ConsumerHandler<TestEvent> for FlakyHandler {
        type Error = TestHandlerError;

        async fn handle(&self, event: TestEvent, _seq: u64) -> Result<(), Self::Error> {
            if self.attempts.fetch_add(1, Ordering::SeqCst) < self.failures {
                return Err(TestHandlerError);
            }
            self.sender.send(event).map_err(|_| TestHandlerError)
        }
    }

    #[derive(Clone, Debug)]
    struct TapHandler {
        sender: mpsc::UnboundedSender<(String, TestEvent)>,
    }

    #[async_trait]
    impl SubscriptionHandler<TestEvent> for TapHandler {
        type Error = TestHandlerError;

        async fn handle(&self, subject: String, event: TestEvent) -> Result<(), Self::Error> {
            self.sender.send((subject, event)).map_err(|_| TestHandlerError)
        }
    }

    fn recording() -> (RecordingHandler, mpsc::UnboundedReceiver<TestEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (RecordingHandler { sender }, receiver)
    }

    async fn recv(receiver: &mut mpsc::UnboundedReceiver<TestEvent>) -> TestEvent {
        timeout(Duration::from_secs(2), receiver.recv())
            .await
            .expect("timed out waiting for event")
            .expect("channel closed")
    }

    async fn test_stream(
        broker: &MemoryBroker,
        name: &str,
    ) -> MemoryStream<TestEvent, serde_json::Error, serde_json::Error> {
        MemoryStream::ensure(broker, name, &["test.*"]).await
    }

    #[tokio::test]
    async fn test_publish_and_consume_in_order() {
        let broker = MemoryBroker::new();
        let stream = test_stream(&broker, "TEST").await;

        let (handler, mut receiver) = recording();
        let consumer = stream
            .start_consumer("svc", "test.created", handler)
            .await
            .unwrap();
        assert_eq!(consumer.name(), "svc-test-created");

        for id in 1..=5 {
            stream.publish(TestEvent::Created { id }).await.unwrap();
        }

        for id in 1..=5 {
            assert_eq!(recv(&mut receiver).await, TestEvent::Created { id });
        }
    }

    #[tokio::test]
    async fn test_publish_returns_sequence() {
        let broker = MemoryBroker::new();
        let stream = test_stream(&broker, "TEST").await;

        assert_eq!(stream.publish(TestEvent::Created { id: 1 }).await.unwrap(), 1);
        assert_eq!(stream.publish(TestEvent::Deleted { id: 1 }).await.unwrap(), 2);
        assert_eq!(stream.last_seq().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_failed_handler_gets_redelivery() {
        let broker = MemoryBroker::new();
        let stream = test_stream(&broker, "TEST").await;

        let (sender, mut receiver) = mpsc::unbounded_channel();
        let handler = FlakyHandler {
            failures: 1,
            attempts: Arc::new(AtomicUsize::new(0)),
            sender,
        };
        let consumer = stream
            .start_consumer("svc", "test.created", handler.clone())
            .await
            .unwrap();

        stream.publish(TestEvent::Created { id: 7 }).await.unwrap();

        // First delivery fails, the redelivery succeeds.
        assert_eq!(recv(&mut receiver).await, TestEvent::Created { id: 7 });
        assert_eq!(handler.attempts.load(Ordering::SeqCst), 2);

        // The cursor only advanced once the handler succeeded.
        while consumer.last_seq().await.unwrap() < 1 {
            sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(consumer.last_seq().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_no_delivery_past_a_failing_message() {
        let broker = MemoryBroker::new();
        let stream = test_stream(&broker, "TEST").await;

        let (sender, mut receiver) = mpsc::unbounded_channel();
        let handler = FlakyHandler {
            failures: 3,
            attempts: Arc::new(AtomicUsize::new(0)),
            sender,
        };
        stream
            .start_consumer("svc", "test.created", handler)
            .await
            .unwrap();

        stream.publish(TestEvent::Created { id: 1 }).await.unwrap();
        stream.publish(TestEvent::Created { id: 2 }).await.unwrap();

        // The first event must come through (after retries) strictly before
        // the second: a failing head never lets later messages overtake it.
        assert_eq!(recv(&mut receiver).await, TestEvent::Created { id: 1 });
        assert_eq!(recv(&mut receiver).await, TestEvent::Created { id: 2 });
    }

    #[tokio::test]
    async fn test_cursor_survives_consumer_restart() {
        let broker = MemoryBroker::new();
        let stream = test_stream(&broker, "TEST").await;

        let (handler, mut receiver) = recording();
        let consumer = stream
            .start_consumer("svc", "test.created", handler)
            .await
            .unwrap();

        stream.publish(TestEvent::Created { id: 1 }).await.unwrap();
        assert_eq!(recv(&mut receiver).await, TestEvent::Created { id: 1 });
        while consumer.last_seq().await.unwrap() < 1 {
            sleep(Duration::from_millis(5)).await;
        }
        consumer.shutdown().await;

        stream.publish(TestEvent::Created { id: 2 }).await.unwrap();

        // A new consumer under the same name resumes after the last
        // acknowledged message.
        let (handler, mut receiver) = recording();
        stream
            .start_consumer("svc", "test.created", handler)
            .await
            .unwrap();

        assert_eq!(recv(&mut receiver).await, TestEvent::Created { id: 2 });
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unacknowledged_message_redelivered_after_restart() {
        let broker = MemoryBroker::new();
        let stream = test_stream(&broker, "TEST").await;

        let (sender, _receiver) = mpsc::unbounded_channel();
        let always_failing = FlakyHandler {
            failures: usize::MAX,
            attempts: Arc::new(AtomicUsize::new(0)),
            sender,
        };
        let consumer = stream
            .start_consumer("svc", "test.created", always_failing.clone())
            .await
            .unwrap();

        stream.publish(TestEvent::Created { id: 9 }).await.unwrap();
        while always_failing.attempts.load(Ordering::SeqCst) == 0 {
            sleep(Duration::from_millis(5)).await;
        }
        consumer.shutdown().await;

        let (handler, mut receiver) = recording();
        stream
            .start_consumer("svc", "test.created", handler)
            .await
            .unwrap();

        assert_eq!(recv(&mut receiver).await, TestEvent::Created { id: 9 });
    }

    #[tokio::test]
    async fn test_consumers_have_independent_cursors() {
        let broker = MemoryBroker::new();
        let stream = test_stream(&broker, "TEST").await;

        let (created_handler, mut created_receiver) = recording();
        let (deleted_handler, mut deleted_receiver) = recording();
        stream
            .start_consumer("svc", "test.created", created_handler)
            .await
            .unwrap();
        stream
            .start_consumer("svc", "test.deleted", deleted_handler)
            .await
            .unwrap();

        stream.publish(TestEvent::Created { id: 1 }).await.unwrap();
        stream.publish(TestEvent::Deleted { id: 1 }).await.unwrap();
        stream.publish(TestEvent::Created { id: 2 }).await.unwrap();

        assert_eq!(recv(&mut created_receiver).await, TestEvent::Created { id: 1 });
        assert_eq!(recv(&mut created_receiver).await, TestEvent::Created { id: 2 });
        assert_eq!(recv(&mut deleted_receiver).await, TestEvent::Deleted { id: 1 });
    }

    #[tokio::test]
    async fn test_stream_conflict_keeps_existing_definition() {
        let broker = MemoryBroker::new();
        let stream = test_stream(&broker, "TEST").await;

        // Re-asserting with a different binding is reported, not honored.
        let conflicting: MemoryStream<TestEvent, _, _> =
            MemoryStream::ensure(&broker, "TEST", &["other.*"]).await;

        assert_eq!(stream.publish(TestEvent::Created { id: 1 }).await.unwrap(), 1);
        assert_eq!(conflicting.publish(TestEvent::Created { id: 2 }).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_publish_to_unbound_subject_fails() {
        let broker = MemoryBroker::new();
        let stream: MemoryStream<TestEvent, _, _> =
            MemoryStream::ensure(&broker, "OTHER", &["other.*"]).await;

        let result = stream.publish(TestEvent::Created { id: 1 }).await;
        assert!(matches!(
            result,
            Err(stream::Error::SubjectNotBound { .. })
        ));
    }

    #[tokio::test]
    async fn test_unrecognized_shape_is_dropped_not_poisonous() {
        let broker = MemoryBroker::new();
        let stream = test_stream(&broker, "TEST").await;

        let (handler, mut receiver) = recording();
        let consumer = stream
            .start_consumer("svc", "test.created", handler)
            .await
            .unwrap();

        broker
            .append("TEST", "test.created", Bytes::from_static(b"not json"))
            .await
            .unwrap();
        stream.publish(TestEvent::Created { id: 3 }).await.unwrap();

        assert_eq!(recv(&mut receiver).await, TestEvent::Created { id: 3 });
        while consumer.last_seq().await.unwrap() < 2 {
            sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn test_subscription_observes_only_from_now_on() {
        let broker = MemoryBroker::new();
        let stream = test_stream(&broker, "TEST").await;

        stream.publish(TestEvent::Created { id: 1 }).await.unwrap();

        let (sender, mut receiver) = mpsc::unbounded_channel();
        let _subscription = MemorySubscription::new(&broker, "test.>", TapHandler { sender })
            .await
            .unwrap();

        stream.publish(TestEvent::Deleted { id: 1 }).await.unwrap();

        let (subject, event) = timeout(Duration::from_secs(2), receiver.recv())
            .await
            .expect("timed out")
            .expect("channel closed");
        assert_eq!(subject, "test.deleted");
        assert_eq!(event, TestEvent::Deleted { id: 1 });
        assert!(receiver.try_recv().is_err());
    }
}
