use std::error::Error as StdError;
use std::fmt::Debug;

use async_trait::async_trait;
use bytes::Bytes;

use crate::Routed;
use crate::consumer::Consumer;
use crate::consumer_handler::ConsumerHandler;

/// Marker trait for stream errors.
pub trait StreamError: Debug + StdError + Send + Sync + 'static {}

/// A durable, ordered, append-only log of domain events for one subject
/// family.
///
/// A stream is provisioned declaratively: asserting one that already exists
/// is a no-op, and a definition conflict is reported, never fatal. All
/// process instances of a service may race on provisioning; the loser of
/// the race observes "already exists" and treats it as success.
#[async_trait]
pub trait Stream<T, D, S>
where
    Self: Clone + Debug + Send + Sync + 'static,
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
    /// The error type for the stream.
    type Error: StreamError;

    /// The consumer type for the stream.
    type Consumer<X>: Consumer<X, T, D, S>
    where
        X: ConsumerHandler<T>;

    /// Returns the name of the stream.
    fn name(&self) -> String;

    /// Publishes an event on its own subject and returns the stream
    /// sequence assigned to it.
    ///
    /// Resolves once the broker has accepted the write (durability is the
    /// broker's job from that point), not once any subscriber has processed
    /// it. A failure propagates to the caller: the local mutation that
    /// triggered the publish has usually already committed, and it is the
    /// caller's decision to compensate or to accept republication by an
    /// out-of-band reconciliation job.
    async fn publish(&self, event: T) -> Result<u64, Self::Error>;

    /// The sequence number of the last message in the stream.
    async fn last_seq(&self) -> Result<u64, Self::Error>;

    /// Starts a durable consumer for `service`, filtered to `subject`.
    ///
    /// The consumer is named `{service}-{subject-dashed}` and processes
    /// messages strictly one at a time in stream order; an event is
    /// acknowledged only after the handler returns `Ok`. Consumers on
    /// different subjects are independent and share no ordering.
    async fn start_consumer<X>(
        &self,
        service: &str,
        subject: &str,
        handler: X,
    ) -> Result<Self::Consumer<X>, <Self::Consumer<X> as Consumer<X, T, D, S>>::Error>
    where
        X: ConsumerHandler<T>;
}
