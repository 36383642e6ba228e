//! NATS JetStream implementation of the messaging layer.
//!
//! Streams are JetStream streams bound to a subject family, durable
//! consumers are explicit-acknowledgement pull consumers, and non-durable
//! subscriptions ride core NATS. One [`NatsBroker`] per process owns the
//! connection and is cloned into everything that needs it.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// The per-process broker connection handle.
pub mod broker;

/// Durable, explicit-acknowledgement pull consumers.
pub mod consumer;

/// JetStream-backed streams.
pub mod stream;

/// Non-durable, at-most-once subscriptions over core NATS.
pub mod subscription;

pub use broker::NatsBroker;
pub use consumer::NatsConsumer;
pub use stream::NatsStream;
pub use subscription::NatsSubscription;
