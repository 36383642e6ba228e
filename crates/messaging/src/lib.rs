//! Abstract interface for the event-driven synchronization layer.
//!
//! Services never call each other; they converge by exchanging domain
//! events over durable streams. This crate defines the seams that layer is
//! built on: streams, durable consumers, consumer handlers, and
//! non-durable subscriptions, independently of any concrete broker.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Consumers are durable, explicitly acknowledged cursors over streams.
pub mod consumer;

/// Consumer handlers process decoded events for consumers.
pub mod consumer_handler;

/// Streams are persistent, ordered, append-only logs of domain events.
pub mod stream;

/// Subjects are the dot-separated routing names of domain events.
pub mod subject;

/// Subscriptions observe subjects without durability guarantees.
pub mod subscription;

/// Subscription handlers process events for subscriptions.
pub mod subscription_handler;

pub use subject::Subject;

/// Implemented by event types that know the subject they are routed on.
pub trait Routed {
    /// The dot-separated subject this event is published under.
    fn subject(&self) -> &'static str;
}
