//! Abstract interface for service-local persistence.
//!
//! Every service owns exactly one store; nothing outside the service ever
//! writes to it. Replicated entities are kept as serialized values keyed by
//! the cross-service entity id carried in event payloads.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use std::error::Error as StdError;
use std::fmt::Debug;

use async_trait::async_trait;
use bytes::Bytes;

/// Marker trait for store errors.
pub trait StoreError: Debug + StdError + Send + Sync + 'static {}

/// A key-value store with asynchronous operations.
///
/// Deliberately not tied to any storage engine: the core only needs
/// put/get/del/keys to maintain replicas and authoritative entities.
#[async_trait]
pub trait Store
where
    Self: Clone + Debug + Send + Sync + 'static,
{
    /// The error type for the store.
    type Error: StoreError;

    /// Deletes a key. Deleting an absent key is not an error.
    async fn del<K: Into<String> + Send>(&self, key: K) -> Result<(), Self::Error>;

    /// Retrieves the value associated with a key.
    async fn get<K: Into<String> + Send>(&self, key: K) -> Result<Option<Bytes>, Self::Error>;

    /// Retrieves all keys in the store.
    async fn keys(&self) -> Result<Vec<String>, Self::Error>;

    /// Stores a key-value pair, replacing any previous value.
    async fn put<K: Into<String> + Send>(&self, key: K, bytes: Bytes) -> Result<(), Self::Error>;
}
