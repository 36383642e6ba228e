use async_trait::async_trait;
use bytes::Bytes;
use ticketline_events::{CatalogEvent, EventPayload};
use ticketline_messaging::consumer_handler::ConsumerHandler;
use ticketline_store::Store;
use uuid::Uuid;

use crate::error::ReplicaError;

/// The store-backed replica of catalog listings, updated by `event.*`
/// events. The full published record is mirrored; the catalog service is
/// authoritative.
///
/// Reconciliation is idempotent under duplicate delivery, and misses
/// (an update or delete for a listing never seen here) are warnings, not
/// failures: the replica may legitimately lag, and holding the message
/// hostage cannot fix that.
#[derive(Clone, Debug)]
pub struct EventReplica<S>
where
    S: Store,
{
    store: S,
}

impl<S> EventReplica<S>
where
    S: Store,
{
    /// Creates a replica over its store.
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Looks up a mirrored listing by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read or decoding fails.
    pub async fn event(&self, id: Uuid) -> Result<Option<EventPayload>, ReplicaError<S::Error>> {
        let Some(bytes) = self
            .store
            .get(id.to_string())
            .await
            .map_err(ReplicaError::Store)?
        else {
            return Ok(None);
        };

        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    async fn upsert(&self, payload: &EventPayload) -> Result<(), ReplicaError<S::Error>> {
        self.store
            .put(
                payload.id.to_string(),
                Bytes::from(serde_json::to_vec(payload)?),
            )
            .await
            .map_err(ReplicaError::Store)
    }

    async fn update(&self, payload: &EventPayload) -> Result<(), ReplicaError<S::Error>> {
        if self
            .store
            .get(payload.id.to_string())
            .await
            .map_err(ReplicaError::Store)?
            .is_none()
        {
            tracing::warn!(event_id = %payload.id, "event not found for update; replica may lag");
            return Ok(());
        }

        self.upsert(payload).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), ReplicaError<S::Error>> {
        if self
            .store
            .get(id.to_string())
            .await
            .map_err(ReplicaError::Store)?
            .is_none()
        {
            tracing::warn!(event_id = %id, "event already deleted or never seen");
            return Ok(());
        }

        self.store
            .del(id.to_string())
            .await
            .map_err(ReplicaError::Store)?;
        tracing::info!(event_id = %id, "event removed from replica");
        Ok(())
    }
}

#[async_trait]
impl<S> ConsumerHandler<CatalogEvent> for EventReplica<S>
where
    S: Store,
{
    type Error = ReplicaError<S::Error>;

    async fn handle(&self, event: CatalogEvent, _stream_sequence: u64) -> Result<(), Self::Error> {
        match event {
            CatalogEvent::Created(payload) => self.upsert(&payload).await,
            CatalogEvent::Updated(payload) => self.update(&payload).await,
            CatalogEvent::Deleted(deleted) => self.delete(deleted.id).await,
        }
    }
}
