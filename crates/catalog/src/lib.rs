//! The catalog service core: authoritative over event listings.
//!
//! Commands mutate the local store first, then publish `event.*` events the
//! bookings service mirrors its replica from.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;
mod event_record;

pub use error::Error;
pub use event_record::{CreateEvent, EventRecord, UpdateEvent};

use bytes::Bytes;
use chrono::Utc;
use ticketline_events::{CatalogEvent, CodecError, EventDeleted};
use ticketline_messaging::stream::Stream;
use ticketline_store::Store;
use uuid::Uuid;

/// The consumer-name prefix this service registers under.
pub const SERVICE: &str = "catalog";

/// The catalog service.
#[derive(Clone, Debug)]
pub struct CatalogService<S, CS>
where
    S: Store,
    CS: Stream<CatalogEvent, CodecError, CodecError>,
{
    store: S,
    stream: CS,
}

impl<S, CS> CatalogService<S, CS>
where
    S: Store,
    CS: Stream<CatalogEvent, CodecError, CodecError>,
{
    /// Creates the service over its collaborators.
    pub const fn new(store: S, stream: CS) -> Self {
        Self { store, stream }
    }

    /// Creates a listing and announces it on `event.created`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store write or the publish fails.
    pub async fn create_event(
        &self,
        params: CreateEvent,
    ) -> Result<EventRecord, Error<S::Error, CS::Error>> {
        let record = EventRecord {
            id: Uuid::new_v4(),
            title: params.title,
            description: params.description,
            price: params.price,
            date: params.date,
            available_tickets: params.available_tickets,
            organizer_id: params.organizer_id,
            created_at: Utc::now(),
        };

        self.store
            .put(
                record.id.to_string(),
                Bytes::from(serde_json::to_vec(&record)?),
            )
            .await
            .map_err(Error::Store)?;

        self.stream
            .publish(CatalogEvent::Created(record.payload()))
            .await
            .map_err(Error::Stream)?;

        tracing::info!(event_id = %record.id, title = %record.title, "event created");

        Ok(record)
    }

    /// Applies a partial update and announces it on `event.updated`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id, or an error if the
    /// store write or the publish fails.
    pub async fn update_event(
        &self,
        id: Uuid,
        changes: UpdateEvent,
    ) -> Result<EventRecord, Error<S::Error, CS::Error>> {
        let mut record = self.get(id).await?.ok_or(Error::NotFound(id))?;

        if let Some(title) = changes.title {
            record.title = title;
        }
        if let Some(description) = changes.description {
            record.description = description;
        }
        if let Some(price) = changes.price {
            record.price = price;
        }
        if let Some(date) = changes.date {
            record.date = date;
        }
        if let Some(available_tickets) = changes.available_tickets {
            record.available_tickets = available_tickets;
        }

        self.store
            .put(
                record.id.to_string(),
                Bytes::from(serde_json::to_vec(&record)?),
            )
            .await
            .map_err(Error::Store)?;

        self.stream
            .publish(CatalogEvent::Updated(record.payload()))
            .await
            .map_err(Error::Stream)?;

        Ok(record)
    }

    /// Deletes a listing and announces it on `event.deleted`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id, or an error if the
    /// store write or the publish fails.
    pub async fn delete_event(&self, id: Uuid) -> Result<(), Error<S::Error, CS::Error>> {
        if self.get(id).await?.is_none() {
            return Err(Error::NotFound(id));
        }

        self.store.del(id.to_string()).await.map_err(Error::Store)?;

        self.stream
            .publish(CatalogEvent::Deleted(EventDeleted { id }))
            .await
            .map_err(Error::Stream)?;

        tracing::info!(event_id = %id, "event deleted");

        Ok(())
    }

    /// Fetches one listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read or decoding fails.
    pub async fn get(
        &self,
        id: Uuid,
    ) -> Result<Option<EventRecord>, Error<S::Error, CS::Error>> {
        let Some(bytes) = self
            .store
            .get(id.to_string())
            .await
            .map_err(Error::Store)?
        else {
            return Ok(None);
        };

        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Lists every listing.
    ///
    /// # Errors
    ///
    /// Returns an error if a store read or decoding fails.
    pub async fn list(&self) -> Result<Vec<EventRecord>, Error<S::Error, CS::Error>> {
        let mut records = Vec::new();
        for key in self.store.keys().await.map_err(Error::Store)? {
            if let Some(bytes) = self.store.get(key).await.map_err(Error::Store)? {
                records.push(serde_json::from_slice(&bytes)?);
            }
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ticketline_messaging_memory::{MemoryBroker, MemoryStream};
    use ticketline_store_memory::MemoryStore;

    type TestStream = MemoryStream<CatalogEvent, CodecError, CodecError>;

    async fn service() -> (CatalogService<MemoryStore, TestStream>, TestStream) {
        let broker = MemoryBroker::new();
        let stream = TestStream::ensure(&broker, "EVENTS", &["event.*"]).await;
        (
            CatalogService::new(MemoryStore::new(), stream.clone()),
            stream,
        )
    }

    fn rust_nation() -> CreateEvent {
        CreateEvent {
            title: "Rust Nation".to_string(),
            description: "Two days of talks".to_string(),
            price: 89.5,
            date: Utc::now(),
            available_tickets: 250,
            organizer_id: Uuid::new_v4(),
        }
    }

    #[tokio::test]
    async fn test_create_stores_and_publishes() {
        let (service, stream) = service().await;

        let record = service.create_event(rust_nation()).await.unwrap();

        assert_eq!(service.get(record.id).await.unwrap(), Some(record.clone()));
        assert_eq!(stream.last_seq().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_publishes_full_record() {
        let (service, stream) = service().await;
        let record = service.create_event(rust_nation()).await.unwrap();

        let updated = service
            .update_event(
                record.id,
                UpdateEvent {
                    available_tickets: Some(100),
                    ..UpdateEvent::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.available_tickets, 100);
        assert_eq!(updated.title, "Rust Nation");
        assert_eq!(stream.last_seq().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_delete_unknown_event_is_not_found() {
        let (service, stream) = service().await;

        let result = service.delete_event(Uuid::new_v4()).await;

        assert!(matches!(result, Err(Error::NotFound(_))));
        assert_eq!(stream.last_seq().await.unwrap(), 0);
    }
}
