//! The bookings service core: authoritative over bookings, mirroring
//! catalog listings, and home of the booking saga.
//!
//! A booking is created only if the mirrored listing has enough remaining
//! capacity, checked before anything is committed or published. It then
//! waits as `PENDING` until a `payment.completed` event for its id arrives,
//! confirms exactly once, and republishes the confirmation for the
//! notifications service. Capacity is deliberately not decremented at
//! creation; availability wins over strict reservation locking here.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod booking;
mod error;
mod replica;
mod saga;

pub use booking::{Booking, CreateBooking};
pub use error::{Error, ReplicaError};
pub use replica::EventReplica;
pub use saga::PaymentCompletedHandler;

use bytes::Bytes;
use chrono::Utc;
use ticketline_events::{
    BookingEvent, CatalogEvent, CodecError, PaymentEvent, PaymentRequested, subjects,
};
use ticketline_messaging::consumer::Consumer;
use ticketline_messaging::stream::Stream;
use ticketline_store::Store;
use uuid::Uuid;

/// The consumer-name prefix this service registers under.
pub const SERVICE: &str = "bookings";

/// The bookings service.
///
/// Generic over one store type (used by both the booking store and the
/// listing replica) and the two streams it touches: `BOOKINGS` to publish
/// on and `PAYMENTS` to request payments on.
#[derive(Clone, Debug)]
pub struct BookingService<S, BS, PS>
where
    S: Store,
    BS: Stream<BookingEvent, CodecError, CodecError>,
    PS: Stream<PaymentEvent, CodecError, CodecError>,
{
    store: S,
    replica: EventReplica<S>,
    bookings_stream: BS,
    payments_stream: PS,
}

impl<S, BS, PS> BookingService<S, BS, PS>
where
    S: Store,
    BS: Stream<BookingEvent, CodecError, CodecError>,
    PS: Stream<PaymentEvent, CodecError, CodecError>,
{
    /// Creates the service over its collaborators.
    pub const fn new(
        store: S,
        replica: EventReplica<S>,
        bookings_stream: BS,
        payments_stream: PS,
    ) -> Self {
        Self {
            store,
            replica,
            bookings_stream,
            payments_stream,
        }
    }

    /// The mirrored listing replica.
    pub const fn replica(&self) -> &EventReplica<S> {
        &self.replica
    }

    /// The saga handler for the `payment.completed` consumer.
    pub fn payment_handler(&self) -> PaymentCompletedHandler<S, BS> {
        PaymentCompletedHandler::new(self.store.clone(), self.bookings_stream.clone())
    }

    /// Creates a booking after the capacity guard and announces it on
    /// `booking.created` with `status: PENDING`.
    ///
    /// The guard rejects before anything is committed, so a refused request
    /// needs no compensation. `total_price` is fixed here from the mirrored
    /// listing's price and never recomputed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownEvent`] if the listing is not mirrored yet,
    /// [`Error::CapacityExceeded`] if fewer tickets remain than requested,
    /// or an error if the store write or the publish fails.
    pub async fn create_booking(
        &self,
        params: CreateBooking,
    ) -> Result<Booking, Error<S::Error, BS::Error>> {
        let event = self
            .replica
            .event(params.event_id)
            .await
            .map_err(Error::Replica)?
            .ok_or(Error::UnknownEvent(params.event_id))?;

        if event.available_tickets < params.quantity {
            return Err(Error::CapacityExceeded {
                requested: params.quantity,
                available: event.available_tickets,
            });
        }

        let booking = Booking {
            id: Uuid::new_v4(),
            event_id: event.id,
            user_id: params.user_id,
            email: params.email,
            title: event.title.clone(),
            quantity: params.quantity,
            total_price: event.price * f64::from(params.quantity),
            status: ticketline_events::BookingStatus::Pending,
            created_at: Utc::now(),
        };

        self.store
            .put(
                booking.id.to_string(),
                Bytes::from(serde_json::to_vec(&booking)?),
            )
            .await
            .map_err(Error::Store)?;

        self.bookings_stream
            .publish(BookingEvent::Created(booking.payload()))
            .await
            .map_err(Error::Stream)?;

        tracing::info!(
            booking_id = %booking.id,
            event_id = %booking.event_id,
            quantity = booking.quantity,
            "booking created"
        );

        Ok(booking)
    }

    /// Publishes the legacy `payment.requested` form for a booking.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id, or an error if the
    /// publish fails.
    pub async fn request_payment(&self, id: Uuid) -> Result<(), Error<S::Error, PS::Error>> {
        let Some(bytes) = self
            .store
            .get(id.to_string())
            .await
            .map_err(Error::Store)?
        else {
            return Err(Error::NotFound(id));
        };
        let booking: Booking = serde_json::from_slice(&bytes)?;

        self.payments_stream
            .publish(PaymentEvent::Requested(PaymentRequested {
                booking_id: booking.id,
                user_id: booking.user_id,
            }))
            .await
            .map_err(Error::Stream)?;

        tracing::info!(booking_id = %id, "payment requested");

        Ok(())
    }

    /// Fetches one booking.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read or decoding fails.
    pub async fn get(&self, id: Uuid) -> Result<Option<Booking>, Error<S::Error, BS::Error>> {
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

    /// Lists every booking.
    ///
    /// # Errors
    ///
    /// Returns an error if a store read or decoding fails.
    pub async fn list(&self) -> Result<Vec<Booking>, Error<S::Error, BS::Error>> {
        let mut bookings = Vec::new();
        for key in self.store.keys().await.map_err(Error::Store)? {
            if let Some(bytes) = self.store.get(key).await.map_err(Error::Store)? {
                bookings.push(serde_json::from_slice(&bytes)?);
            }
        }
        Ok(bookings)
    }

    /// Lists a user's bookings.
    ///
    /// # Errors
    ///
    /// Returns an error if a store read or decoding fails.
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Booking>, Error<S::Error, BS::Error>> {
        let mut bookings = self.list().await?;
        bookings.retain(|booking| booking.user_id == user_id);
        Ok(bookings)
    }

    /// Deletes a booking. No event is published; bookings are not mirrored
    /// by other services.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id, or an error if the
    /// store write fails.
    pub async fn delete_booking(&self, id: Uuid) -> Result<(), Error<S::Error, BS::Error>> {
        if self.get(id).await?.is_none() {
            return Err(Error::NotFound(id));
        }

        self.store.del(id.to_string()).await.map_err(Error::Store)?;
        tracing::info!(booking_id = %id, "booking deleted");
        Ok(())
    }

    /// Starts the durable `payment.completed` consumer that confirms
    /// bookings (`bookings-payment-completed`).
    ///
    /// # Errors
    ///
    /// Returns an error if the consumer cannot be provisioned.
    pub async fn start_payment_listener(
        &self,
    ) -> Result<
        PS::Consumer<PaymentCompletedHandler<S, BS>>,
        <PS::Consumer<PaymentCompletedHandler<S, BS>> as Consumer<
            PaymentCompletedHandler<S, BS>,
            PaymentEvent,
            CodecError,
            CodecError,
        >>::Error,
    > {
        self.payments_stream
            .start_consumer(SERVICE, subjects::PAYMENT_COMPLETED, self.payment_handler())
            .await
    }
}

/// Starts the three durable catalog listeners for the bookings service,
/// one per subject (`bookings-event-created`, `bookings-event-updated`,
/// `bookings-event-deleted`).
///
/// # Errors
///
/// Returns an error if a consumer cannot be provisioned.
pub async fn start_event_listeners<S, CS>(
    stream: &CS,
    replica: &EventReplica<S>,
) -> Result<
    Vec<CS::Consumer<EventReplica<S>>>,
    <CS::Consumer<EventReplica<S>> as Consumer<
        EventReplica<S>,
        CatalogEvent,
        CodecError,
        CodecError,
    >>::Error,
>
where
    S: Store,
    CS: Stream<CatalogEvent, CodecError, CodecError>,
{
    let mut consumers = Vec::with_capacity(3);
    for subject in [
        subjects::EVENT_CREATED,
        subjects::EVENT_UPDATED,
        subjects::EVENT_DELETED,
    ] {
        consumers.push(
            stream
                .start_consumer(SERVICE, subject, replica.clone())
                .await?,
        );
    }
    Ok(consumers)
}
