use async_trait::async_trait;
use bytes::Bytes;
use ticketline_events::{BookingEvent, BookingStatus, CodecError, PaymentCompleted, PaymentEvent};
use ticketline_messaging::consumer_handler::ConsumerHandler;
use ticketline_messaging::stream::Stream;
use ticketline_store::Store;

use crate::booking::Booking;
use crate::error::Error;

/// The saga step driven by `payment.completed`: transition the matching
/// booking to `CONFIRMED`, exactly once, and republish the
/// `booking.created`-shaped confirmation event for notifications.
///
/// A completion for an unknown booking id, or for a booking that is
/// already confirmed (duplicate delivery), is acknowledged with a warning.
/// The confirmed state commits before the confirmation publish; if the
/// process dies between the two, the confirmation event is lost and an
/// out-of-band reconciliation job is the recovery path.
#[derive(Clone, Debug)]
pub struct PaymentCompletedHandler<S, BS>
where
    S: Store,
    BS: Stream<BookingEvent, CodecError, CodecError>,
{
    store: S,
    bookings_stream: BS,
}

impl<S, BS> PaymentCompletedHandler<S, BS>
where
    S: Store,
    BS: Stream<BookingEvent, CodecError, CodecError>,
{
    pub(crate) const fn new(store: S, bookings_stream: BS) -> Self {
        Self {
            store,
            bookings_stream,
        }
    }

    async fn confirm(&self, completed: PaymentCompleted) -> Result<(), Error<S::Error, BS::Error>> {
        let key = completed.booking_id.to_string();

        let Some(bytes) = self.store.get(key.clone()).await.map_err(Error::Store)? else {
            tracing::warn!(
                booking_id = %completed.booking_id,
                "payment completed for an unknown booking"
            );
            return Ok(());
        };

        let mut booking: Booking = serde_json::from_slice(&bytes)?;

        if booking.status == BookingStatus::Confirmed {
            tracing::warn!(booking_id = %booking.id, "booking already confirmed; duplicate delivery");
            return Ok(());
        }

        booking.status = BookingStatus::Confirmed;

        self.store
            .put(key, Bytes::from(serde_json::to_vec(&booking)?))
            .await
            .map_err(Error::Store)?;

        self.bookings_stream
            .publish(BookingEvent::Created(booking.payload()))
            .await
            .map_err(Error::Stream)?;

        tracing::info!(booking_id = %booking.id, "booking confirmed");

        Ok(())
    }
}

#[async_trait]
impl<S, BS> ConsumerHandler<PaymentEvent> for PaymentCompletedHandler<S, BS>
where
    S: Store,
    BS: Stream<BookingEvent, CodecError, CodecError>,
{
    type Error = Error<S::Error, BS::Error>;

    async fn handle(&self, event: PaymentEvent, _stream_sequence: u64) -> Result<(), Self::Error> {
        match event {
            PaymentEvent::Completed(completed) => self.confirm(completed).await,
            PaymentEvent::Requested(requested) => {
                // The consumer filter keeps these away; nothing to do.
                tracing::debug!(booking_id = %requested.booking_id, "ignoring payment.requested");
                Ok(())
            }
        }
    }
}
