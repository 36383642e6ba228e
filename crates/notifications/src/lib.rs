//! The notifications service core.
//!
//! Consumes `booking.created` and sends the booking-confirmation email.
//! The subject doubles as the confirmation signal: payloads still
//! `PENDING` are ignored, and the `CONFIRMED` republication from the
//! bookings saga is what triggers mail, so every booking produces exactly
//! one confirmation email. The payload is fully denormalized (email,
//! title, quantity, total), so no other service is consulted.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;
mod mailer;

pub use error::Error;
pub use mailer::{Email, LogMailer, Mailer, MailerError, RecordingMailer};

use async_trait::async_trait;
use ticketline_events::{
    BookingEvent, BookingPayload, BookingStatus, CodecError, subjects,
};
use ticketline_messaging::consumer::Consumer;
use ticketline_messaging::consumer_handler::ConsumerHandler;
use ticketline_messaging::stream::Stream;

/// The consumer-name prefix this service registers under.
pub const SERVICE: &str = "notifications";

/// Renders the confirmation email for a booking.
fn render_confirmation(payload: &BookingPayload) -> Email {
    let body = format!(
        "Thank you for your booking!\n\
         You have successfully reserved {} ticket(s) for {}.\n\
         Total amount paid: {} €\n\n\
         We look forward to seeing you at the event!\n\
         – The Ticketing Team",
        payload.quantity, payload.title, payload.total_price,
    );

    Email {
        to: payload.email.clone(),
        subject: "Your booking is confirmed!".to_string(),
        body,
    }
}

/// The `booking.created` handler: mail on confirmation, ignore the rest.
///
/// A mailer failure leaves the message unacknowledged, so delivery is
/// retried; the email is sent at least once, never silently dropped.
#[derive(Clone, Debug)]
pub struct BookingConfirmationHandler<M>
where
    M: Mailer,
{
    mailer: M,
}

impl<M> BookingConfirmationHandler<M>
where
    M: Mailer,
{
    /// Creates the handler over its mailer.
    pub const fn new(mailer: M) -> Self {
        Self { mailer }
    }
}

#[async_trait]
impl<M> ConsumerHandler<BookingEvent> for BookingConfirmationHandler<M>
where
    M: Mailer,
{
    type Error = Error<M::Error>;

    async fn handle(&self, event: BookingEvent, _stream_sequence: u64) -> Result<(), Self::Error> {
        let BookingEvent::Created(payload) = event;

        if payload.status != BookingStatus::Confirmed {
            tracing::debug!(booking_id = %payload.id, "booking pending; awaiting confirmation");
            return Ok(());
        }

        let email = render_confirmation(&payload);
        self.mailer.send(email).await.map_err(Error::Mailer)?;

        tracing::info!(booking_id = %payload.id, to = %payload.email, "confirmation email sent");

        Ok(())
    }
}

/// Starts the durable `booking.created` listener for the notifications
/// service (`notifications-booking-created`).
///
/// # Errors
///
/// Returns an error if the consumer cannot be provisioned.
pub async fn start_listener<M, BS>(
    stream: &BS,
    mailer: M,
) -> Result<
    BS::Consumer<BookingConfirmationHandler<M>>,
    <BS::Consumer<BookingConfirmationHandler<M>> as Consumer<
        BookingConfirmationHandler<M>,
        BookingEvent,
        CodecError,
        CodecError,
    >>::Error,
>
where
    M: Mailer,
    BS: Stream<BookingEvent, CodecError, CodecError>,
{
    stream
        .start_consumer(
            SERVICE,
            subjects::BOOKING_CREATED,
            BookingConfirmationHandler::new(mailer),
        )
        .await
}
