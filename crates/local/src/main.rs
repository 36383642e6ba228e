//! Boots every service core against the in-memory broker and runs one
//! booking saga end to end: register a user, list an event, book tickets,
//! pay, and watch the confirmation come back around.

use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use ticketline_auth::UserReplica;
use ticketline_bookings::{BookingService, CreateBooking, EventReplica, start_event_listeners};
use ticketline_catalog::{CatalogService, CreateEvent};
use ticketline_events::{
    BookingEvent, BookingStatus, CatalogEvent, CodecError, PaymentEvent, UserEvent, UserRole,
    subjects,
};
use ticketline_messaging::Routed;
use ticketline_messaging::subscription_handler::{SubscriptionHandler, SubscriptionHandlerError};
use ticketline_messaging_memory::{MemoryBroker, MemoryStream, MemorySubscription};
use ticketline_notifications::LogMailer;
use ticketline_payments::PaymentService;
use ticketline_store_memory::MemoryStore;
use ticketline_users::{CreateUser, UserService};
use tokio::time::{sleep, timeout};

type UserStream = MemoryStream<UserEvent, CodecError, CodecError>;
type CatalogStream = MemoryStream<CatalogEvent, CodecError, CodecError>;
type BookingStream = MemoryStream<BookingEvent, CodecError, CodecError>;
type PaymentStream = MemoryStream<PaymentEvent, CodecError, CodecError>;

/// Logs every booking event that flies by. Non-durable on purpose: a
/// firehose tap, not a consumer.
#[derive(Clone, Debug)]
struct FirehoseHandler;

#[derive(Clone, Debug)]
struct FirehoseError;

impl fmt::Display for FirehoseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "firehose error")
    }
}

impl StdError for FirehoseError {}
impl SubscriptionHandlerError for FirehoseError {}

#[async_trait]
impl SubscriptionHandler<BookingEvent> for FirehoseHandler {
    type Error = FirehoseError;

    async fn handle(&self, subject: String, event: BookingEvent) -> Result<(), Self::Error> {
        tracing::info!(%subject, routed = event.subject(), "observed on the firehose");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn StdError>> {
    tracing_subscriber::fmt::init();

    let broker = MemoryBroker::new();

    let users_stream = UserStream::ensure(&broker, subjects::USERS_STREAM, &["user.*"]).await;
    let catalog_stream =
        CatalogStream::ensure(&broker, subjects::EVENTS_STREAM, &["event.*"]).await;
    let bookings_stream =
        BookingStream::ensure(&broker, subjects::BOOKINGS_STREAM, &["booking.*"]).await;
    let payments_stream =
        PaymentStream::ensure(&broker, subjects::PAYMENTS_STREAM, &["payment.*"]).await;

    // Service cores, each over its own store.
    let users = UserService::new(MemoryStore::new(), users_stream.clone());
    let catalog = CatalogService::new(MemoryStore::new(), catalog_stream.clone());

    let user_replica = UserReplica::new(MemoryStore::new());
    let _auth_consumers = ticketline_auth::start_listeners(&users_stream, &user_replica).await?;

    let event_replica = EventReplica::new(MemoryStore::new());
    let bookings = BookingService::new(
        MemoryStore::new(),
        event_replica.clone(),
        bookings_stream.clone(),
        payments_stream.clone(),
    );
    let _event_consumers = start_event_listeners(&catalog_stream, &event_replica).await?;
    let _payment_consumer = bookings.start_payment_listener().await?;

    let payments = PaymentService::new(payments_stream.clone())
        .with_processing_delay(Duration::from_millis(250));
    let _request_consumer = payments.start_request_listener().await?;

    let _notifications_consumer =
        ticketline_notifications::start_listener(&bookings_stream, LogMailer).await?;

    let _firehose: MemorySubscription<FirehoseHandler, BookingEvent, CodecError> =
        MemorySubscription::new(&broker, "booking.*", FirehoseHandler).await?;

    // One pass through the whole flow.
    let user = users
        .register(CreateUser {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "$2b$10$abcdefghijklmnopqrstuv".to_string(),
            role: UserRole::User,
        })
        .await?;

    let event = catalog
        .create_event(CreateEvent {
            title: "Rust Nation".to_string(),
            description: "Two days of talks".to_string(),
            price: 89.5,
            date: Utc::now(),
            available_tickets: 250,
            organizer_id: user.id,
        })
        .await?;

    // Wait for the bookings service to mirror the listing.
    timeout(Duration::from_secs(5), async {
        while event_replica.event(event.id).await.ok().flatten().is_none() {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await?;

    let booking = bookings
        .create_booking(CreateBooking {
            user_id: user.id,
            email: user.email.clone(),
            event_id: event.id,
            quantity: 3,
        })
        .await?;
    tracing::info!(booking_id = %booking.id, status = ?booking.status, "booking placed");

    // The legacy direct form: payments picks it up and completes.
    bookings.request_payment(booking.id).await?;

    timeout(Duration::from_secs(5), async {
        loop {
            let confirmed = bookings
                .get(booking.id)
                .await
                .ok()
                .flatten()
                .is_some_and(|current| current.status == BookingStatus::Confirmed);
            if confirmed {
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await?;

    tracing::info!(booking_id = %booking.id, "saga complete; booking confirmed");

    // Let the notification consumer drain before exiting.
    sleep(Duration::from_millis(100)).await;

    Ok(())
}
