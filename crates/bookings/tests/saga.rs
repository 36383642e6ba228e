//! Booking saga behavior against the in-memory broker: capacity guard,
//! pending-to-confirmed transition, duplicate payment deliveries, and
//! out-of-order catalog events.

use std::time::Duration;

use chrono::Utc;
use ticketline_bookings::{
    BookingService, CreateBooking, Error, EventReplica, start_event_listeners,
};
use ticketline_events::{
    BookingEvent, BookingStatus, CatalogEvent, CodecError, EventPayload, PaymentCompleted,
    PaymentEvent, subjects,
};
use ticketline_messaging::stream::Stream;
use ticketline_messaging_memory::{MemoryBroker, MemoryStream};
use ticketline_store_memory::MemoryStore;
use tokio::time::{sleep, timeout};
use uuid::Uuid;

type CatalogStream = MemoryStream<CatalogEvent, CodecError, CodecError>;
type BookingStream = MemoryStream<BookingEvent, CodecError, CodecError>;
type PaymentStream = MemoryStream<PaymentEvent, CodecError, CodecError>;

struct Harness {
    catalog_stream: CatalogStream,
    bookings_stream: BookingStream,
    payments_stream: PaymentStream,
    service: BookingService<MemoryStore, BookingStream, PaymentStream>,
}

async fn harness() -> Harness {
    let broker = MemoryBroker::new();
    let catalog_stream = CatalogStream::ensure(&broker, subjects::EVENTS_STREAM, &["event.*"]).await;
    let bookings_stream =
        BookingStream::ensure(&broker, subjects::BOOKINGS_STREAM, &["booking.*"]).await;
    let payments_stream =
        PaymentStream::ensure(&broker, subjects::PAYMENTS_STREAM, &["payment.*"]).await;

    let store = MemoryStore::new();
    let replica = EventReplica::new(MemoryStore::new());
    let service = BookingService::new(
        store,
        replica.clone(),
        bookings_stream.clone(),
        payments_stream.clone(),
    );

    start_event_listeners(&catalog_stream, &replica)
        .await
        .expect("failed to start catalog listeners");
    service
        .start_payment_listener()
        .await
        .expect("failed to start payment listener");

    Harness {
        catalog_stream,
        bookings_stream,
        payments_stream,
        service,
    }
}

fn listing(id: Uuid, available_tickets: u32) -> EventPayload {
    EventPayload {
        id,
        title: "Rust Nation".to_string(),
        description: "Two days of talks".to_string(),
        price: 89.5,
        date: Utc::now(),
        available_tickets,
        organizer_id: Uuid::new_v4(),
        created_at: Utc::now(),
    }
}

async fn publish_listing(harness: &Harness, event_id: Uuid, available_tickets: u32) {
    harness
        .catalog_stream
        .publish(CatalogEvent::Created(listing(event_id, available_tickets)))
        .await
        .expect("failed to publish listing");

    timeout(Duration::from_secs(2), async {
        while harness
            .service
            .replica()
            .event(event_id)
            .await
            .unwrap()
            .is_none()
        {
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("replica did not converge");
}

fn booking_request(event_id: Uuid) -> CreateBooking {
    CreateBooking {
        user_id: Uuid::new_v4(),
        email: "ada@example.com".to_string(),
        event_id,
        quantity: 3,
    }
}

#[tokio::test]
async fn test_booking_is_pending_until_payment_completes() {
    let harness = harness().await;
    let event_id = Uuid::new_v4();
    publish_listing(&harness, event_id, 10).await;

    let booking = harness
        .service
        .create_booking(booking_request(event_id))
        .await
        .unwrap();

    assert_eq!(booking.status, BookingStatus::Pending);
    assert!((booking.total_price - 268.5).abs() < f64::EPSILON);
    assert_eq!(harness.bookings_stream.last_seq().await.unwrap(), 1);

    // The minimal payment.completed shape is enough to confirm.
    harness
        .payments_stream
        .publish(PaymentEvent::Completed(PaymentCompleted {
            booking_id: booking.id,
            user_id: None,
            status: None,
            timestamp: None,
        }))
        .await
        .unwrap();

    timeout(Duration::from_secs(2), async {
        loop {
            let current = harness.service.get(booking.id).await.unwrap().unwrap();
            if current.status == BookingStatus::Confirmed {
                break;
            }
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("booking was not confirmed");

    // Exactly one confirmation event on top of the creation event.
    assert_eq!(harness.bookings_stream.last_seq().await.unwrap(), 2);
}

#[tokio::test]
async fn test_duplicate_payment_completed_confirms_once() {
    let harness = harness().await;
    let event_id = Uuid::new_v4();
    publish_listing(&harness, event_id, 10).await;

    let booking = harness
        .service
        .create_booking(booking_request(event_id))
        .await
        .unwrap();

    let completed = PaymentEvent::Completed(PaymentCompleted::completed(booking.id, booking.user_id));
    harness.payments_stream.publish(completed.clone()).await.unwrap();
    harness.payments_stream.publish(completed).await.unwrap();

    timeout(Duration::from_secs(2), async {
        loop {
            let current = harness.service.get(booking.id).await.unwrap().unwrap();
            if current.status == BookingStatus::Confirmed {
                break;
            }
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("booking was not confirmed");

    // Give the second delivery time to be processed, then make sure it did
    // not emit a second confirmation.
    sleep(Duration::from_millis(100)).await;
    assert_eq!(harness.bookings_stream.last_seq().await.unwrap(), 2);
}

#[tokio::test]
async fn test_capacity_guard_rejects_without_publishing() {
    let harness = harness().await;
    let event_id = Uuid::new_v4();
    publish_listing(&harness, event_id, 2).await;

    let result = harness
        .service
        .create_booking(CreateBooking {
            quantity: 3,
            ..booking_request(event_id)
        })
        .await;

    assert!(matches!(
        result,
        Err(Error::CapacityExceeded {
            requested: 3,
            available: 2,
        })
    ));
    assert_eq!(harness.bookings_stream.last_seq().await.unwrap(), 0);
}

#[tokio::test]
async fn test_unknown_listing_rejects_without_publishing() {
    let harness = harness().await;

    let result = harness
        .service
        .create_booking(booking_request(Uuid::new_v4()))
        .await;

    assert!(matches!(result, Err(Error::UnknownEvent(_))));
    assert_eq!(harness.bookings_stream.last_seq().await.unwrap(), 0);
}

#[tokio::test]
async fn test_payment_for_unknown_booking_does_not_wedge_the_saga() {
    let harness = harness().await;
    let event_id = Uuid::new_v4();
    publish_listing(&harness, event_id, 10).await;

    // A completion for a booking this service never saw: warn and move on.
    harness
        .payments_stream
        .publish(PaymentEvent::Completed(PaymentCompleted::completed(
            Uuid::new_v4(),
            Uuid::new_v4(),
        )))
        .await
        .unwrap();

    let booking = harness
        .service
        .create_booking(booking_request(event_id))
        .await
        .unwrap();

    harness
        .payments_stream
        .publish(PaymentEvent::Completed(PaymentCompleted::completed(
            booking.id,
            booking.user_id,
        )))
        .await
        .unwrap();

    timeout(Duration::from_secs(2), async {
        loop {
            let current = harness.service.get(booking.id).await.unwrap().unwrap();
            if current.status == BookingStatus::Confirmed {
                break;
            }
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("the consumer stalled on the unknown booking");
}

#[tokio::test]
async fn test_out_of_order_update_is_a_miss_not_a_crash() {
    let harness = harness().await;
    let event_id = Uuid::new_v4();

    // An update for a listing whose create was never seen here.
    harness
        .catalog_stream
        .publish(CatalogEvent::Updated(listing(event_id, 5)))
        .await
        .unwrap();

    // The loop stays alive: the create that follows is applied.
    publish_listing(&harness, event_id, 10).await;

    let mirrored = harness
        .service
        .replica()
        .event(event_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(mirrored.available_tickets, 10);
}

#[tokio::test]
async fn test_request_payment_publishes_legacy_form() {
    let harness = harness().await;
    let event_id = Uuid::new_v4();
    publish_listing(&harness, event_id, 10).await;

    let booking = harness
        .service
        .create_booking(booking_request(event_id))
        .await
        .unwrap();

    harness.service.request_payment(booking.id).await.unwrap();
    assert_eq!(harness.payments_stream.last_seq().await.unwrap(), 1);

    let missing = harness.service.request_payment(Uuid::new_v4()).await;
    assert!(matches!(missing, Err(Error::NotFound(_))));
}
