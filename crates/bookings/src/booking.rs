use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ticketline_events::{BookingPayload, BookingStatus};
use uuid::Uuid;

/// A booking, authoritative in this service.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Booking {
    /// The cross-service booking id.
    pub id: Uuid,

    /// The booked listing.
    pub event_id: Uuid,

    /// The requesting user.
    pub user_id: Uuid,

    /// The requesting user's email, denormalized for notifications.
    pub email: String,

    /// The listing title, denormalized for notifications.
    pub title: String,

    /// Number of tickets booked.
    pub quantity: u32,

    /// Fixed at creation from `price × quantity`, never recomputed.
    pub total_price: f64,

    /// Lifecycle state; transitions exactly once, `Pending` → `Confirmed`.
    pub status: BookingStatus,

    /// When the booking was created.
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// The event payload published for this booking.
    #[must_use]
    pub fn payload(&self) -> BookingPayload {
        BookingPayload {
            id: self.id,
            event_id: self.event_id,
            user_id: self.user_id,
            email: self.email.clone(),
            title: self.title.clone(),
            quantity: self.quantity,
            total_price: self.total_price,
            status: self.status,
            created_at: self.created_at,
        }
    }
}

/// Fields accepted by the create command.
#[derive(Clone, Debug)]
pub struct CreateBooking {
    /// The requesting user.
    pub user_id: Uuid,

    /// The requesting user's email.
    pub email: String,

    /// The listing to book.
    pub event_id: Uuid,

    /// Number of tickets requested.
    pub quantity: u32,
}
