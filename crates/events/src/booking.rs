use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ticketline_messaging::Routed;
use uuid::Uuid;

use crate::subjects;

/// Lifecycle state of a booking. A booking transitions exactly once, from
/// `Pending` to `Confirmed`, when its payment completes.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    /// Created, awaiting payment.
    Pending,
    /// Payment completed.
    Confirmed,
}

/// Wire payload for `booking.created`.
///
/// `email` and `title` are denormalized from the requesting user and the
/// mirrored listing so the notifications service can render the
/// confirmation without a further round trip.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingPayload {
    /// The cross-service booking id.
    pub id: Uuid,

    /// The booked event listing.
    pub event_id: Uuid,

    /// The requesting user.
    pub user_id: Uuid,

    /// The requesting user's email.
    pub email: String,

    /// The booked listing's title.
    pub title: String,

    /// Number of tickets booked.
    pub quantity: u32,

    /// Price fixed at creation from `price × quantity`, never recomputed.
    pub total_price: f64,

    /// The booking's lifecycle state at publication time.
    pub status: BookingStatus,

    /// When the booking was created.
    pub created_at: DateTime<Utc>,
}

/// Events published by the bookings service on the `BOOKINGS` stream.
///
/// The `booking.created` subject doubles as the confirmation signal: after
/// `payment.completed` the bookings service republishes the booking here
/// with `status: CONFIRMED`, and the notifications service reacts to that.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "subject", content = "data")]
pub enum BookingEvent {
    /// A booking was created or confirmed.
    #[serde(rename = "booking.created")]
    Created(BookingPayload),
}

impl Routed for BookingEvent {
    fn subject(&self) -> &'static str {
        match self {
            Self::Created(_) => subjects::BOOKING_CREATED,
        }
    }
}

impl TryFrom<Bytes> for BookingEvent {
    type Error = serde_json::Error;

    fn try_from(bytes: Bytes) -> Result<Self, Self::Error> {
        serde_json::from_slice(&bytes)
    }
}

impl TryInto<Bytes> for BookingEvent {
    type Error = serde_json::Error;

    fn try_into(self) -> Result<Bytes, Self::Error> {
        Ok(Bytes::from(serde_json::to_vec(&self)?))
    }
}
