use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ticketline_messaging::Routed;
use uuid::Uuid;

use crate::subjects;

/// Wire payload for `payment.requested` (legacy direct form).
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequested {
    /// The booking awaiting payment.
    pub booking_id: Uuid,

    /// The paying user.
    pub user_id: Uuid,
}

/// Wire payload for `payment.completed`.
///
/// Two shapes exist in the wild: a minimal `{bookingId}` and the richer
/// variant below. `booking_id` is the only required field; consumers read
/// only what they recognize. Publishers in this repository emit the rich
/// form.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCompleted {
    /// The paid booking.
    pub booking_id: Uuid,

    /// The paying user, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,

    /// The payment outcome, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// When the payment completed, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl PaymentCompleted {
    /// The rich form emitted by this platform's payments service.
    #[must_use]
    pub fn completed(booking_id: Uuid, user_id: Uuid) -> Self {
        Self {
            booking_id,
            user_id: Some(user_id),
            status: Some("COMPLETED".to_string()),
            timestamp: Some(Utc::now()),
        }
    }
}

/// Events on the `PAYMENTS` stream.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "subject", content = "data")]
pub enum PaymentEvent {
    /// Payment processing was requested for a booking.
    #[serde(rename = "payment.requested")]
    Requested(PaymentRequested),

    /// Payment completed for a booking.
    #[serde(rename = "payment.completed")]
    Completed(PaymentCompleted),
}

impl Routed for PaymentEvent {
    fn subject(&self) -> &'static str {
        match self {
            Self::Requested(_) => subjects::PAYMENT_REQUESTED,
            Self::Completed(_) => subjects::PAYMENT_COMPLETED,
        }
    }
}

impl TryFrom<Bytes> for PaymentEvent {
    type Error = serde_json::Error;

    fn try_from(bytes: Bytes) -> Result<Self, Self::Error> {
        serde_json::from_slice(&bytes)
    }
}

impl TryInto<Bytes> for PaymentEvent {
    type Error = serde_json::Error;

    fn try_into(self) -> Result<Bytes, Self::Error> {
        Ok(Bytes::from(serde_json::to_vec(&self)?))
    }
}
