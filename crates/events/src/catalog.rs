use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ticketline_messaging::Routed;
use uuid::Uuid;

use crate::subjects;

/// Wire payload for `event.created` and `event.updated`.
///
/// The full listing is published: the bookings service mirrors every field
/// to price bookings and enforce capacity without a round trip.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    /// The cross-service event id.
    pub id: Uuid,

    /// The listing title.
    pub title: String,

    /// The listing description.
    pub description: String,

    /// The ticket price.
    pub price: f64,

    /// When the event takes place.
    pub date: DateTime<Utc>,

    /// Remaining ticket capacity.
    pub available_tickets: u32,

    /// The id of the organizing user.
    pub organizer_id: Uuid,

    /// When the listing was created.
    pub created_at: DateTime<Utc>,
}

/// Wire payload for `event.deleted`.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDeleted {
    /// The cross-service event id.
    pub id: Uuid,
}

/// Events published by the catalog service on the `EVENTS` stream.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "subject", content = "data")]
pub enum CatalogEvent {
    /// A listing was created.
    #[serde(rename = "event.created")]
    Created(EventPayload),

    /// A listing was updated.
    #[serde(rename = "event.updated")]
    Updated(EventPayload),

    /// A listing was deleted.
    #[serde(rename = "event.deleted")]
    Deleted(EventDeleted),
}

impl Routed for CatalogEvent {
    fn subject(&self) -> &'static str {
        match self {
            Self::Created(_) => subjects::EVENT_CREATED,
            Self::Updated(_) => subjects::EVENT_UPDATED,
            Self::Deleted(_) => subjects::EVENT_DELETED,
        }
    }
}

impl TryFrom<Bytes> for CatalogEvent {
    type Error = serde_json::Error;

    fn try_from(bytes: Bytes) -> Result<Self, Self::Error> {
        serde_json::from_slice(&bytes)
    }
}

impl TryInto<Bytes> for CatalogEvent {
    type Error = serde_json::Error;

    fn try_into(self) -> Result<Bytes, Self::Error> {
        Ok(Bytes::from(serde_json::to_vec(&self)?))
    }
}
