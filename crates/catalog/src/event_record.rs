use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ticketline_events::EventPayload;
use uuid::Uuid;

/// An event listing, authoritative in this service.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct EventRecord {
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

    /// The organizing user.
    pub organizer_id: Uuid,

    /// When the listing was created.
    pub created_at: DateTime<Utc>,
}

impl EventRecord {
    /// The event payload published for this listing. Every field goes out:
    /// the bookings service mirrors the full record.
    #[must_use]
    pub fn payload(&self) -> EventPayload {
        EventPayload {
            id: self.id,
            title: self.title.clone(),
            description: self.description.clone(),
            price: self.price,
            date: self.date,
            available_tickets: self.available_tickets,
            organizer_id: self.organizer_id,
            created_at: self.created_at,
        }
    }
}

/// Fields accepted by the create command.
#[derive(Clone, Debug)]
pub struct CreateEvent {
    /// Listing title.
    pub title: String,

    /// Listing description.
    pub description: String,

    /// Ticket price.
    pub price: f64,

    /// When the event takes place.
    pub date: DateTime<Utc>,

    /// Initial ticket capacity.
    pub available_tickets: u32,

    /// The organizing user.
    pub organizer_id: Uuid,
}

/// Fields accepted by the update command; `None` leaves a field unchanged.
#[derive(Clone, Debug, Default)]
pub struct UpdateEvent {
    /// New title.
    pub title: Option<String>,

    /// New description.
    pub description: Option<String>,

    /// New ticket price.
    pub price: Option<f64>,

    /// New date.
    pub date: Option<DateTime<Utc>>,

    /// New remaining capacity.
    pub available_tickets: Option<u32>,
}
