//! The domain-event wire contract of the platform.
//!
//! One enum per event family, tagged by its dot-separated subject, with a
//! self-describing JSON envelope (`{"subject": …, "data": …}`). The codec
//! preserves every documented field even when a given consumer only reads a
//! subset, so new consumers can be added without touching producers.
//! Unknown fields inside `data` are ignored; unknown subjects fail decode.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Events owned by the bookings service.
pub mod booking;

/// Events owned by the catalog service.
pub mod catalog;

/// Events owned by the payments service.
pub mod payment;

/// The subjects every event family is routed on.
pub mod subjects;

/// Events owned by the users service.
pub mod user;

pub use booking::{BookingEvent, BookingPayload, BookingStatus};
pub use catalog::{CatalogEvent, EventDeleted, EventPayload};
pub use payment::{PaymentCompleted, PaymentEvent, PaymentRequested};
pub use user::{UserDeleted, UserEvent, UserPayload, UserRole};

/// The codec error shared by every event family.
pub type CodecError = serde_json::Error;
