/// `user.created`: users service announces a new account.
pub const USER_CREATED: &str = "user.created";

/// `user.updated`: users service announces an account change.
pub const USER_UPDATED: &str = "user.updated";

/// `user.deleted`: users service announces an account removal.
pub const USER_DELETED: &str = "user.deleted";

/// `event.created`: catalog service announces a new event listing.
pub const EVENT_CREATED: &str = "event.created";

/// `event.updated`: catalog service announces a listing change.
pub const EVENT_UPDATED: &str = "event.updated";

/// `event.deleted`: catalog service announces a listing removal.
pub const EVENT_DELETED: &str = "event.deleted";

/// `booking.created`: bookings service announces a booking; also reused
/// as the confirmation signal with `status: CONFIRMED`.
pub const BOOKING_CREATED: &str = "booking.created";

/// `payment.requested`: bookings service requests payment processing
/// (legacy direct form).
pub const PAYMENT_REQUESTED: &str = "payment.requested";

/// `payment.completed`: payments service announces a completed payment.
pub const PAYMENT_COMPLETED: &str = "payment.completed";

/// The stream owning `user.*`.
pub const USERS_STREAM: &str = "USERS";

/// The stream owning `event.*`.
pub const EVENTS_STREAM: &str = "EVENTS";

/// The stream owning `booking.*`.
pub const BOOKINGS_STREAM: &str = "BOOKINGS";

/// The stream owning `payment.*`.
pub const PAYMENTS_STREAM: &str = "PAYMENTS";
