use serde::{Deserialize, Serialize};
use ticketline_events::{UserPayload, UserRole};
use uuid::Uuid;

/// A user account, authoritative in this service.
///
/// `first_name` and `last_name` never leave the service: the wire payload
/// carries only the fields other services are documented to depend on.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct User {
    /// The cross-service user id.
    pub id: Uuid,

    /// Given name, private to this service.
    pub first_name: String,

    /// Family name, private to this service.
    pub last_name: String,

    /// The login email.
    pub email: String,

    /// The password hash. Hashing happens in the credential collaborator
    /// before a command reaches this service.
    pub password_hash: String,

    /// The authorization role.
    pub role: UserRole,
}

impl User {
    /// The event payload published for this user: exactly the documented
    /// fields, nothing more.
    #[must_use]
    pub fn payload(&self) -> UserPayload {
        UserPayload {
            id: self.id,
            email: self.email.clone(),
            password: self.password_hash.clone(),
            role: self.role,
        }
    }
}

/// Fields accepted by the create/register commands.
#[derive(Clone, Debug)]
pub struct CreateUser {
    /// Given name.
    pub first_name: String,

    /// Family name.
    pub last_name: String,

    /// Login email.
    pub email: String,

    /// Pre-hashed password.
    pub password_hash: String,

    /// Authorization role.
    pub role: UserRole,
}

/// Fields accepted by the update command; `None` leaves a field unchanged.
#[derive(Clone, Debug, Default)]
pub struct UpdateUser {
    /// New given name.
    pub first_name: Option<String>,

    /// New family name.
    pub last_name: Option<String>,

    /// New login email.
    pub email: Option<String>,

    /// New pre-hashed password.
    pub password_hash: Option<String>,

    /// New authorization role.
    pub role: Option<UserRole>,
}
