use serde::{Deserialize, Serialize};
use ticketline_events::{UserPayload, UserRole};
use uuid::Uuid;

/// The auth service's replica of a user account: just what credential
/// verification needs. The users service is authoritative; this copy is
/// only ever mutated by incoming `user.*` events.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct AuthUser {
    /// The cross-service user id, never regenerated locally.
    pub id: Uuid,

    /// The login email.
    pub email: String,

    /// The password hash to verify credentials against.
    pub password_hash: String,

    /// The authorization role.
    pub role: UserRole,
}

impl From<&UserPayload> for AuthUser {
    fn from(payload: &UserPayload) -> Self {
        Self {
            id: payload.id,
            email: payload.email.clone(),
            password_hash: payload.password.clone(),
            role: payload.role,
        }
    }
}
