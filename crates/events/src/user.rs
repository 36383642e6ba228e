use bytes::Bytes;
use serde::{Deserialize, Serialize};
use ticketline_messaging::Routed;
use uuid::Uuid;

use crate::subjects;

/// The authorization role attached to a user account.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Platform administrator.
    Admin,
    /// Regular account.
    User,
}

/// Wire payload for `user.created` and `user.updated`.
///
/// Carries exactly the fields other services depend on: auth verifies
/// credentials against `email`/`password` and authorizes with `role`.
/// Everything else the users service stores stays private to it.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    /// The cross-service user id.
    pub id: Uuid,

    /// The login email.
    pub email: String,

    /// The password hash as produced by the users service, never a
    /// clear-text password.
    pub password: String,

    /// The authorization role.
    pub role: UserRole,
}

/// Wire payload for `user.deleted`.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDeleted {
    /// The cross-service user id.
    pub id: Uuid,
}

/// Events published by the users service on the `USERS` stream.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "subject", content = "data")]
pub enum UserEvent {
    /// A user account was created.
    #[serde(rename = "user.created")]
    Created(UserPayload),

    /// A user account was updated.
    #[serde(rename = "user.updated")]
    Updated(UserPayload),

    /// A user account was deleted.
    #[serde(rename = "user.deleted")]
    Deleted(UserDeleted),
}

impl Routed for UserEvent {
    fn subject(&self) -> &'static str {
        match self {
            Self::Created(_) => subjects::USER_CREATED,
            Self::Updated(_) => subjects::USER_UPDATED,
            Self::Deleted(_) => subjects::USER_DELETED,
        }
    }
}

impl TryFrom<Bytes> for UserEvent {
    type Error = serde_json::Error;

    fn try_from(bytes: Bytes) -> Result<Self, Self::Error> {
        serde_json::from_slice(&bytes)
    }
}

impl TryInto<Bytes> for UserEvent {
    type Error = serde_json::Error;

    fn try_into(self) -> Result<Bytes, Self::Error> {
        Ok(Bytes::from(serde_json::to_vec(&self)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> UserPayload {
        UserPayload {
            id: Uuid::new_v4(),
            email: "ada@example.com".to_string(),
            password: "$2b$10$abcdefghijklmnopqrstuv".to_string(),
            role: UserRole::User,
        }
    }

    #[test]
    fn test_round_trip() {
        for event in [
            UserEvent::Created(sample()),
            UserEvent::Updated(sample()),
            UserEvent::Deleted(UserDeleted { id: Uuid::new_v4() }),
        ] {
            let bytes: Bytes = event.clone().try_into().unwrap();
            let decoded = UserEvent::try_from(bytes).unwrap();
            assert_eq!(decoded, event);
        }
    }

    #[test]
    fn test_subjects() {
        assert_eq!(UserEvent::Created(sample()).subject(), "user.created");
        assert_eq!(UserEvent::Updated(sample()).subject(), "user.updated");
        assert_eq!(
            UserEvent::Deleted(UserDeleted { id: Uuid::new_v4() }).subject(),
            "user.deleted"
        );
    }

    #[test]
    fn test_unknown_subject_fails_decode() {
        let bytes = Bytes::from_static(br#"{"subject":"user.archived","data":{}}"#);
        assert!(UserEvent::try_from(bytes).is_err());
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let id = Uuid::new_v4();
        let raw = format!(
            r#"{{"subject":"user.created","data":{{"id":"{id}","email":"a@b.c","password":"h","role":"ADMIN","firstname":"Ada"}}}}"#
        );
        let decoded = UserEvent::try_from(Bytes::from(raw)).unwrap();
        let UserEvent::Created(payload) = decoded else {
            panic!("expected user.created");
        };
        assert_eq!(payload.id, id);
        assert_eq!(payload.role, UserRole::Admin);
    }
}
