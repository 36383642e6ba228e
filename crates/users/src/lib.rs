//! The users service core: authoritative over user accounts.
//!
//! Commands mutate the local store first, then publish `user.*` events the
//! auth service reconciles its replica from. The HTTP layer and password
//! hashing live outside this crate; commands receive validated input with
//! credentials already hashed.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;
mod user;

pub use error::Error;
pub use user::{CreateUser, UpdateUser, User};

use bytes::Bytes;
use ticketline_events::{CodecError, UserDeleted, UserEvent};
use ticketline_messaging::stream::Stream;
use ticketline_store::Store;
use uuid::Uuid;

/// The consumer-name prefix this service registers under.
pub const SERVICE: &str = "users";

/// The users service.
///
/// Generic over its two collaborators: the store holding the authoritative
/// user records and the stream carrying `user.*` events.
#[derive(Clone, Debug)]
pub struct UserService<S, US>
where
    S: Store,
    US: Stream<UserEvent, CodecError, CodecError>,
{
    store: S,
    stream: US,
}

impl<S, US> UserService<S, US>
where
    S: Store,
    US: Stream<UserEvent, CodecError, CodecError>,
{
    /// Creates the service over its collaborators.
    pub const fn new(store: S, stream: US) -> Self {
        Self { store, stream }
    }

    /// Creates a user and announces it on `user.created`.
    ///
    /// The store write commits before the publish. If the publish fails the
    /// error surfaces to the caller with the mutation already committed;
    /// recovery (compensation or republication) is the caller's decision.
    ///
    /// # Errors
    ///
    /// Returns an error if the store write or the publish fails.
    pub async fn register(
        &self,
        params: CreateUser,
    ) -> Result<User, Error<S::Error, US::Error>> {
        let user = User {
            id: Uuid::new_v4(),
            first_name: params.first_name,
            last_name: params.last_name,
            email: params.email,
            password_hash: params.password_hash,
            role: params.role,
        };

        self.store
            .put(user.id.to_string(), Bytes::from(serde_json::to_vec(&user)?))
            .await
            .map_err(Error::Store)?;

        self.stream
            .publish(UserEvent::Created(user.payload()))
            .await
            .map_err(Error::Stream)?;

        tracing::info!(user_id = %user.id, "user registered");

        Ok(user)
    }

    /// Applies a partial update and announces it on `user.updated`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id, or an error if the
    /// store write or the publish fails.
    pub async fn update(
        &self,
        id: Uuid,
        changes: UpdateUser,
    ) -> Result<User, Error<S::Error, US::Error>> {
        let mut user = self.get(id).await?.ok_or(Error::NotFound(id))?;

        if let Some(first_name) = changes.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = changes.last_name {
            user.last_name = last_name;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(password_hash) = changes.password_hash {
            user.password_hash = password_hash;
        }
        if let Some(role) = changes.role {
            user.role = role;
        }

        self.store
            .put(user.id.to_string(), Bytes::from(serde_json::to_vec(&user)?))
            .await
            .map_err(Error::Store)?;

        self.stream
            .publish(UserEvent::Updated(user.payload()))
            .await
            .map_err(Error::Stream)?;

        Ok(user)
    }

    /// Deletes a user and announces it on `user.deleted`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id, or an error if the
    /// store write or the publish fails.
    pub async fn delete(&self, id: Uuid) -> Result<(), Error<S::Error, US::Error>> {
        if self.get(id).await?.is_none() {
            return Err(Error::NotFound(id));
        }

        self.store.del(id.to_string()).await.map_err(Error::Store)?;

        self.stream
            .publish(UserEvent::Deleted(UserDeleted { id }))
            .await
            .map_err(Error::Stream)?;

        tracing::info!(user_id = %id, "user deleted");

        Ok(())
    }

    /// Fetches one user.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read or decoding fails.
    pub async fn get(&self, id: Uuid) -> Result<Option<User>, Error<S::Error, US::Error>> {
        let Some(bytes) = self
            .store
            .get(id.to_string())
            .await
            .map_err(Error::Store)?
        else {
            return Ok(None);
        };

        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Lists every user.
    ///
    /// # Errors
    ///
    /// Returns an error if a store read or decoding fails.
    pub async fn list(&self) -> Result<Vec<User>, Error<S::Error, US::Error>> {
        let mut users = Vec::new();
        for key in self.store.keys().await.map_err(Error::Store)? {
            if let Some(bytes) = self.store.get(key).await.map_err(Error::Store)? {
                users.push(serde_json::from_slice(&bytes)?);
            }
        }
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ticketline_events::UserRole;
    use ticketline_messaging_memory::{MemoryBroker, MemoryStream};
    use ticketline_store_memory::MemoryStore;

    type TestStream = MemoryStream<UserEvent, CodecError, CodecError>;

    async fn service() -> (UserService<MemoryStore, TestStream>, TestStream) {
        let broker = MemoryBroker::new();
        let stream = TestStream::ensure(&broker, "USERS", &["user.*"]).await;
        (
            UserService::new(MemoryStore::new(), stream.clone()),
            stream,
        )
    }

    fn ada() -> CreateUser {
        CreateUser {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "$2b$10$abcdefghijklmnopqrstuv".to_string(),
            role: UserRole::User,
        }
    }

    #[tokio::test]
    async fn test_register_stores_and_publishes() {
        let (service, stream) = service().await;

        let user = service.register(ada()).await.unwrap();

        assert_eq!(service.get(user.id).await.unwrap(), Some(user.clone()));
        assert_eq!(stream.last_seq().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_changes_only_given_fields() {
        let (service, stream) = service().await;
        let user = service.register(ada()).await.unwrap();

        let updated = service
            .update(
                user.id,
                UpdateUser {
                    email: Some("countess@example.com".to_string()),
                    ..UpdateUser::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.email, "countess@example.com");
        assert_eq!(updated.first_name, "Ada");
        assert_eq!(stream.last_seq().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_update_unknown_user_is_not_found() {
        let (service, stream) = service().await;

        let result = service.update(Uuid::new_v4(), UpdateUser::default()).await;

        assert!(matches!(result, Err(Error::NotFound(_))));
        assert_eq!(stream.last_seq().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_removes_and_publishes() {
        let (service, stream) = service().await;
        let user = service.register(ada()).await.unwrap();

        service.delete(user.id).await.unwrap();

        assert_eq!(service.get(user.id).await.unwrap(), None);
        assert_eq!(stream.last_seq().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_payload_excludes_private_fields() {
        let (service, _stream) = service().await;
        let user = service.register(ada()).await.unwrap();

        let raw = serde_json::to_value(user.payload()).unwrap();
        assert!(raw.get("firstName").is_none());
        assert!(raw.get("lastName").is_none());
        assert_eq!(raw["email"], "ada@example.com");
    }
}
