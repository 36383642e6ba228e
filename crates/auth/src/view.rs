use async_trait::async_trait;
use bytes::Bytes;
use ticketline_events::{UserEvent, UserPayload};
use ticketline_messaging::consumer_handler::ConsumerHandler;
use ticketline_store::Store;
use uuid::Uuid;

use crate::auth_user::AuthUser;
use crate::error::Error;

/// The store-backed user replica, updated by `user.*` events.
///
/// Reconciliation is idempotent: a create is an upsert, and an update or
/// delete for an id the replica never saw is a warning, not a failure: the
/// replica may legitimately lag the authoritative service. Applying the
/// same event twice leaves the replica exactly as one application would.
#[derive(Clone, Debug)]
pub struct UserReplica<S>
where
    S: Store,
{
    store: S,
}

impl<S> UserReplica<S>
where
    S: Store,
{
    /// Creates a replica over its store.
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Looks up a replicated user by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read or decoding fails.
    pub async fn user(&self, id: Uuid) -> Result<Option<AuthUser>, Error<S::Error>> {
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

    /// Looks up a replicated user by email, for the credential-verification
    /// collaborator.
    ///
    /// # Errors
    ///
    /// Returns an error if a store read or decoding fails.
    pub async fn user_by_email(&self, email: &str) -> Result<Option<AuthUser>, Error<S::Error>> {
        for key in self.store.keys().await.map_err(Error::Store)? {
            if let Some(bytes) = self.store.get(key).await.map_err(Error::Store)? {
                let user: AuthUser = serde_json::from_slice(&bytes)?;
                if user.email == email {
                    return Ok(Some(user));
                }
            }
        }
        Ok(None)
    }

    /// Create-or-replace by id.
    async fn upsert(&self, payload: &UserPayload) -> Result<(), Error<S::Error>> {
        let user = AuthUser::from(payload);
        self.store
            .put(
                user.id.to_string(),
                Bytes::from(serde_json::to_vec(&user)?),
            )
            .await
            .map_err(Error::Store)
    }

    async fn update(&self, payload: &UserPayload) -> Result<(), Error<S::Error>> {
        if self
            .store
            .get(payload.id.to_string())
            .await
            .map_err(Error::Store)?
            .is_none()
        {
            tracing::warn!(user_id = %payload.id, "user not found for update; replica may lag");
            return Ok(());
        }

        self.upsert(payload).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), Error<S::Error>> {
        if self
            .store
            .get(id.to_string())
            .await
            .map_err(Error::Store)?
            .is_none()
        {
            tracing::warn!(user_id = %id, "user already deleted or never seen");
            return Ok(());
        }

        self.store.del(id.to_string()).await.map_err(Error::Store)?;
        tracing::info!(user_id = %id, "user removed from replica");
        Ok(())
    }
}

#[async_trait]
impl<S> ConsumerHandler<UserEvent> for UserReplica<S>
where
    S: Store,
{
    type Error = Error<S::Error>;

    async fn handle(&self, event: UserEvent, _stream_sequence: u64) -> Result<(), Self::Error> {
        match event {
            UserEvent::Created(payload) => self.upsert(&payload).await,
            UserEvent::Updated(payload) => self.update(&payload).await,
            UserEvent::Deleted(deleted) => self.delete(deleted.id).await,
        }
    }
}
