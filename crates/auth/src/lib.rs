//! The auth service core: a reconciled replica of user accounts.
//!
//! Credential issuance and verification live outside this crate; they read
//! the replica through [`UserReplica::user`] and
//! [`UserReplica::user_by_email`]. The replica itself is kept consistent
//! with the users service purely by consuming `user.*` events.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod auth_user;
mod error;
mod view;

pub use auth_user::AuthUser;
pub use error::Error;
pub use view::UserReplica;

use ticketline_events::{CodecError, UserEvent, subjects};
use ticketline_messaging::consumer::Consumer;
use ticketline_messaging::stream::Stream;
use ticketline_store::Store;

/// The consumer-name prefix this service registers under.
pub const SERVICE: &str = "auth";

/// Starts the three durable user listeners for the auth service, one per
/// subject (`auth-user-created`, `auth-user-updated`, `auth-user-deleted`).
///
/// Each subject gets its own consumer loop; ordering holds within a
/// subject, not across subjects, so the replica is written for
/// last-write-wins semantics.
///
/// # Errors
///
/// Returns an error if a consumer cannot be provisioned.
pub async fn start_listeners<S, US>(
    stream: &US,
    replica: &UserReplica<S>,
) -> Result<
    Vec<US::Consumer<UserReplica<S>>>,
    <US::Consumer<UserReplica<S>> as Consumer<
        UserReplica<S>,
        UserEvent,
        CodecError,
        CodecError,
    >>::Error,
>
where
    S: Store,
    US: Stream<UserEvent, CodecError, CodecError>,
{
    let mut consumers = Vec::with_capacity(3);
    for subject in [
        subjects::USER_CREATED,
        subjects::USER_UPDATED,
        subjects::USER_DELETED,
    ] {
        consumers.push(
            stream
                .start_consumer(SERVICE, subject, replica.clone())
                .await?,
        );
    }
    Ok(consumers)
}
