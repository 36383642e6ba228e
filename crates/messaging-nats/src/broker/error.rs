use thiserror::Error;

/// Errors that can occur on the broker connection.
#[derive(Debug, Error)]
pub enum Error {
    /// The connection could not be established. Callers must not proceed
    /// past this; nothing is retried here.
    #[error("failed to connect to NATS")]
    Connect(#[source] async_nats::ConnectError),
}
