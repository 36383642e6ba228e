mod error;

pub use error::Error;

use std::sync::Arc;

use async_nats::Client;
use async_nats::jetstream::Context;
use tokio::sync::OnceCell;

/// Default broker URL when `NATS_URL` is unset.
const DEFAULT_URL: &str = "nats://localhost:4222";

/// The process's single broker connection, established lazily.
///
/// Constructing the handle does not connect. The first call to
/// [`client`](Self::client) opens the connection and memoizes it; every
/// later call, from any consumer loop or publisher, concurrently,
/// returns the same connection. A failed connect caches nothing, so the
/// next call tries again.
///
/// The handle is explicitly owned and passed into the components that need
/// it rather than living in process-global state; cloning shares the
/// underlying connection cell.
#[derive(Clone, Debug)]
pub struct NatsBroker {
    url: String,
    client: Arc<OnceCell<Client>>,
}

impl NatsBroker {
    /// Creates a handle for the broker at `url` without connecting.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: Arc::new(OnceCell::new()),
        }
    }

    /// Creates a handle from the `NATS_URL` environment variable, falling
    /// back to `nats://localhost:4222`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(std::env::var("NATS_URL").unwrap_or_else(|_| DEFAULT_URL.to_string()))
    }

    /// The broker URL this handle connects to.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The shared connection, opened on first use.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connect`] if the broker is unreachable.
    pub async fn client(&self) -> Result<Client, Error> {
        let client = self
            .client
            .get_or_try_init(|| async {
                let client = async_nats::connect(&self.url).await?;
                tracing::info!(url = %self.url, "connected to NATS");
                Ok::<_, async_nats::ConnectError>(client)
            })
            .await
            .map_err(Error::Connect)?;

        Ok(client.clone())
    }

    /// A JetStream context over the shared connection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connect`] if the broker is unreachable.
    pub async fn jetstream(&self) -> Result<Context, Error> {
        Ok(async_nats::jetstream::new(self.client().await?))
    }
}
