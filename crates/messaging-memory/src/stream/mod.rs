mod error;

pub use error::Error;

use std::error::Error as StdError;
use std::fmt::Debug;
use std::marker::PhantomData;

use async_trait::async_trait;
use bytes::Bytes;
use ticketline_messaging::consumer::Consumer;
use ticketline_messaging::consumer_handler::ConsumerHandler;
use ticketline_messaging::stream::Stream;
use ticketline_messaging::{Routed, Subject};

use crate::MemoryBroker;
use crate::consumer::MemoryConsumer;

/// An in-memory stream.
#[derive(Debug)]
pub struct MemoryStream<T, D, S>
where
    T: Routed
        + Clone
        + Debug
        + Send
        + Sync
        + TryFrom<Bytes, Error = D>
        + TryInto<Bytes, Error = S>
        + 'static,
    D: Debug + Send + StdError + Sync + 'static,
    S: Debug + Send + StdError + Sync + 'static,
{
    broker: MemoryBroker,
    name: String,
    _marker: PhantomData<(T, D, S)>,
}

impl<T, D, S> Clone for MemoryStream<T, D, S>
where
    T: Routed
        + Clone
        + Debug
        + Send
        + Sync
        + TryFrom<Bytes, Error = D>
        + TryInto<Bytes, Error = S>
        + 'static,
    D: Debug + Send + StdError + Sync + 'static,
    S: Debug + Send + StdError + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            broker: self.broker.clone(),
            name: self.name.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T, D, S> MemoryStream<T, D, S>
where
    T: Routed
        + Clone
        + Debug
        + Send
        + Sync
        + TryFrom<Bytes, Error = D>
        + TryInto<Bytes, Error = S>
        + 'static,
    D: Debug + Send + StdError + Sync + 'static,
    S: Debug + Send + StdError + Sync + 'static,
{
    /// Declaratively asserts the stream on the broker and returns a handle
    /// to it. Safe to call from multiple tasks; the first call creates the
    /// stream and the rest observe it.
    pub async fn ensure(
        broker: &MemoryBroker,
        name: impl Into<String>,
        subjects: &[&str],
    ) -> Self {
        let name = name.into();
        broker.ensure_stream(&name, subjects).await;

        Self {
            broker: broker.clone(),
            name,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<T, D, S> Stream<T, D, S> for MemoryStream<T, D, S>
where
    T: Routed
        + Clone
        + Debug
        + Send
        + Sync
        + TryFrom<Bytes, Error = D>
        + TryInto<Bytes, Error = S>
        + 'static,
    D: Debug + Send + StdError + Sync + 'static,
    S: Debug + Send + StdError + Sync + 'static,
{
    type Error = Error<S>;

    type Consumer<X>
        = MemoryConsumer<X, T, D, S>
    where
        X: ConsumerHandler<T>;

    fn name(&self) -> String {
        self.name.clone()
    }

    async fn publish(&self, event: T) -> Result<u64, Self::Error> {
        let subject = event.subject();
        let payload: Bytes = event.try_into().map_err(Error::Serialize)?;

        let seq = self.broker.append(&self.name, subject, payload).await?;

        Ok(seq)
    }

    async fn last_seq(&self) -> Result<u64, Self::Error> {
        self.broker
            .stream_len(&self.name)
            .await
            .ok_or_else(|| Error::UnknownStream(self.name.clone()))
    }

    async fn start_consumer<X>(
        &self,
        service: &str,
        subject: &str,
        handler: X,
    ) -> Result<Self::Consumer<X>, <Self::Consumer<X> as Consumer<X, T, D, S>>::Error>
    where
        X: ConsumerHandler<T>,
    {
        let subject = Subject::new(subject)?;

        MemoryConsumer::new(
            self.broker.clone(),
            self.name.clone(),
            subject.consumer_name(service),
            subject.as_str().to_string(),
            handler,
        )
        .await
    }
}
