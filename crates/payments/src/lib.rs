//! The payments service core.
//!
//! Payment processing itself is simulated; the provider integration is an
//! external collaborator. The service publishes `payment.completed` (rich
//! shape) when a payment goes through, either via its own command or via
//! the durable consumer on the legacy `payment.requested` form.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::Error;

use std::time::Duration;

use async_trait::async_trait;
use ticketline_events::{CodecError, PaymentCompleted, PaymentEvent, subjects};
use ticketline_messaging::consumer::Consumer;
use ticketline_messaging::consumer_handler::ConsumerHandler;
use ticketline_messaging::stream::Stream;
use uuid::Uuid;

/// The consumer-name prefix this service registers under.
pub const SERVICE: &str = "payments";

/// The payments service.
#[derive(Clone, Debug)]
pub struct PaymentService<PS>
where
    PS: Stream<PaymentEvent, CodecError, CodecError>,
{
    stream: PS,
    processing_delay: Duration,
}

impl<PS> PaymentService<PS>
where
    PS: Stream<PaymentEvent, CodecError, CodecError>,
{
    /// Creates the service over the `PAYMENTS` stream.
    pub const fn new(stream: PS) -> Self {
        Self {
            stream,
            processing_delay: Duration::ZERO,
        }
    }

    /// Sets a simulated provider round-trip delay, applied before each
    /// completion is published.
    #[must_use]
    pub const fn with_processing_delay(mut self, delay: Duration) -> Self {
        self.processing_delay = delay;
        self
    }

    /// Processes a payment for a booking and announces the completion on
    /// `payment.completed`.
    ///
    /// # Errors
    ///
    /// Returns an error if the publish fails; the caller sees a failed
    /// command and nothing downstream converges until it retries.
    pub async fn process_payment(
        &self,
        booking_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), Error<PS::Error>> {
        if !self.processing_delay.is_zero() {
            tokio::time::sleep(self.processing_delay).await;
        }

        self.stream
            .publish(PaymentEvent::Completed(PaymentCompleted::completed(
                booking_id, user_id,
            )))
            .await
            .map_err(Error::Stream)?;

        tracing::info!(booking_id = %booking_id, "payment completed");

        Ok(())
    }

    /// Starts the durable consumer on the legacy `payment.requested` form
    /// (`payments-payment-requested`).
    ///
    /// # Errors
    ///
    /// Returns an error if the consumer cannot be provisioned.
    pub async fn start_request_listener(
        &self,
    ) -> Result<
        PS::Consumer<Self>,
        <PS::Consumer<Self> as Consumer<Self, PaymentEvent, CodecError, CodecError>>::Error,
    > {
        self.stream
            .start_consumer(SERVICE, subjects::PAYMENT_REQUESTED, self.clone())
            .await
    }
}

#[async_trait]
impl<PS> ConsumerHandler<PaymentEvent> for PaymentService<PS>
where
    PS: Stream<PaymentEvent, CodecError, CodecError>,
{
    type Error = Error<PS::Error>;

    async fn handle(&self, event: PaymentEvent, _stream_sequence: u64) -> Result<(), Self::Error> {
        match event {
            PaymentEvent::Requested(requested) => {
                tracing::info!(booking_id = %requested.booking_id, "processing requested payment");
                self.process_payment(requested.booking_id, requested.user_id)
                    .await
            }
            PaymentEvent::Completed(completed) => {
                // Our own completions live on the same stream; the consumer
                // filter keeps them away.
                tracing::debug!(booking_id = %completed.booking_id, "ignoring payment.completed");
                Ok(())
            }
        }
    }
}
