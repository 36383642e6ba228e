use thiserror::Error;
use ticketline_messaging::consumer_handler::ConsumerHandlerError;
use ticketline_messaging::stream::StreamError;

/// Errors that can occur in this crate.
#[derive(Debug, Error)]
pub enum Error<STE>
where
    STE: StreamError,
{
    /// Errors passed through from the event stream.
    #[error(transparent)]
    Stream(STE),
}

impl<STE> ConsumerHandlerError for Error<STE> where STE: StreamError {}
