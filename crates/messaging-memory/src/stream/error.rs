use std::error::Error as StdError;
use std::fmt::Debug;

use thiserror::Error;
use ticketline_messaging::stream::StreamError;

use crate::AppendError;

/// Error type for in-memory stream operations.
#[derive(Debug, Error)]
pub enum Error<S>
where
    S: Debug + Send + StdError + Sync + 'static,
{
    /// The event could not be encoded.
    #[error("failed to encode event: {0}")]
    Serialize(S),

    /// The stream has not been provisioned.
    #[error("stream {0} does not exist")]
    UnknownStream(String),

    /// The subject is not bound to the stream.
    #[error("subject {subject} is not bound to stream {stream}")]
    SubjectNotBound {
        /// The stream the publish targeted.
        stream: String,
        /// The event's subject.
        subject: String,
    },
}

impl<S> From<AppendError> for Error<S>
where
    S: Debug + Send + StdError + Sync + 'static,
{
    fn from(err: AppendError) -> Self {
        match err {
            AppendError::UnknownStream(stream) => Self::UnknownStream(stream),
            AppendError::SubjectNotBound { stream, subject } => {
                Self::SubjectNotBound { stream, subject }
            }
        }
    }
}

impl<S> StreamError for Error<S> where S: Debug + Send + StdError + Sync + 'static {}
