use thiserror::Error;
use ticketline_store::StoreError;

/// Errors that can occur in this crate.
#[derive(Clone, Debug, Error)]
#[error("store error")]
pub struct Error;

impl StoreError for Error {}
