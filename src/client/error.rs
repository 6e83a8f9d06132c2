//! Top-level typed error: every fallible boundary the producer crosses composes into
//! this enum via `#[from]`, layer by layer, from the wire codec up through the
//! connection and coordination modules.

use thiserror::Error;

use crate::connection;
use crate::status::{StatusCode, WireError};

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("connection error: {0}")]
    Connection(#[from] connection::Error),

    #[error("message rejected by broker: {0}")]
    Rejected(WireError),

    #[error("topic '{0}' is not known to the cluster")]
    UnknownTopic(String),

    #[error("retry attempts exhausted")]
    RetryExhausted,
}

impl Error {
    /// Coarse-grained [`StatusCode`] corresponding to this error.
    /// Wire-level rejections carry their own [`WireError`] (see [`Error::Rejected`]) and
    /// are not further distinguished at this level; they still count as "non-OK" for
    /// `Producer::status`.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Connection(connection::Error::Coordination(_)) => StatusCode::CoordinationInitError,
            Self::Connection(connection::Error::MetadataUnavailable) => StatusCode::MetadataError,
            Self::Connection(_) => StatusCode::BrokerInitError,
            Self::Rejected(_) | Self::UnknownTopic(_) => StatusCode::Unknown,
            Self::RetryExhausted => StatusCode::RetryExhausted,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
