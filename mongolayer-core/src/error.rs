//! Error types and result types for database handle operations.
//!
//! Every fallible operation in mongolayer returns [`MongoResult<T>`]. The
//! driver's own failures are kept as the `source` of [`MongoError::Driver`]
//! so callers can still walk the full cause chain.

use std::{error::Error as StdError, time::Duration};

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// A boxed error from the underlying driver.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Represents all possible errors returned by a database handle.
#[derive(Error, Debug)]
pub enum MongoError {
    /// The handle has no live client, either because it was never connected
    /// or because it has been disconnected.
    #[error("DB is not connected")]
    NotConnected,
    /// No document matched the filter in the given collection.
    #[error("Document is not found in collection {0}")]
    NotFound(String),
    /// An argument did not have the required shape.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// A write was rejected because it would duplicate a unique key.
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),
    /// The operation did not complete within its time bound.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),
    /// Encoding to or decoding from BSON failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// The connection options are invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// The client could not be created or did not answer the initial ping.
    #[error("Connection error: {0}")]
    Connection(#[source] BoxError),
    /// Any other failure reported by the driver.
    #[error("Driver error: {0}")]
    Driver(#[source] BoxError),
}

/// A specialized `Result` type for database handle operations.
pub type MongoResult<T> = Result<T, MongoError>;

impl MongoError {
    /// Wraps a driver error, preserving it as the source.
    pub fn driver<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        MongoError::Driver(Box::new(err))
    }

    /// Wraps a connection failure, preserving it as the source.
    pub fn connection<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        MongoError::Connection(Box::new(err))
    }

    pub fn is_not_connected(&self) -> bool {
        matches!(self, MongoError::NotConnected)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, MongoError::NotFound(_))
    }

    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, MongoError::DuplicateKey(_))
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, MongoError::InvalidArgument(_))
    }
}

impl From<BsonError> for MongoError {
    fn from(err: BsonError) -> Self {
        MongoError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for MongoError {
    fn from(err: SerdeJsonError) -> Self {
        MongoError::Configuration(err.to_string())
    }
}
