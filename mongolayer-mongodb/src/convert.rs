//! Conversions between mongolayer types and driver types.

use std::{future::IntoFuture, time::Duration};

use mongodb::{
    error::{Error as DriverError, ErrorKind, WriteFailure},
    options::{ClientOptions, ReadPreference, SelectionCriteria},
};
use mongolayer_core::{
    error::{MongoError, MongoResult},
    options::MongoOptions,
    read_pref::ReadMode,
};

/// Server error code for a unique index violation.
pub const DUPLICATE_KEY_CODE: i32 = 11000;

/// Maps a read mode onto the driver's read preference.
pub fn read_preference(mode: ReadMode) -> ReadPreference {
    match mode {
        ReadMode::Primary => ReadPreference::Primary,
        ReadMode::PrimaryPreferred => ReadPreference::PrimaryPreferred { options: Default::default() },
        ReadMode::Secondary => ReadPreference::Secondary { options: Default::default() },
        ReadMode::SecondaryPreferred => ReadPreference::SecondaryPreferred { options: Default::default() },
        ReadMode::Nearest => ReadPreference::Nearest { options: Default::default() },
    }
}

/// Parses the connection string and overlays the remaining options on it.
pub async fn client_options(options: &MongoOptions) -> MongoResult<ClientOptions> {
    let mut client_options = ClientOptions::parse(options.uri())
        .await
        .map_err(|e| MongoError::Configuration(e.to_string()))?;

    client_options.connect_timeout = Some(options.connect_timeout());
    client_options.server_selection_timeout = Some(options.connect_timeout());
    if let Some(size) = options.max_pool_size() {
        client_options.max_pool_size = Some(size);
    }
    client_options.selection_criteria = Some(SelectionCriteria::ReadPreference(read_preference(options.read_mode())));

    Ok(client_options)
}

pub(crate) fn is_duplicate_key(err: &DriverError) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY_CODE,
        ErrorKind::InsertMany(e) => e
            .write_errors
            .as_ref()
            .is_some_and(|errors| errors.iter().any(|e| e.code == DUPLICATE_KEY_CODE)),
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}

/// Normalizes a driver error into the mongolayer taxonomy.
pub(crate) fn translate_error(err: DriverError) -> MongoError {
    if is_duplicate_key(&err) {
        MongoError::DuplicateKey(err.to_string())
    } else {
        MongoError::driver(err)
    }
}

/// The `maxTimeMS` sent to the server for a limit. Zero means no limit.
pub(crate) fn server_max_time(limit: Duration) -> Option<Duration> {
    (!limit.is_zero()).then_some(limit)
}

/// Runs a driver call under `limit`. A zero limit does not bound the call.
pub(crate) async fn bounded<T, F>(limit: Duration, call: F) -> MongoResult<T>
where
    F: IntoFuture<Output = mongodb::error::Result<T>>,
{
    bounded_scope(limit, async { call.await.map_err(translate_error) }).await
}

/// Runs a sequence of calls that already produce mongolayer errors under `limit`.
pub(crate) async fn bounded_scope<T, F>(limit: Duration, scope: F) -> MongoResult<T>
where
    F: IntoFuture<Output = MongoResult<T>>,
{
    if limit.is_zero() {
        return scope.await;
    }

    tokio::time::timeout(limit, scope)
        .await
        .unwrap_or(Err(MongoError::Timeout(limit)))
}
