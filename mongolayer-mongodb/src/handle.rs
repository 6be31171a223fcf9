//! The database handle and its connection lifecycle.
//!
//! A [`MongoHandle`] moves through three states: uninitialized (built with
//! [`MongoHandle::new`], no client), connected, and disconnected. The first and
//! last are the same as far as operations are concerned: every operation
//! checks for a live client first and fails with
//! [`MongoError::NotConnected`] without touching the driver.

use std::time::Duration;

use bson::{Document, doc};
use mongodb::{Client, Collection};
use mongolayer_core::{
    error::{MongoError, MongoResult},
    options::{MongoOptions, set_max_pool_size, set_preferred, set_timeout, set_uri},
    read_pref::ReadMode,
    timeout::{DEFAULT_QUERY_TIMEOUT, QueryTimeout},
};

use crate::convert::{bounded, client_options};

/// Connect timeout used when a caller asks for less than a second.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
/// Pool size used by the URI constructors.
pub const DEFAULT_POOL_SIZE: u32 = 20;

/// A handle to one database of a MongoDB deployment.
///
/// # Example
///
/// ```ignore
/// use mongolayer::prelude::*;
///
/// let handle = MongoHandle::connect(MongoOptions::combine([
///     set_uri("mongodb://127.0.0.1:27017"),
///     set_db_name("orders"),
///     set_preferred(ReadMode::Primary),
/// ]))
/// .await?;
///
/// handle.insert_one("coll", &Data { id: "a".into(), data: 1 }).await?;
/// let found: Data = handle.find_by_id("coll", "a").await?;
/// ```
#[derive(Debug)]
pub struct MongoHandle {
    client: Option<Client>,
    options: MongoOptions,
    pub(crate) query_timeout: QueryTimeout,
}

impl MongoHandle {
    /// Creates a handle that has not connected yet.
    pub fn new(options: MongoOptions) -> Self {
        Self {
            client: None,
            options,
            query_timeout: QueryTimeout::default(),
        }
    }

    /// Wraps a client that was built elsewhere. The client is not pinged.
    pub fn from_client(client: Client, options: MongoOptions) -> Self {
        Self {
            client: Some(client),
            ..Self::new(options)
        }
    }

    /// Connects with the given options and confirms the server answers.
    pub async fn connect(options: MongoOptions) -> MongoResult<Self> {
        let mut handle = Self::new(options);
        handle.reconnect().await?;

        Ok(handle)
    }

    /// Connects to `uri` with the default read mode.
    pub async fn connect_uri(uri: &str) -> MongoResult<Self> {
        Self::connect_uri_with_mode(uri, ReadMode::default()).await
    }

    /// Connects to `uri` with the given read mode, a pool of
    /// [`DEFAULT_POOL_SIZE`] and a 30 second connect timeout.
    pub async fn connect_uri_with_mode(uri: &str, mode: ReadMode) -> MongoResult<Self> {
        Self::connect(MongoOptions::combine([
            set_uri(uri),
            set_preferred(mode),
            set_timeout(DEFAULT_QUERY_TIMEOUT),
            set_max_pool_size(DEFAULT_POOL_SIZE),
        ]))
        .await
    }

    /// Connects to `uri` with an explicit connect timeout. Timeouts under one
    /// second are replaced by [`DEFAULT_CONNECT_TIMEOUT`].
    pub async fn connect_with_timeout(uri: &str, timeout: Duration, mode: ReadMode) -> MongoResult<Self> {
        let timeout = if timeout < Duration::from_secs(1) {
            DEFAULT_CONNECT_TIMEOUT
        } else {
            timeout
        };

        Self::connect(MongoOptions::combine([
            set_uri(uri),
            set_timeout(timeout),
            set_preferred(mode),
            set_max_pool_size(DEFAULT_POOL_SIZE),
        ]))
        .await
    }

    /// Builds a new client from the stored options if the handle has none.
    pub async fn reconnect(&mut self) -> MongoResult<()> {
        if self.client.is_some() {
            return Ok(());
        }

        let client = Client::with_options(client_options(&self.options).await?)
            .map_err(MongoError::connection)?;

        let limit = self.options.connect_timeout();
        match tokio::time::timeout(limit, client.database("admin").run_command(doc! { "ping": 1 })).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(MongoError::connection(e)),
            Err(_) => return Err(MongoError::Timeout(limit)),
        }

        tracing::info!(
            "Connected to MongoDB database {} (read mode {})",
            self.options.db_name(),
            self.options.read_mode()
        );
        self.client = Some(client);

        Ok(())
    }

    /// Shuts the client down. Does nothing if there is no client.
    pub async fn disconnect(&mut self) {
        if let Some(client) = self.client.take() {
            client.shutdown().await;
            tracing::info!("Disconnected from MongoDB database {}", self.options.db_name());
        }
    }

    /// Asks the server for a ping, so a dropped connection reads as `false`.
    /// The ping is bounded by the connect timeout, never the query timeout.
    pub async fn is_connected(&self) -> bool {
        let Some(client) = &self.client else {
            return false;
        };

        match bounded(self.options.connect_timeout(), client.database("admin").run_command(doc! { "ping": 1 })).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("MongoDB ping failed: {}", e);
                false
            }
        }
    }

    /// Replaces the time limit applied to each operation. Zero removes the
    /// limit.
    pub async fn set_query_timeout(&self, timeout: Duration) {
        self.query_timeout.set(timeout).await;
    }

    pub async fn query_timeout(&self) -> Duration {
        self.query_timeout.get().await
    }

    pub fn db_name(&self) -> &str {
        self.options.db_name()
    }

    pub fn options(&self) -> &MongoOptions {
        &self.options
    }

    /// The live client, after confirming it still answers.
    pub(crate) async fn live_client(&self) -> MongoResult<&Client> {
        match &self.client {
            Some(client) if self.is_connected().await => Ok(client),
            _ => Err(MongoError::NotConnected),
        }
    }

    pub(crate) async fn collection(&self, name: &str) -> MongoResult<Collection<Document>> {
        Ok(self
            .live_client()
            .await?
            .database(self.db_name())
            .collection(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongolayer_core::options::set_db_name;

    #[tokio::test]
    async fn test_new_handle_is_not_connected() {
        let handle = MongoHandle::new(MongoOptions::default());

        assert!(!handle.is_connected().await);
        assert_eq!(handle.db_name(), "test");
        assert_eq!(handle.query_timeout().await, DEFAULT_QUERY_TIMEOUT);
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let mut handle = MongoHandle::new(MongoOptions::default());

        handle.disconnect().await;
        handle.disconnect().await;
        assert!(!handle.is_connected().await);
    }

    #[tokio::test]
    async fn test_set_query_timeout() {
        let handle = MongoHandle::new(MongoOptions::default());

        handle.set_query_timeout(Duration::from_millis(1500)).await;
        assert_eq!(handle.query_timeout().await, Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_not_connected() {
        let options = MongoOptions::combine([
            set_uri("mongodb://127.0.0.1:1/?directConnection=true"),
            set_timeout(Duration::from_millis(200)),
            set_db_name("orders"),
        ]);
        let client = Client::with_options(client_options(&options).await.unwrap()).unwrap();
        let handle = MongoHandle::from_client(client, options);
        handle.set_query_timeout(Duration::from_millis(300)).await;

        assert!(!handle.is_connected().await);
        assert!(handle.collection("coll").await.unwrap_err().is_not_connected());
    }

    #[tokio::test]
    async fn test_zero_query_timeout_does_not_bound_the_ping() {
        let options = MongoOptions::combine([
            set_uri("mongodb://127.0.0.1:1/?directConnection=true"),
            set_timeout(Duration::from_millis(200)),
        ]);
        let client = Client::with_options(client_options(&options).await.unwrap()).unwrap();
        let handle = MongoHandle::from_client(client, options);
        handle.set_query_timeout(Duration::ZERO).await;

        // The ping runs until server selection gives up, not until the zero
        // query timeout fires.
        let started = std::time::Instant::now();
        assert!(!handle.is_connected().await);
        assert!(started.elapsed() >= Duration::from_millis(150));
        assert_eq!(handle.query_timeout().await, Duration::ZERO);
    }

    #[tokio::test]
    async fn test_connect_to_unreachable_server_fails() {
        let options = MongoOptions::combine([
            set_uri("mongodb://127.0.0.1:1/?directConnection=true"),
            set_timeout(Duration::from_millis(200)),
        ]);

        let err = MongoHandle::connect(options).await.unwrap_err();
        assert!(matches!(err, MongoError::Connection(_) | MongoError::Timeout(_)));
    }
}
