//! Connection options built from composable option functions.
//!
//! A [`MongoOptions`] value is produced once by [`MongoOptions::combine`] and
//! consumed when the handle connects. Each option is a function from one
//! configuration to the next; they are applied in the order supplied, so when
//! two options touch the same field the last one wins.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use mongolayer::options::*;
//!
//! let options = MongoOptions::combine([
//!     set_uri("mongodb://127.0.0.1:27017"),
//!     set_timeout(Duration::from_secs(20)),
//!     set_max_pool_size(20),
//!     set_preferred(ReadMode::Primary),
//! ]);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{error::MongoResult, read_pref::ReadMode};

pub const DEFAULT_URI: &str = "mongodb://127.0.0.1:27017";
pub const DEFAULT_DB_NAME: &str = "test";
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Immutable connection configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MongoOptions {
    uri: String,
    #[serde(rename = "connect_timeout_ms", with = "duration_ms")]
    connect_timeout: Duration,
    max_pool_size: Option<u32>,
    db_name: String,
    read_mode: ReadMode,
}

impl Default for MongoOptions {
    fn default() -> Self {
        Self {
            uri: DEFAULT_URI.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            max_pool_size: None,
            db_name: DEFAULT_DB_NAME.to_string(),
            read_mode: ReadMode::default(),
        }
    }
}

impl MongoOptions {
    /// Applies `opts` in order to the default configuration.
    pub fn combine<I>(opts: I) -> Self
    where
        I: IntoIterator<Item = BoxedOption>,
    {
        opts.into_iter()
            .fold(MongoOptions::default(), |options, opt| opt.apply(options))
    }

    /// Loads a configuration from JSON. Missing fields take their defaults.
    ///
    /// ```ignore
    /// let options = MongoOptions::from_json(r#"{
    ///     "uri": "mongodb://db:27017",
    ///     "db_name": "orders",
    ///     "connect_timeout_ms": 5000,
    ///     "read_mode": "primary"
    /// }"#)?;
    /// ```
    pub fn from_json(json: &str) -> MongoResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn max_pool_size(&self) -> Option<u32> {
        self.max_pool_size
    }

    pub fn db_name(&self) -> &str {
        &self.db_name
    }

    pub fn read_mode(&self) -> ReadMode {
        self.read_mode
    }
}

/// A single step of option composition.
pub trait MongoOption {
    fn apply(&self, options: MongoOptions) -> MongoOptions;
}

impl<F> MongoOption for F
where
    F: Fn(MongoOptions) -> MongoOptions,
{
    fn apply(&self, options: MongoOptions) -> MongoOptions {
        self(options)
    }
}

pub type BoxedOption = Box<dyn MongoOption + Send + Sync>;

/// Sets the connection string.
pub fn set_uri(uri: impl Into<String>) -> BoxedOption {
    let uri = uri.into();
    Box::new(move |options: MongoOptions| MongoOptions { uri: uri.clone(), ..options })
}

/// Sets the connect timeout.
pub fn set_timeout(timeout: Duration) -> BoxedOption {
    Box::new(move |options: MongoOptions| MongoOptions { connect_timeout: timeout, ..options })
}

/// Sets the maximum number of pooled connections.
pub fn set_max_pool_size(size: u32) -> BoxedOption {
    Box::new(move |options: MongoOptions| MongoOptions { max_pool_size: Some(size), ..options })
}

/// Sets the database used by every operation of the handle.
pub fn set_db_name(name: impl Into<String>) -> BoxedOption {
    let name = name.into();
    Box::new(move |options: MongoOptions| MongoOptions { db_name: name.clone(), ..options })
}

/// Sets the read preference mode.
pub fn set_preferred(mode: ReadMode) -> BoxedOption {
    Box::new(move |options: MongoOptions| MongoOptions { read_mode: mode, ..options })
}

/// Sets the read preference mode from its name. Unknown names leave the
/// configuration unchanged.
pub fn set_preferred_str(mode: impl Into<String>) -> BoxedOption {
    let mode = mode.into();
    Box::new(move |options: MongoOptions| match mode.parse::<ReadMode>() {
        Ok(read_mode) => MongoOptions { read_mode, ..options },
        Err(e) => {
            tracing::warn!("Ignoring read preference option: {}", e);
            options
        }
    })
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = MongoOptions::combine(Vec::<BoxedOption>::new());

        assert_eq!(options.uri(), DEFAULT_URI);
        assert_eq!(options.db_name(), "test");
        assert_eq!(options.connect_timeout(), Duration::from_secs(30));
        assert_eq!(options.max_pool_size(), None);
        assert_eq!(options.read_mode(), ReadMode::SecondaryPreferred);
    }

    #[test]
    fn test_combine_sets_every_field() {
        let options = MongoOptions::combine([
            set_uri("mongodb://db.internal:27017"),
            set_timeout(Duration::from_secs(20)),
            set_max_pool_size(20),
            set_db_name("orders"),
            set_preferred(ReadMode::Primary),
        ]);

        assert_eq!(options.uri(), "mongodb://db.internal:27017");
        assert_eq!(options.connect_timeout(), Duration::from_secs(20));
        assert_eq!(options.max_pool_size(), Some(20));
        assert_eq!(options.db_name(), "orders");
        assert_eq!(options.read_mode(), ReadMode::Primary);
    }

    #[test]
    fn test_last_option_wins() {
        let options = MongoOptions::combine([
            set_db_name("first"),
            set_preferred(ReadMode::Nearest),
            set_db_name("second"),
            set_preferred(ReadMode::Secondary),
        ]);

        assert_eq!(options.db_name(), "second");
        assert_eq!(options.read_mode(), ReadMode::Secondary);
    }

    #[test]
    fn test_invalid_read_preference_is_ignored() {
        let options = MongoOptions::combine([
            set_preferred(ReadMode::Primary),
            set_preferred_str("tertiary"),
        ]);
        assert_eq!(options.read_mode(), ReadMode::Primary);

        let options = MongoOptions::combine([set_preferred_str("nearest")]);
        assert_eq!(options.read_mode(), ReadMode::Nearest);
    }

    #[test]
    fn test_closures_are_options() {
        let options = MongoOptions::combine([
            Box::new(|options: MongoOptions| MongoOptions { db_name: "custom".into(), ..options }) as BoxedOption,
        ]);

        assert_eq!(options.db_name(), "custom");
    }

    #[test]
    fn test_from_json() {
        let options = MongoOptions::from_json(
            r#"{
                "uri": "mongodb://db:27017",
                "db_name": "orders",
                "connect_timeout_ms": 5000,
                "max_pool_size": 10,
                "read_mode": "primaryPreferred"
            }"#,
        )
        .unwrap();

        assert_eq!(options.uri(), "mongodb://db:27017");
        assert_eq!(options.db_name(), "orders");
        assert_eq!(options.connect_timeout(), Duration::from_millis(5000));
        assert_eq!(options.max_pool_size(), Some(10));
        assert_eq!(options.read_mode(), ReadMode::PrimaryPreferred);
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let options = MongoOptions::from_json(r#"{ "db_name": "orders" }"#).unwrap();

        assert_eq!(options.uri(), DEFAULT_URI);
        assert_eq!(options.connect_timeout(), DEFAULT_CONNECT_TIMEOUT);
        assert_eq!(options.read_mode(), ReadMode::SecondaryPreferred);
    }

    #[test]
    fn test_from_json_read_mode_ignores_case() {
        let options = MongoOptions::from_json(r#"{ "read_mode": "Primary" }"#).unwrap();
        assert_eq!(options.read_mode(), ReadMode::Primary);

        let options = MongoOptions::combine([set_preferred_str("Primary")]);
        assert_eq!(options.read_mode(), ReadMode::Primary);
    }

    #[test]
    fn test_from_json_rejects_unknown_mode() {
        let err = MongoOptions::from_json(r#"{ "read_mode": "tertiary" }"#).unwrap_err();
        assert!(matches!(err, crate::error::MongoError::Configuration(_)));
    }
}
