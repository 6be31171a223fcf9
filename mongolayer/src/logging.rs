//! Logging setup for binaries and tests built on mongolayer.
//!
//! The library itself only emits `tracing` events; nothing is printed until a
//! subscriber is installed.

use tracing_subscriber::EnvFilter;

use crate::error::{MongoError, MongoResult};

fn level_for(verbose: u8, quiet: bool) -> tracing::Level {
    match (quiet, verbose) {
        (true, _) => tracing::Level::ERROR,
        (false, 0) => tracing::Level::INFO,
        (false, 1) => tracing::Level::DEBUG,
        (false, _) => tracing::Level::TRACE,
    }
}

/// Installs a formatting subscriber.
///
/// `RUST_LOG` takes precedence when set; otherwise the level follows
/// `verbose` (0=INFO, 1=DEBUG, 2+=TRACE), or ERROR when `quiet` is set.
///
/// # Errors
/// Returns [`MongoError::Configuration`] if a global subscriber is already installed.
pub fn init_logging(verbose: u8, quiet: bool) -> MongoResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_for(verbose, quiet).to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| MongoError::Configuration(format!("Failed to initialize logging: {}", e)))
}
