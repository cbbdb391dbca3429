//! Bootstrap utilities for the starsync binary.

use std::time::Duration;

use backon::Retryable;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use super::retry::connection_backoff;
use crate::config::LOG_ENV_VAR;

/// Initialize tracing with STARSYNC_LOG environment variable.
///
/// Defaults to "info" level if STARSYNC_LOG is not set.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV_VAR)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Connect to a store with exponential backoff retry.
///
/// # Arguments
/// * `store_name` - Human-readable name for logging (e.g., "operational")
/// * `connect` - Async function that attempts to establish a connection
///
/// # Returns
/// The connection on success, or the last error after max retries.
pub async fn connect_with_retry<T, E, F, Fut>(store_name: &str, connect: F) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
{
    let result = connect
        .retry(connection_backoff())
        .notify(|err: &E, dur: Duration| {
            warn!(store = %store_name, error = %err, delay = ?dur, "Connection failed, retrying");
        })
        .await;

    match &result {
        Ok(_) => tracing::info!(store = %store_name, "Connected"),
        Err(e) => tracing::error!(store = %store_name, error = %e, "Giving up on connection"),
    }
    result
}
