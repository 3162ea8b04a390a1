//! Bootstrap utilities for positional binaries.

use std::future::Future;
use std::time::Duration;

use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LOG_ENV_VAR;

/// Initialize tracing with the POSITIONAL_LOG environment variable.
///
/// Defaults to "info" level if POSITIONAL_LOG is not set.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV_VAR)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

const MAX_RETRIES: u32 = 30;
const INITIAL_DELAY: Duration = Duration::from_millis(100);
const MAX_DELAY: Duration = Duration::from_secs(5);

/// Connect to a database with exponential backoff retry.
///
/// # Arguments
/// * `backend` - Human-readable name for logging (e.g., "postgres")
/// * `address` - The address being connected to
/// * `connect` - Async function that attempts to establish a connection
///
/// # Returns
/// The connection on success, or the last error after max retries.
pub async fn connect_with_retry<T, E, F, Fut>(backend: &str, address: &str, connect: F) -> Result<T, E>
where
    E: std::fmt::Display,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    connect_with_retry_limit(backend, address, MAX_RETRIES, INITIAL_DELAY, connect).await
}

async fn connect_with_retry_limit<T, E, F, Fut>(
    backend: &str,
    address: &str,
    max_retries: u32,
    initial_delay: Duration,
    connect: F,
) -> Result<T, E>
where
    E: std::fmt::Display,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut delay = initial_delay;
    let mut attempt = 0;

    loop {
        attempt += 1;
        match connect().await {
            Ok(connection) => {
                tracing::info!("Connected to {} at {}", backend, address);
                return Ok(connection);
            }
            Err(e) if attempt < max_retries => {
                warn!(
                    "Failed to connect to {} (attempt {}/{}): {}. Retrying in {:?}...",
                    backend, attempt, max_retries, e, delay
                );
                tokio::time::sleep(delay).await;
                delay = std::cmp::min(delay * 2, MAX_DELAY);
            }
            Err(e) => {
                tracing::error!(
                    "Failed to connect to {} after {} attempts: {}",
                    backend,
                    max_retries,
                    e
                );
                return Err(e);
            }
        }
    }
}
