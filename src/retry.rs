//! Bounded retry with linear backoff for fallible backend calls.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Maximum attempts for a backend call.
/// 3 attempts with linear backoff usually rides out transient failures
/// without making users wait too long.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Base backoff delay. Attempt N waits N times this before retrying.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Run `operation` up to `max_retries` times, sleeping `base_delay * attempt`
/// between consecutive attempts (1x, 2x, ... the base delay).
///
/// Every failed attempt is logged with its ordinal. The error from the final
/// attempt is returned to the caller; nothing is swallowed. A `max_retries`
/// of zero still performs one attempt.
pub async fn with_retry<T, E, F, Fut>(
    mut operation: F,
    max_retries: u32,
    base_delay: Duration,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                warn!(attempt, max_retries, error = %e, "Attempt failed");
                if attempt >= max_retries {
                    return Err(e);
                }
                tokio::time::sleep(base_delay * attempt).await;
            }
        }
    }
}
