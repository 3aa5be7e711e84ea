//! Bounded retries around store calls

use std::future::Future;

use crate::config::RetryPolicy;

/// Run `op` until it succeeds or the policy's attempts are used up.
///
/// Sleeps between attempts with `tokio::time`, so paused-time tests stay fast.
pub async fn with_retry<T, E, F, Fut>(policy: &RetryPolicy, what: &str, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < policy.max_attempts => {
                tracing::warn!("{} failed (attempt {}/{}): {}", what, attempt, policy.max_attempts, e);
                tokio::time::sleep(policy.backoff(attempt)).await;
                attempt += 1;
            }
            Err(e) => {
                tracing::error!("{} failed after {} attempts: {}", what, attempt, e);
                return Err(e);
            }
        }
    }
}
