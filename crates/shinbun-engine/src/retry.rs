use std::future::Future;
use std::time::Duration;

use tracing::warn;

use shinbun_core::SyncError;

/// Bounded sleep-and-retry for rate-limited remote calls.
///
/// Only `RateLimited` is retried. Each retry waits the larger of `backoff`
/// and the server's hint; once `max_retries` is spent the call fails with
/// `Transport`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub backoff: Duration,
    pub max_retries: u32,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            backoff: Duration::from_secs(30),
            max_retries: 3,
        }
    }
}

impl RateLimitPolicy {
    pub fn delay_for(&self, err: &SyncError) -> Duration {
        err.suggested_delay()
            .map_or(self.backoff, |hint| hint.max(self.backoff))
    }

    /// Run `op`, retrying the same request while it reports a rate limit.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T, SyncError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SyncError>>,
    {
        let mut retries = 0u32;
        loop {
            match op().await {
                Err(e) if e.is_retryable() => {
                    if retries >= self.max_retries {
                        return Err(SyncError::Transport(format!(
                            "{what}: still rate limited after {retries} retries"
                        )));
                    }
                    retries += 1;
                    let delay = self.delay_for(&e);
                    warn!(
                        call = what,
                        attempt = retries,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "rate limited, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }
}
