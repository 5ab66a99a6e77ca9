/*!
 * Admission gate for translation requests.
 *
 * One limiter is created per process and shared with everything that calls
 * the translation provider. Holding a permit means the caller is the only
 * request in flight; acquiring one waits until the configured cooldown has
 * passed since the previous dispatch.
 */

use std::time::Duration;

use log::debug;
use tokio::sync::{Mutex, MutexGuard};
use tokio::time::Instant;

/// Serializes provider calls and spaces them by a fixed cooldown
#[derive(Debug)]
pub struct RateLimiter {
    cooldown: Duration,
    last_dispatch: Mutex<Option<Instant>>,
}

/// Exclusive right to dispatch one request; released on drop
#[derive(Debug)]
pub struct DispatchPermit<'a> {
    _guard: MutexGuard<'a, Option<Instant>>,
}

impl RateLimiter {
    /// Create a limiter with the given minimum spacing between dispatches
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_dispatch: Mutex::new(None),
        }
    }

    /// Minimum spacing between dispatches
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Wait for the gate and the cooldown, then mark a dispatch
    pub async fn acquire(&self) -> DispatchPermit<'_> {
        let mut last = self.last_dispatch.lock().await;

        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.cooldown {
                let wait = self.cooldown - elapsed;
                debug!("Cooling down for {:?} before next request", wait);
                tokio::time::sleep(wait).await;
            }
        }

        *last = Some(Instant::now());
        DispatchPermit { _guard: last }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Duration::from_secs(3))
    }
}
