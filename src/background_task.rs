use std::sync::Arc;

use tokio::time::{interval, Duration};

use crate::limiter::rate_limiter::RateLimitStore;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Periodically drops expired rate-limit accounting so the counter map
/// stays bounded. Backends with native TTLs make this a no-op.
pub async fn start_limiter_sweep_task(store: Arc<dyn RateLimitStore>) {
    let mut interval = interval(SWEEP_INTERVAL);

    loop {
        interval.tick().await;
        store.sweep_expired().await;
    }
}
