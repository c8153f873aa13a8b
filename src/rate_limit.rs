use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Client-side request budget for an outbound API
pub struct RateLimiterConfig {
    /// Maximum requests per minute
    pub requests_per_minute: u32,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: 60, // Default: one request per second
        }
    }
}

pub type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Create a new rate limiter; a zero budget is raised to one request per minute
pub fn create_rate_limiter(config: RateLimiterConfig) -> SharedRateLimiter {
    let quota = Quota::per_minute(
        NonZeroU32::new(config.requests_per_minute).unwrap_or(NonZeroU32::MIN),
    );
    Arc::new(RateLimiter::direct(quota))
}

/// Wait until the limiter admits one more request
pub async fn acquire(limiter: &SharedRateLimiter) {
    if limiter.check().is_err() {
        tracing::debug!("Outbound rate limit reached, waiting for capacity");
        limiter.until_ready().await;
    }
}
