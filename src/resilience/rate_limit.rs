//! Upstream admission gate.
//!
//! Keeps the process under the request rate the BCRA API tolerates
//! (60 requests per 60 seconds). The quota is smoothed to one admission per
//! `window / max` rather than a bursty fixed window: no span of
//! `window` ever sees more than `max` admissions, and queued callers are
//! woken by the bucket itself instead of a hand-rolled timer chain.

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Token-bucket gate shared by every upstream call path.
pub struct UpstreamGate {
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    max_requests: u32,
    window: Duration,
}

impl UpstreamGate {
    /// Build a gate admitting `max_requests` per `window`.
    ///
    /// A zero `max_requests` is clamped to 1 so the gate can never deadlock
    /// the pipeline outright.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        let max = max_requests.max(1);
        let period = window
            .checked_div(max)
            .filter(|p| !p.is_zero())
            .unwrap_or(Duration::from_millis(1));

        let quota = Quota::with_period(period).expect("period is non-zero");

        Self {
            limiter: Arc::new(RateLimiter::direct(quota)),
            max_requests: max,
            window,
        }
    }

    /// Wait until the caller is admitted. Excess callers queue here rather
    /// than erroring.
    pub async fn acquire(&self) {
        if self.limiter.check().is_err() {
            debug!(
                max_requests = self.max_requests,
                window_secs = self.window.as_secs(),
                "rate limit reached, waiting for admission"
            );
        }
        self.limiter.until_ready().await;
    }

    /// Non-blocking admission attempt.
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}
