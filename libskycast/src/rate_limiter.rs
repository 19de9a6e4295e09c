//! Rate limiting for calls to the posting service
//!
//! Two independent sliding windows: one over every outbound call, a
//! stricter one over create actions (posts and blob uploads). `admit`
//! suspends the caller until admission is safe instead of failing, so
//! the poll loop simply slows down when a budget is exhausted.

use tokio::time::{sleep, Duration, Instant};
use tracing::info;

use crate::config::RateLimitConfig;

struct Window {
    budget: u32,
    length: Duration,
    count: u32,
    started: Instant,
}

impl Window {
    fn new(budget: u32, length: Duration) -> Self {
        Self {
            budget,
            length,
            count: 0,
            started: Instant::now(),
        }
    }

    /// Reset the window once its length has elapsed. Must run before any
    /// admission check.
    fn roll_forward(&mut self, now: Instant) {
        if now.duration_since(self.started) >= self.length {
            self.count = 0;
            self.started = now;
        }
    }

    fn remaining(&self, now: Instant) -> Duration {
        self.length.saturating_sub(now.duration_since(self.started))
    }

    fn exhausted(&self) -> bool {
        self.count >= self.budget
    }
}

/// Dual-window cooperative throttle.
///
/// Single-caller by design: the orchestrator drives all backend calls
/// sequentially, so counter mutation needs no synchronization. A
/// concurrent redesign would have to lock around both windows.
pub struct RateLimiter {
    api: Window,
    create: Window,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            api: Window::new(config.api_budget, Duration::from_secs(config.api_window_secs)),
            create: Window::new(
                config.create_budget,
                Duration::from_secs(config.create_window_secs),
            ),
        }
    }

    /// Block until the relevant budgets admit one more call, then count it.
    ///
    /// Every call consumes from the generic budget; create actions consume
    /// from the create budget as well. When a budget is exhausted the call
    /// sleeps for exactly the remainder of that window, then resets it and
    /// proceeds.
    pub async fn admit(&mut self, is_create: bool) {
        let now = Instant::now();
        self.api.roll_forward(now);
        self.create.roll_forward(now);

        if self.api.exhausted() {
            let wait = self.api.remaining(now);
            info!(wait_secs = wait.as_secs(), "api budget exhausted, waiting");
            sleep(wait).await;
            self.api.count = 0;
            self.api.started = Instant::now();
        }

        if is_create && self.create.exhausted() {
            let now = Instant::now();
            let wait = self.create.remaining(now);
            info!(
                wait_secs = wait.as_secs(),
                "create budget exhausted, waiting"
            );
            sleep(wait).await;
            self.create.count = 0;
            self.create.started = Instant::now();
        }

        self.api.count += 1;
        if is_create {
            self.create.count += 1;
        }
    }
}
