//! Fixed-window request limiter.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self { max_requests: 100, window: Duration::from_secs(60) }
    }
}

#[derive(Debug)]
struct Window {
    requests: u32,
    start: Instant,
}

/// At most `max_requests` acquisitions per window.
///
/// The lock is held across the wait, so callers are admitted in arrival
/// order and nobody waits longer than one window.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    window: Mutex<Window>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self { config, window: Mutex::new(Window { requests: 0, start: Instant::now() }) }
    }

    /// Wait until a request may be issued, and count it.
    pub async fn acquire(&self) {
        let mut window = self.window.lock().await;
        let elapsed = window.start.elapsed();

        if elapsed >= self.config.window {
            *window = Window { requests: 0, start: Instant::now() };
        } else if window.requests >= self.config.max_requests {
            let wait = self.config.window - elapsed;
            tracing::debug!(wait_ms = wait.as_millis() as u64, "rate limit reached, waiting for next window");
            tokio::time::sleep(wait).await;
            *window = Window { requests: 0, start: Instant::now() };
        }

        window.requests += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_extra_request_waits_for_next_window() {
        let limiter = RateLimiter::new(RateLimitConfig { max_requests: 3, window: Duration::from_secs(60) });
        let start = Instant::now();

        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);

        limiter.acquire().await;
        assert_eq!(start.elapsed(), Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_window_exceeds_limit() {
        let limiter = RateLimiter::new(RateLimitConfig { max_requests: 3, window: Duration::from_secs(10) });
        let start = Instant::now();

        let mut issued = Vec::new();
        for _ in 0..8 {
            limiter.acquire().await;
            issued.push(start.elapsed().as_secs());
        }

        assert_eq!(issued, vec![0, 0, 0, 10, 10, 10, 20, 20]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_resets_after_idle() {
        let limiter = RateLimiter::new(RateLimitConfig { max_requests: 1, window: Duration::from_secs(5) });
        limiter.acquire().await;

        tokio::time::sleep(Duration::from_secs(7)).await;
        let before = Instant::now();
        limiter.acquire().await;
        assert_eq!(before.elapsed(), Duration::ZERO);
    }
}
