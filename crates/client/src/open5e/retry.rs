use std::time::Duration;

/// Exponential backoff for transient upstream failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, initial_delay: Duration::from_millis(1_000), max_delay: Duration::from_millis(10_000) }
    }
}

impl RetryPolicy {
    /// Backoff after failed attempt `attempt` (1-based):
    /// `min(initial * 2^(attempt - 1), max)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Network failures and 5xx responses are worth another attempt.
    pub fn is_retryable(status: Option<u16>) -> bool {
        match status {
            None => true,
            Some(code) => (500..600).contains(&code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delays_double_then_cap() {
        let policy = RetryPolicy {
            max_attempts: 6,
            initial_delay: Duration::from_millis(1_000),
            max_delay: Duration::from_millis(5_000),
        };

        let delays: Vec<_> = (1..=5).map(|a| policy.delay_for(a).as_millis()).collect();
        assert_eq!(delays, vec![1_000, 2_000, 4_000, 5_000, 5_000]);
    }

    #[test]
    fn test_huge_attempt_saturates() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(200), policy.max_delay);
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(RetryPolicy::is_retryable(None));
        assert!(RetryPolicy::is_retryable(Some(503)));
        assert!(!RetryPolicy::is_retryable(Some(404)));
        assert!(!RetryPolicy::is_retryable(Some(429)));
    }
}
