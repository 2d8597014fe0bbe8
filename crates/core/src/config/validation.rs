//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration errors. Fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

/// Upper bound for TTLs and schedule intervals: ten years.
pub const MAX_PERIOD_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Upper bound for the rate-limit window and retry delays: one day.
const MAX_WAIT_MS: u64 = 24 * 60 * 60 * 1000;

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `base_url` is not an absolute http(s) URL
    /// - `user_agent` is empty
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - rate limit, retry, TTL or interval values are zero
    /// - TTLs or intervals exceed ten years, or the rate-limit window or a
    ///   retry delay exceeds one day
    /// - `retry_initial_delay_ms` exceeds `retry_max_delay_ms`
    /// - `warmup_limit` is outside 1-100
    pub fn validate(&self) -> Result<(), ConfigError> {
        match url::Url::parse(&self.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(_) => return Err(invalid("base_url", "scheme must be http or https")),
            Err(e) => return Err(invalid("base_url", &e.to_string())),
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.rate_limit_max_requests == 0 {
            return Err(invalid("rate_limit_max_requests", "must be greater than 0"));
        }
        if self.rate_limit_window_ms == 0 {
            return Err(invalid("rate_limit_window_ms", "must be greater than 0"));
        }

        if self.retry_max_attempts == 0 {
            return Err(invalid("retry_max_attempts", "must be at least 1"));
        }
        if self.rate_limit_window_ms > MAX_WAIT_MS {
            return Err(invalid("rate_limit_window_ms", "must not exceed one day"));
        }
        if self.retry_max_delay_ms > MAX_WAIT_MS {
            return Err(invalid("retry_max_delay_ms", "must not exceed one day"));
        }
        if self.retry_initial_delay_ms > self.retry_max_delay_ms {
            return Err(invalid("retry_initial_delay_ms", "must not exceed retry_max_delay_ms"));
        }

        for (field, value) in [
            ("core_ttl_secs", self.core_ttl_secs),
            ("bulk_ttl_secs", self.bulk_ttl_secs),
            ("request_ttl_secs", self.request_ttl_secs),
            ("warmup_interval_secs", self.warmup_interval_secs),
            ("cleanup_interval_secs", self.cleanup_interval_secs),
        ] {
            if value == 0 {
                return Err(invalid(field, "must be greater than 0"));
            }
            if value > MAX_PERIOD_SECS {
                return Err(invalid(field, "must not exceed ten years"));
            }
        }

        if !(1..=100).contains(&self.warmup_limit) {
            return Err(invalid("warmup_limit", "must be between 1 and 100"));
        }

        if self.cleanup_interval_secs > self.warmup_interval_secs {
            tracing::warn!(
                cleanup_interval_secs = self.cleanup_interval_secs,
                warmup_interval_secs = self.warmup_interval_secs,
                "cleanup runs less often than warmup; expired entries may linger"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_bad_base_url() {
        let config = AppConfig { base_url: "not a url".into(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "base_url"));
    }

    #[test]
    fn test_validate_base_url_scheme() {
        let config = AppConfig { base_url: "ftp://api.open5e.com".into(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "base_url"));
    }

    #[test]
    fn test_validate_timeout_too_small() {
        let config = AppConfig { timeout_ms: 50, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));
    }

    #[test]
    fn test_validate_zero_rate_limit() {
        let config = AppConfig { rate_limit_max_requests: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "rate_limit_max_requests"));
    }

    #[test]
    fn test_validate_backoff_bounds() {
        let config = AppConfig { retry_initial_delay_ms: 20_000, retry_max_delay_ms: 10_000, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "retry_initial_delay_ms"));
    }

    #[test]
    fn test_validate_zero_interval() {
        let config = AppConfig { cleanup_interval_secs: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "cleanup_interval_secs"));
    }

    #[test]
    fn test_validate_ttl_upper_bound() {
        let config = AppConfig { core_ttl_secs: 10_000_000_000_000, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "core_ttl_secs"));

        let config = AppConfig { request_ttl_secs: MAX_PERIOD_SECS, ..Default::default() };
        assert!(config.validate().is_ok());
        assert!(chrono::Utc::now().checked_add_signed(config.request_ttl()).is_some());
    }

    #[test]
    fn test_validate_interval_upper_bound() {
        let config = AppConfig { cleanup_interval_secs: u64::MAX, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "cleanup_interval_secs"));
    }

    #[test]
    fn test_validate_wait_upper_bound() {
        let config = AppConfig { rate_limit_window_ms: u64::MAX, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "rate_limit_window_ms"));

        let config = AppConfig { retry_max_delay_ms: u64::MAX, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "retry_max_delay_ms"));
    }

    #[test]
    fn test_validate_warmup_limit() {
        let config = AppConfig { warmup_limit: 101, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "warmup_limit"));
    }

    #[test]
    fn test_validate_edge_case_values() {
        let config = AppConfig {
            timeout_ms: 100,
            rate_limit_max_requests: 1,
            rate_limit_window_ms: 1,
            retry_max_attempts: 1,
            retry_initial_delay_ms: 0,
            retry_max_delay_ms: 0,
            warmup_limit: 1,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
