//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (GRIMOIRE_*)
//! 2. TOML config file (if GRIMOIRE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::{ConfigError, MAX_PERIOD_SECS};

const HOUR_SECS: u64 = 60 * 60;
const DAY_SECS: u64 = 24 * HOUR_SECS;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (GRIMOIRE_*)
/// 2. TOML config file (if GRIMOIRE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite database holding reference tables and the cache.
    ///
    /// Set via GRIMOIRE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Base URL of the upstream reference API.
    ///
    /// Set via GRIMOIRE_BASE_URL environment variable.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// User-Agent string for upstream requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request HTTP timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Requests allowed per rate-limit window.
    #[serde(default = "default_rate_limit_max_requests")]
    pub rate_limit_max_requests: u32,

    /// Rate-limit window length in milliseconds.
    #[serde(default = "default_rate_limit_window_ms")]
    pub rate_limit_window_ms: u64,

    /// Total attempts per upstream request, including the first.
    #[serde(default = "default_retry_max_attempts")]
    pub retry_max_attempts: u32,

    /// Backoff before the second attempt, in milliseconds.
    #[serde(default = "default_retry_initial_delay_ms")]
    pub retry_initial_delay_ms: u64,

    /// Upper bound on any single backoff, in milliseconds.
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,

    /// TTL for warmed core categories (races, classes, backgrounds).
    #[serde(default = "default_core_ttl_secs")]
    pub core_ttl_secs: u64,

    /// TTL for warmed bulk categories (spells, weapons, magic items).
    #[serde(default = "default_bulk_ttl_secs")]
    pub bulk_ttl_secs: u64,

    /// TTL for results cached on request.
    #[serde(default = "default_request_ttl_secs")]
    pub request_ttl_secs: u64,

    /// Item cap for the limited warmup entry of bulk categories.
    #[serde(default = "default_warmup_limit")]
    pub warmup_limit: usize,

    /// Seconds between scheduled warmups.
    #[serde(default = "default_warmup_interval_secs")]
    pub warmup_interval_secs: u64,

    /// Seconds between expired-entry sweeps.
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,

    /// Whether the server runs the bulk loader at startup.
    #[serde(default = "default_true")]
    pub load_on_startup: bool,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./data/grimoire.sqlite")
}

fn default_base_url() -> String {
    "https://api.open5e.com/v1".into()
}

fn default_user_agent() -> String {
    "grimoire/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_rate_limit_max_requests() -> u32 {
    100
}

fn default_rate_limit_window_ms() -> u64 {
    60_000
}

fn default_retry_max_attempts() -> u32 {
    3
}

fn default_retry_initial_delay_ms() -> u64 {
    1_000
}

fn default_retry_max_delay_ms() -> u64 {
    10_000
}

fn default_core_ttl_secs() -> u64 {
    7 * DAY_SECS
}

fn default_bulk_ttl_secs() -> u64 {
    DAY_SECS
}

fn default_request_ttl_secs() -> u64 {
    DAY_SECS
}

fn default_warmup_limit() -> usize {
    20
}

fn default_warmup_interval_secs() -> u64 {
    12 * HOUR_SECS
}

fn default_cleanup_interval_secs() -> u64 {
    HOUR_SECS
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            rate_limit_max_requests: default_rate_limit_max_requests(),
            rate_limit_window_ms: default_rate_limit_window_ms(),
            retry_max_attempts: default_retry_max_attempts(),
            retry_initial_delay_ms: default_retry_initial_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
            core_ttl_secs: default_core_ttl_secs(),
            bulk_ttl_secs: default_bulk_ttl_secs(),
            request_ttl_secs: default_request_ttl_secs(),
            warmup_limit: default_warmup_limit(),
            warmup_interval_secs: default_warmup_interval_secs(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
            load_on_startup: true,
        }
    }
}

/// Seconds as a chrono duration, saturating at the largest representable
/// value. `validate` keeps configured TTLs far below that.
fn ttl(secs: u64) -> chrono::Duration {
    i64::try_from(secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .unwrap_or(chrono::Duration::MAX)
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_millis(self.rate_limit_window_ms)
    }

    pub fn retry_initial_delay(&self) -> Duration {
        Duration::from_millis(self.retry_initial_delay_ms)
    }

    pub fn retry_max_delay(&self) -> Duration {
        Duration::from_millis(self.retry_max_delay_ms)
    }

    pub fn core_ttl(&self) -> chrono::Duration {
        ttl(self.core_ttl_secs)
    }

    pub fn bulk_ttl(&self) -> chrono::Duration {
        ttl(self.bulk_ttl_secs)
    }

    pub fn request_ttl(&self) -> chrono::Duration {
        ttl(self.request_ttl_secs)
    }

    pub fn warmup_interval(&self) -> Duration {
        Duration::from_secs(self.warmup_interval_secs)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `GRIMOIRE_`
    /// 2. TOML file from `GRIMOIRE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment()
            .extract()
            .map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("GRIMOIRE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment.merge(
            Env::prefixed("GRIMOIRE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        )
    }
}
