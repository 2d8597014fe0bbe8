//! Periodic warmup and expiry sweeps.

use std::sync::Arc;
use std::time::Duration;

use grimoire_core::AppConfig;
use grimoire_core::config::MAX_PERIOD_SECS;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::Warmup;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleConfig {
    pub warmup_interval: Duration,
    pub cleanup_interval: Duration,
}

/// Longest interval a schedule will wait between runs.
const MAX_INTERVAL: Duration = Duration::from_secs(MAX_PERIOD_SECS);

impl From<&AppConfig> for ScheduleConfig {
    fn from(config: &AppConfig) -> Self {
        Self { warmup_interval: config.warmup_interval(), cleanup_interval: config.cleanup_interval() }
    }
}

/// Handles to the two background tasks.
#[derive(Debug)]
pub struct ScheduleHandle {
    warmup: JoinHandle<()>,
    cleanup: JoinHandle<()>,
}

impl ScheduleHandle {
    /// Stop both tasks. A pass already in flight is cancelled at its next
    /// await point.
    pub fn abort(&self) {
        self.warmup.abort();
        self.cleanup.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.warmup.is_finished() && self.cleanup.is_finished()
    }
}

pub struct Scheduler;

impl Scheduler {
    /// Start the warmup task (first pass immediately) and the cleanup task
    /// (first sweep one interval from now). The two never wait on each
    /// other. Failures are logged and the next tick proceeds as normal.
    pub fn spawn(warmup: Arc<Warmup>, config: ScheduleConfig) -> ScheduleHandle {
        let config = ScheduleConfig {
            warmup_interval: config.warmup_interval.min(MAX_INTERVAL),
            cleanup_interval: config.cleanup_interval.min(MAX_INTERVAL),
        };
        let warmer = warmup.clone();
        let warmup_task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(config.warmup_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match warmer.warmup().await {
                    Ok(report) => {
                        for (category, e) in &report.failed {
                            tracing::warn!(category = category.path(), error = %e, "scheduled warmup skipped category");
                        }
                    }
                    Err(e) => tracing::error!(error = %e, "scheduled warmup failed"),
                }
            }
        });

        let cleanup_task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(config.cleanup_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; the first sweep waits a full interval.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match warmup.clear_expired().await {
                    Ok(removed) => tracing::info!(removed, "cleared expired cache entries"),
                    Err(e) => tracing::error!(error = %e, "failed to clear expired cache entries"),
                }
            }
        });

        tracing::info!(
            warmup_secs = config.warmup_interval.as_secs(),
            cleanup_secs = config.cleanup_interval.as_secs(),
            "scheduled cache warmup and cleanup"
        );

        ScheduleHandle { warmup: warmup_task, cleanup: cleanup_task }
    }
}
