//! Worker scheduler for background tasks.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::info;

use telemetry::metrics;

use crate::notifications::Notifier;
use crate::tracker::SessionTracker;

/// Worker scheduler configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Inactivity sweep interval
    pub sweep_interval: Duration,
    /// Metrics log interval
    pub metrics_log_interval: Duration,
    /// Notification check interval
    pub notification_check_interval: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            sweep_interval: tracker_core::limits::SWEEP_INTERVAL,
            metrics_log_interval: Duration::from_secs(60),
            notification_check_interval: Duration::from_secs(60),
        }
    }
}

/// Background worker scheduler.
pub struct WorkerScheduler {
    config: WorkerConfig,
    tracker: Arc<SessionTracker>,
    notifier: Arc<Notifier>,
}

impl WorkerScheduler {
    pub fn new(config: WorkerConfig, tracker: Arc<SessionTracker>, notifier: Arc<Notifier>) -> Self {
        Self {
            config,
            tracker,
            notifier,
        }
    }

    /// Starts all background workers.
    pub fn start(self: Arc<Self>) -> Vec<tokio::task::JoinHandle<()>> {
        let mut handles = Vec::new();

        let scheduler = self.clone();
        handles.push(tokio::spawn(async move {
            scheduler.run_sweeper().await;
        }));

        let scheduler = self.clone();
        handles.push(tokio::spawn(async move {
            scheduler.run_metrics_log().await;
        }));

        let scheduler = self.clone();
        handles.push(tokio::spawn(async move {
            scheduler.run_notification_worker().await;
        }));

        info!(
            sweep_interval_secs = self.config.sweep_interval.as_secs(),
            "Background workers started"
        );
        handles
    }

    async fn run_sweeper(&self) {
        let mut ticker = interval(self.config.sweep_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            self.tracker.sweep().await;
        }
    }

    async fn run_metrics_log(&self) {
        let mut ticker = interval(self.config.metrics_log_interval);

        loop {
            ticker.tick().await;

            let snapshot = metrics().snapshot();
            info!(
                active_sessions = self.tracker.active_count(),
                sessions_started = snapshot.sessions_started,
                sessions_ended = snapshot.sessions_ended,
                sessions_swept = snapshot.sessions_swept,
                sessions_excluded = snapshot.sessions_excluded,
                chat_requests = snapshot.chat_requests,
                chat_out_of_scope = snapshot.chat_out_of_scope,
                chat_failures = snapshot.chat_failures,
                llm_errors = snapshot.llm_errors,
                mail_errors = snapshot.mail_errors,
                ledger_write_errors = snapshot.ledger_write_errors,
                chat_latency_mean_ms = snapshot.chat_latency_mean_ms,
                "Metrics snapshot"
            );
        }
    }

    async fn run_notification_worker(&self) {
        let mut ticker = interval(self.config.notification_check_interval);

        loop {
            ticker.tick().await;
            self.notifier.check_and_alert().await;
        }
    }
}
