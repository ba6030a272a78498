//! Interval scheduler for flow synchronization.
//!
//! Every tick runs one synchronization per configured provider, resuming
//! from the ledger watermark minus the configured overlap. Providers run
//! concurrently; the engine's run guard keeps each provider to one run.
//!
//! # Example
//!
//! ```no_run
//! use pdpsync_core::{SyncContext, SyncEngine};
//! use pdpsync_domain::SyncConfig;
//! use pdpsync_infra::scheduling::{SyncScheduler, SyncSchedulerConfig};
//!
//! # async fn example(contexts: Vec<SyncContext>) -> pdpsync_infra::scheduling::SchedulerResult<()> {
//! let config = SyncSchedulerConfig::from_sync_config(&SyncConfig::default());
//! let mut scheduler = SyncScheduler::new(SyncEngine::new(), contexts, config);
//!
//! scheduler.start().await?;
//! // ... application runs ...
//! scheduler.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use pdpsync_core::{resume_request, SyncContext, SyncEngine};
use pdpsync_domain::{SyncConfig, SyncReport, SyncStatus};
use tokio::sync::Mutex;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::scheduling::error::{SchedulerError, SchedulerResult};

type TaskHandle = Arc<Mutex<Option<JoinHandle<()>>>>;

const STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for the sync scheduler
#[derive(Debug, Clone)]
pub struct SyncSchedulerConfig {
    pub interval: Duration,
    /// Subtracted from the watermark when computing the lower bound
    pub overlap: Duration,
    /// Search limit; `0` discovers the total first
    pub limit: u32,
    /// Upper bound for one provider run
    pub run_timeout: Duration,
}

impl SyncSchedulerConfig {
    pub fn from_sync_config(sync: &SyncConfig) -> Self {
        Self {
            interval: Duration::from_secs(sync.interval_seconds.max(1)),
            overlap: Duration::from_secs(sync.overlap_seconds),
            limit: sync.default_limit,
            ..Self::default()
        }
    }
}

impl Default for SyncSchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(900),
            overlap: Duration::from_secs(86_400),
            limit: 0,
            run_timeout: Duration::from_secs(1_800),
        }
    }
}

/// Periodic synchronization of every configured provider
pub struct SyncScheduler {
    engine: SyncEngine,
    contexts: Arc<Vec<SyncContext>>,
    config: SyncSchedulerConfig,
    cancellation_token: CancellationToken,
    task_handle: TaskHandle,
}

impl SyncScheduler {
    pub fn new(engine: SyncEngine, contexts: Vec<SyncContext>, config: SyncSchedulerConfig) -> Self {
        Self {
            engine,
            contexts: Arc::new(contexts),
            config,
            cancellation_token: CancellationToken::new(),
            task_handle: Arc::new(Mutex::new(None)),
        }
    }

    /// Spawn the background loop.
    ///
    /// # Errors
    /// Returns [`SchedulerError::AlreadyRunning`] if the loop is active.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        info!(
            providers = self.contexts.len(),
            interval_secs = self.config.interval.as_secs(),
            "Starting sync scheduler"
        );

        // Fresh token so the scheduler can restart after stop
        self.cancellation_token = CancellationToken::new();

        let engine = self.engine.clone();
        let contexts = Arc::clone(&self.contexts);
        let config = self.config.clone();
        let cancel = self.cancellation_token.clone();

        let handle = tokio::spawn(async move {
            Self::sync_loop(engine, contexts, config, cancel).await;
        });

        *self.task_handle.lock().await = Some(handle);
        Ok(())
    }

    /// Cancel the loop and wait for it to finish.
    ///
    /// A run in flight is dropped; the next start resumes from the ledger.
    ///
    /// # Errors
    /// Returns [`SchedulerError::NotRunning`] if the loop is not active.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        if !self.is_running() {
            return Err(SchedulerError::NotRunning);
        }

        info!("Stopping sync scheduler");
        self.cancellation_token.cancel();

        if let Some(handle) = self.task_handle.lock().await.take() {
            tokio::time::timeout(STOP_TIMEOUT, handle)
                .await
                .map_err(|_| SchedulerError::Timeout { seconds: STOP_TIMEOUT.as_secs() })??;
        }

        info!("Sync scheduler stopped");
        Ok(())
    }

    /// A scheduler is running while its task handle has not finished.
    pub fn is_running(&self) -> bool {
        self.task_handle
            .try_lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    /// Synchronize every provider once and return their reports.
    pub async fn run_once(&self) -> Vec<SyncReport> {
        Self::run_all(&self.engine, &self.contexts, &self.config).await
    }

    async fn sync_loop(
        engine: SyncEngine,
        contexts: Arc<Vec<SyncContext>>,
        config: SyncSchedulerConfig,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!("Sync loop cancelled");
                    break;
                }
                () = tokio::time::sleep(config.interval) => {
                    let started = Instant::now();
                    let reports = tokio::select! {
                        () = cancel.cancelled() => {
                            debug!("Sync loop cancelled during a run");
                            break;
                        }
                        reports = Self::run_all(&engine, &contexts, &config) => reports,
                    };
                    let aborted = reports.iter().filter(|r| r.status == SyncStatus::Aborted).count();
                    info!(
                        providers = reports.len(),
                        aborted,
                        elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                        "Scheduled synchronization finished"
                    );
                }
            }
        }
    }

    async fn run_all(
        engine: &SyncEngine,
        contexts: &[SyncContext],
        config: &SyncSchedulerConfig,
    ) -> Vec<SyncReport> {
        let mut runs = JoinSet::new();
        for (index, ctx) in contexts.iter().cloned().enumerate() {
            let engine = engine.clone();
            let config = config.clone();
            runs.spawn(async move { (index, Self::run_provider(&engine, &ctx, &config).await) });
        }

        let mut reports = Vec::with_capacity(contexts.len());
        while let Some(joined) = runs.join_next().await {
            match joined {
                Ok(entry) => reports.push(entry),
                Err(err) => error!(error = %err, "Provider synchronization task failed"),
            }
        }
        reports.sort_by_key(|(index, _)| *index);
        reports.into_iter().map(|(_, report)| report).collect()
    }

    async fn run_provider(engine: &SyncEngine, ctx: &SyncContext, config: &SyncSchedulerConfig) -> SyncReport {
        let provider = ctx.provider_name().to_string();
        let overlap = chrono::Duration::from_std(config.overlap).unwrap_or(chrono::Duration::zero());

        let request = match resume_request(ctx, overlap, config.limit).await {
            Ok(request) => request,
            Err(err) => {
                error!(%provider, error = %err, "Failed to read the synchronization watermark");
                return aborted(provider, format!("Failed to read the synchronization watermark: {err}"));
            }
        };
        debug!(%provider, sync_from = ?request.sync_from, limit = request.limit, "Scheduled synchronization");

        match tokio::time::timeout(config.run_timeout, engine.sync_flows(ctx, request)).await {
            Ok(report) => report,
            Err(_) => {
                warn!(%provider, timeout_secs = config.run_timeout.as_secs(), "Synchronization timed out");
                aborted(
                    provider,
                    format!("Synchronization timed out after {}s", config.run_timeout.as_secs()),
                )
            }
        }
    }
}

fn aborted(provider: String, message: String) -> SyncReport {
    let mut report = SyncReport::new(provider);
    report.status = SyncStatus::Aborted;
    report.message(message);
    report
        .suggestions
        .push("Re-run the synchronization; it resumes after the last synchronized flow".to_string());
    report
}

impl Drop for SyncScheduler {
    fn drop(&mut self) {
        self.cancellation_token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> SyncSchedulerConfig {
        SyncSchedulerConfig {
            interval: Duration::from_millis(50),
            run_timeout: Duration::from_secs(2),
            ..SyncSchedulerConfig::default()
        }
    }

    #[test]
    fn config_follows_sync_settings() {
        let sync = SyncConfig {
            interval_seconds: 0,
            overlap_seconds: 60,
            default_limit: 25,
            ..SyncConfig::default()
        };
        let config = SyncSchedulerConfig::from_sync_config(&sync);
        assert_eq!(config.interval, Duration::from_secs(1));
        assert_eq!(config.overlap, Duration::from_secs(60));
        assert_eq!(config.limit, 25);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn lifecycle_runs_successfully() {
        let mut scheduler = SyncScheduler::new(SyncEngine::new(), Vec::new(), fast_config());

        scheduler.start().await.expect("start succeeds");
        assert!(scheduler.is_running());
        tokio::time::sleep(Duration::from_millis(120)).await;
        scheduler.stop().await.expect("stop succeeds");

        assert!(!scheduler.is_running());
        scheduler.start().await.expect("restart succeeds");
        scheduler.stop().await.expect("second stop succeeds");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn double_start_is_rejected() {
        let mut scheduler = SyncScheduler::new(SyncEngine::new(), Vec::new(), fast_config());

        scheduler.start().await.expect("first start succeeds");
        assert!(matches!(scheduler.start().await, Err(SchedulerError::AlreadyRunning)));
        scheduler.stop().await.expect("stop succeeds");
        assert!(matches!(scheduler.stop().await, Err(SchedulerError::NotRunning)));
    }

    #[tokio::test]
    async fn run_once_without_providers_is_empty() {
        let scheduler = SyncScheduler::new(SyncEngine::new(), Vec::new(), fast_config());
        assert!(scheduler.run_once().await.is_empty());
    }
}
