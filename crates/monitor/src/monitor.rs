//! Periodic scan driver.
//!
//! The loop alternates between two states: [`MonitorState::Idle`] while it
//! waits for the next tick or a manual trigger, and [`MonitorState::Scanning`]
//! while one scan is in flight. Only one scan runs at a time. Timer ticks are
//! never queued behind a running scan; manual triggers received during a scan
//! collapse into a single follow-up scan.

#[cfg(test)]
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::config::MonitorConfig;
use crate::error::MonitorError;
use crate::executor::ProbeExecutor;
use crate::registry::TargetRegistry;
use crate::scheduler::ProbeScheduler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Scanning,
}

/// Summary of one completed scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanReport {
    /// Targets in the pre-scan snapshot
    pub probed: usize,
    /// Results written back into the registry
    pub merged: usize,
    /// Results dropped because their target was removed mid-scan
    pub discarded: usize,
    /// Reachable targets among the merged results
    pub reachable: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    Completed(ScanReport),
    /// Another scan was already running
    Skipped,
}

/// Requests an immediate scan from a running monitor
#[derive(Debug, Clone)]
pub struct ScanTrigger {
    notify: Arc<Notify>,
}

impl ScanTrigger {
    pub fn scan_now(&self) {
        self.notify.notify_one();
    }
}

/// Monitor loop - snapshots the registry, scans it, and merges the results back
pub struct MonitorLoop {
    registry: Arc<TargetRegistry>,
    scheduler: ProbeScheduler,
    interval: Duration,
    scan_on_start: bool,
    scan_guard: Mutex<()>,
    state: watch::Sender<MonitorState>,
    trigger: ScanTrigger,
    /// Scans left to abort with a panic
    #[cfg(test)]
    failing_scans: std::sync::atomic::AtomicUsize,
}

impl MonitorLoop {
    pub fn new(registry: Arc<TargetRegistry>, scheduler: ProbeScheduler, interval: Duration) -> Self {
        let (state, _) = watch::channel(MonitorState::Idle);
        Self {
            registry,
            scheduler,
            interval,
            scan_on_start: true,
            scan_guard: Mutex::new(()),
            state,
            trigger: ScanTrigger { notify: Arc::new(Notify::new()) },
            #[cfg(test)]
            failing_scans: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Monitor probing with the system `ping` utility
    pub fn from_config(registry: Arc<TargetRegistry>, config: &MonitorConfig) -> Self {
        let executor = Arc::new(ProbeExecutor::with_ping(config.attempts, config.probe_timeout()));
        let scheduler = ProbeScheduler::new(executor, config.workers);
        Self::new(registry, scheduler, config.interval()).scan_on_start(config.scan_on_start)
    }

    pub fn scan_on_start(mut self, enabled: bool) -> Self {
        self.scan_on_start = enabled;
        self
    }

    pub fn trigger(&self) -> ScanTrigger {
        self.trigger.clone()
    }

    pub fn state(&self) -> watch::Receiver<MonitorState> {
        self.state.subscribe()
    }

    /// Run a single scan unless one is already in progress
    pub async fn scan_once(&self) -> Result<ScanOutcome, MonitorError> {
        let Ok(_guard) = self.scan_guard.try_lock() else {
            debug!("Scan already in progress, skipping");
            return Ok(ScanOutcome::Skipped);
        };

        self.state.send_replace(MonitorState::Scanning);
        let result = self.run_scan().await;
        self.state.send_replace(MonitorState::Idle);

        result.map(ScanOutcome::Completed)
    }

    async fn run_scan(&self) -> Result<ScanReport, MonitorError> {
        let started = Instant::now();
        let snapshot = self.registry.snapshot().await;

        #[cfg(test)]
        if self
            .failing_scans
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            panic!("scan pipeline failure");
        }

        let results = self.scheduler.scan_batch(&snapshot).await?;
        let outcome = self.registry.merge_results(&results).await;

        Ok(ScanReport {
            probed: snapshot.len(),
            merged: outcome.merged,
            discarded: outcome.discarded,
            reachable: results.iter().filter(|r| r.reachable).count(),
            elapsed: started.elapsed(),
        })
    }

    /// Scan in a separate task so even a panic in the pipeline is contained.
    ///
    /// Probe panics are already absorbed by the scheduler; the error arm is
    /// reached when the scan task itself panics or is cancelled.
    async fn tick(self: &Arc<Self>) {
        let this = Arc::clone(self);
        let outcome = tokio::spawn(async move { this.scan_once().await })
            .await
            .map_err(MonitorError::from)
            .and_then(|result| result);

        match outcome {
            Ok(ScanOutcome::Completed(report)) => info!(
                probed = report.probed,
                merged = report.merged,
                discarded = report.discarded,
                reachable = report.reachable,
                elapsed_ms = report.elapsed.as_millis() as u64,
                "Scan completed"
            ),
            Ok(ScanOutcome::Skipped) => debug!("Scan skipped"),
            Err(e) => {
                self.state.send_replace(MonitorState::Idle);
                error!("Scan failed: {}", e);
            }
        }
    }

    /// Drive scans until `shutdown` changes or its sender is dropped
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        info!(interval = ?self.interval, workers = self.scheduler.workers(), "Monitor loop started");

        if self.scan_on_start {
            self.tick().await;
        }

        loop {
            tokio::select! {
                biased;

                _ = shutdown.changed() => {
                    info!("Shutdown signal received, stopping monitor loop.");
                    break;
                }
                _ = self.trigger.notify.notified() => {
                    debug!("Manual scan requested");
                    self.tick().await;
                }
                _ = tokio::time::sleep(self.interval) => {
                    self.tick().await;
                }
            }
        }
    }

    /// Start the loop on the runtime
    pub fn spawn(self) -> MonitorHandle {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let trigger = self.trigger();
        let state = self.state();
        let task = tokio::spawn(Arc::new(self).run(shutdown_rx));

        MonitorHandle { trigger, state, shutdown, task }
    }
}

/// Owner handle of a spawned monitor loop
pub struct MonitorHandle {
    trigger: ScanTrigger,
    state: watch::Receiver<MonitorState>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    pub fn trigger(&self) -> ScanTrigger {
        self.trigger.clone()
    }

    pub fn state(&self) -> watch::Receiver<MonitorState> {
        self.state.clone()
    }

    /// Stop the loop, waiting for an in-flight scan to finish
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            error!("Monitor loop terminated abnormally: {}", e);
        }
    }
}
