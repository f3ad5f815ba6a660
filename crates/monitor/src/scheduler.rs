use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::error;

use super::executor::ProbeExecutor;
use super::types::{ProbeResult, Target};
use crate::error::MonitorError;

/// Probe scheduler - fans a batch of probes out over a bounded set of workers
pub struct ProbeScheduler {
    executor: Arc<ProbeExecutor>,
    workers: usize,
}

impl ProbeScheduler {
    /// Create a scheduler running at most `workers` probes at once
    pub fn new(executor: Arc<ProbeExecutor>, workers: usize) -> Self {
        Self { executor, workers: workers.max(1) }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Probe every target and wait for all of them.
    ///
    /// Yields exactly one result per target, in completion order. Each probe
    /// runs in its own task so a panicking checker only costs its own result.
    pub async fn scan_batch(&self, targets: &[Target]) -> Result<Vec<ProbeResult>, MonitorError> {
        let results: Vec<ProbeResult> = stream::iter(targets.iter().map(Target::address).map(str::to_owned))
            .map(|address| {
                let executor = Arc::clone(&self.executor);
                async move {
                    let task = {
                        let address = address.clone();
                        tokio::spawn(async move { executor.probe(&address).await })
                    };
                    match task.await {
                        Ok(result) => result,
                        Err(e) => {
                            error!(address = %address, "Probe task failed: {}", e);
                            ProbeResult::unreachable(address)
                        }
                    }
                }
            })
            .buffer_unordered(self.workers)
            .collect()
            .await;

        if results.len() != targets.len() {
            return Err(MonitorError::IncompleteScan {
                expected: targets.len(),
                actual: results.len(),
            });
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::Checker;
    use crate::types::TargetMetadata;
    use anyhow::Result;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Records the highest number of overlapping checks
    #[derive(Default)]
    struct ConcurrencyProbe {
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl Checker for ConcurrencyProbe {
        async fn check(&self, address: &str) -> Result<f64> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(100)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            if address.ends_with(".13") {
                panic!("checker bug");
            }
            Ok(1.0)
        }
    }

    fn targets(count: usize) -> Vec<Target> {
        (1..=count)
            .map(|i| {
                Target::new(
                    i as i64,
                    TargetMetadata {
                        name: format!("Printer {i}"),
                        address: format!("10.0.0.{i}"),
                        model: "Generic".to_string(),
                        location: "Lab".to_string(),
                    },
                )
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_batch_bounds_concurrency() {
        let checker = Arc::new(ConcurrencyProbe::default());
        let executor = Arc::new(ProbeExecutor::new(checker.clone(), Duration::from_secs(5)));
        let scheduler = ProbeScheduler::new(executor, 4);

        let results = scheduler.scan_batch(&targets(12)).await.unwrap();

        assert_eq!(results.len(), 12);
        assert!(checker.peak.load(Ordering::SeqCst) <= 4);
        let addresses: HashSet<_> = results.iter().map(|r| r.address.clone()).collect();
        assert_eq!(addresses.len(), 12);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_probe_still_yields_result() {
        let _ = tracing_subscriber::fmt::try_init();
        let executor = Arc::new(ProbeExecutor::new(
            Arc::new(ConcurrencyProbe::default()),
            Duration::from_secs(5),
        ));
        let scheduler = ProbeScheduler::new(executor, 10);

        let results = scheduler.scan_batch(&targets(15)).await.unwrap();

        assert_eq!(results.len(), 15);
        let failed = results.iter().find(|r| r.address == "10.0.0.13").unwrap();
        assert!(!failed.reachable);
        assert_eq!(results.iter().filter(|r| r.reachable).count(), 14);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let executor = Arc::new(ProbeExecutor::new(
            Arc::new(ConcurrencyProbe::default()),
            Duration::from_secs(5),
        ));
        let scheduler = ProbeScheduler::new(executor, 0);

        assert_eq!(scheduler.workers(), 1);
        assert!(scheduler.scan_batch(&[]).await.unwrap().is_empty());
    }
}
