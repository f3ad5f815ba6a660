use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

use super::checker::{Checker, PingChecker};
use super::types::ProbeResult;

/// Probe executor - runs one bounded probe against a single address
pub struct ProbeExecutor {
    checker: Arc<dyn Checker>,
    timeout: Duration,
}

impl ProbeExecutor {
    /// Create an executor whose probes give up after `timeout`
    pub fn new(checker: Arc<dyn Checker>, timeout: Duration) -> Self {
        Self { checker, timeout }
    }

    /// Executor backed by the system `ping` utility.
    ///
    /// The per-reply wait is sized so all attempts fit inside the timeout.
    pub fn with_ping(attempts: u32, timeout: Duration) -> Self {
        let reply_wait = timeout / attempts.max(1);
        Self::new(Arc::new(PingChecker::new(attempts, reply_wait)), timeout)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Probe an address.
    ///
    /// Never fails: timeouts and checker errors produce an unreachable result.
    pub async fn probe(&self, address: &str) -> ProbeResult {
        match timeout(self.timeout, self.checker.check(address)).await {
            Ok(Ok(latency_ms)) => {
                debug!(address = %address, latency_ms, "Probe succeeded");
                ProbeResult::reachable(address, latency_ms)
            }
            Ok(Err(e)) => {
                debug!(address = %address, "Probe failed: {}", e);
                ProbeResult::unreachable(address)
            }
            Err(_) => {
                debug!(address = %address, timeout = ?self.timeout, "Probe timed out");
                ProbeResult::unreachable(address)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, bail};

    struct FixedChecker(f64);

    #[async_trait::async_trait]
    impl Checker for FixedChecker {
        async fn check(&self, _address: &str) -> Result<f64> {
            Ok(self.0)
        }
    }

    struct FailingChecker;

    #[async_trait::async_trait]
    impl Checker for FailingChecker {
        async fn check(&self, address: &str) -> Result<f64> {
            bail!("Destination host unreachable: {}", address)
        }
    }

    struct HangingChecker;

    #[async_trait::async_trait]
    impl Checker for HangingChecker {
        async fn check(&self, _address: &str) -> Result<f64> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(1.0)
        }
    }

    #[tokio::test]
    async fn test_reachable_probe() {
        let executor = ProbeExecutor::new(Arc::new(FixedChecker(12.3)), Duration::from_secs(5));

        let result = executor.probe("10.0.0.1").await;

        assert_eq!(result.address, "10.0.0.1");
        assert!(result.reachable);
        assert_eq!(result.latency_ms, 12.3);
    }

    #[tokio::test]
    async fn test_checker_error_is_unreachable() {
        let executor = ProbeExecutor::new(Arc::new(FailingChecker), Duration::from_secs(5));

        let result = executor.probe("10.0.0.2").await;

        assert!(!result.reachable);
        assert_eq!(result.latency_ms, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_unreachable() {
        let executor = ProbeExecutor::new(Arc::new(HangingChecker), Duration::from_secs(5));
        let started = tokio::time::Instant::now();

        let result = executor.probe("10.0.0.3").await;

        assert!(!result.reachable);
        assert_eq!(result.latency_ms, 0.0);
        assert!(started.elapsed() >= Duration::from_secs(5));
        assert!(started.elapsed() < Duration::from_secs(6));
    }

    #[test]
    fn test_with_ping_keeps_timeout() {
        let executor = ProbeExecutor::with_ping(2, Duration::from_secs(5));
        assert_eq!(executor.timeout(), Duration::from_secs(5));
    }
}
