use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for the scan cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Pause between the end of one scan and the start of the next
    pub interval_seconds: u64,
    /// Upper bound for a single probe, all attempts included
    pub probe_timeout_seconds: u64,
    /// Echo requests sent per probe
    pub attempts: u32,
    /// Probes allowed in flight at once
    pub workers: usize,
    /// Run a scan as soon as the monitor starts
    pub scan_on_start: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 30,
            probe_timeout_seconds: 5,
            attempts: 2,
            workers: 10,
            scan_on_start: true,
        }
    }
}

impl MonitorConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds.max(1))
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_seconds.max(1))
    }
}
