use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier assigned to a target by the persistent store
pub type TargetId = i64;

/// Descriptive fields of a target that may be edited after registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetMetadata {
    pub name: String,
    /// Probe destination (IP address or host name)
    pub address: String,
    pub model: String,
    pub location: String,
}

/// Last known probe outcome for a target
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TargetStatus {
    pub reachable: bool,

    /// Round-trip time in milliseconds, `0.0` whenever `reachable` is false
    pub latency_ms: f64,

    /// Completion time of the last probe, `None` until the first scan
    pub last_checked_at: Option<DateTime<Utc>>,
}

/// One monitored device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub id: TargetId,
    #[serde(flatten)]
    pub metadata: TargetMetadata,
    #[serde(flatten)]
    pub status: TargetStatus,
}

impl Target {
    /// Create a never-probed target
    pub fn new(id: TargetId, metadata: TargetMetadata) -> Self {
        Self { id, metadata, status: TargetStatus::default() }
    }

    pub fn address(&self) -> &str {
        &self.metadata.address
    }
}

/// Outcome of probing a single address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    /// Address that was probed, used to correlate the result with a target
    pub address: String,

    pub reachable: bool,

    /// Round-trip time in milliseconds
    pub latency_ms: f64,

    /// Timestamp when the probe finished
    pub checked_at: DateTime<Utc>,
}

impl ProbeResult {
    /// Mark the address as reachable with the measured latency
    pub fn reachable(address: impl Into<String>, latency_ms: f64) -> Self {
        Self { address: address.into(), reachable: true, latency_ms, checked_at: Utc::now() }
    }

    /// Mark the address as unreachable
    pub fn unreachable(address: impl Into<String>) -> Self {
        Self { address: address.into(), reachable: false, latency_ms: 0.0, checked_at: Utc::now() }
    }

    /// Status fields this result writes into a target
    pub fn status(&self) -> TargetStatus {
        TargetStatus {
            reachable: self.reachable,
            latency_ms: if self.reachable { self.latency_ms } else { 0.0 },
            last_checked_at: Some(self.checked_at),
        }
    }
}

/// Status projection of a target served to readers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub id: TargetId,
    pub reachable: bool,
    pub latency_ms: f64,
    pub last_checked_at: Option<DateTime<Utc>>,
}

impl From<&Target> for StatusEntry {
    fn from(target: &Target) -> Self {
        Self {
            id: target.id,
            reachable: target.status.reachable,
            latency_ms: target.status.latency_ms,
            last_checked_at: target.status.last_checked_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(address: &str) -> TargetMetadata {
        TargetMetadata {
            name: "Front desk".to_string(),
            address: address.to_string(),
            model: "HP LaserJet M404".to_string(),
            location: "Floor 1".to_string(),
        }
    }

    #[test]
    fn test_new_target_is_unchecked() {
        let target = Target::new(7, metadata("10.0.0.7"));
        assert!(!target.status.reachable);
        assert_eq!(target.status.latency_ms, 0.0);
        assert!(target.status.last_checked_at.is_none());
    }

    #[test]
    fn test_unreachable_status_has_zero_latency() {
        let mut result = ProbeResult::unreachable("10.0.0.7");
        result.latency_ms = 42.0;

        let status = result.status();
        assert!(!status.reachable);
        assert_eq!(status.latency_ms, 0.0);
        assert_eq!(status.last_checked_at, Some(result.checked_at));
    }

    #[test]
    fn test_target_serializes_flat() {
        let target = Target::new(3, metadata("10.0.0.3"));
        let json = serde_json::to_value(&target).unwrap();

        assert_eq!(json["id"], 3);
        assert_eq!(json["address"], "10.0.0.3");
        assert_eq!(json["reachable"], false);
        assert!(json["last_checked_at"].is_null());
    }
}
