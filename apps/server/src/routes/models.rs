use chrono::{DateTime, Local, Utc};
use printwatch_monitor::{StatusEntry, Target, TargetId, TargetMetadata};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Body of create and update requests
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PrinterRequest {
    pub name: Option<String>,
    pub ip: Option<String>,
    pub model: Option<String>,
    pub location: Option<String>,
}

impl PrinterRequest {
    /// Every field is required and must be non-empty
    pub fn validate(self) -> Result<TargetMetadata, ApiError> {
        fn required(value: Option<String>, field: &'static str) -> Result<String, ApiError> {
            match value {
                Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
                _ => Err(ApiError::MissingField(field)),
            }
        }

        Ok(TargetMetadata {
            name: required(self.name, "name")?,
            address: required(self.ip, "ip")?,
            model: required(self.model, "model")?,
            location: required(self.location, "location")?,
        })
    }
}

/// Wall-clock time of the last check, empty before the first one
fn last_check(at: Option<DateTime<Utc>>) -> String {
    at.map(|t| t.with_timezone(&Local).format("%H:%M:%S").to_string()).unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrinterView {
    pub id: TargetId,
    pub name: String,
    pub ip: String,
    pub model: String,
    pub location: String,
    pub status: bool,
    pub response_time: f64,
    pub last_check: String,
}

impl From<Target> for PrinterView {
    fn from(target: Target) -> Self {
        let TargetMetadata { name, address, model, location } = target.metadata;
        Self {
            id: target.id,
            name,
            ip: address,
            model,
            location,
            status: target.status.reachable,
            response_time: target.status.latency_ms,
            last_check: last_check(target.status.last_checked_at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusView {
    pub id: TargetId,
    pub status: bool,
    pub response_time: f64,
    pub last_check: String,
}

impl From<StatusEntry> for StatusView {
    fn from(entry: StatusEntry) -> Self {
        Self {
            id: entry.id,
            status: entry.reachable,
            response_time: entry.latency_ms,
            last_check: last_check(entry.last_checked_at),
        }
    }
}
