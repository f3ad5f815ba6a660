//! Reachability monitor for networked printers
//!
//! This crate is responsible for:
//! - Probing individual addresses with a bounded timeout
//! - Fanning probes out over a bounded worker set
//! - Keeping the registry of monitored targets and their latest status
//! - Driving periodic scans and merging their results
//!
//! Persistence and the HTTP surface live outside this crate; the store is
//! consumed through the [`TargetStore`] trait.

pub mod checker;
pub mod config;
pub mod error;
pub mod executor;
pub mod monitor;
pub mod registry;
pub mod scheduler;
pub mod status;
pub mod store;
pub mod types;

pub use checker::{Checker, PingChecker};
pub use config::MonitorConfig;
pub use error::{MonitorError, RegistryError, StoreError};
pub use executor::ProbeExecutor;
pub use monitor::{MonitorHandle, MonitorLoop, MonitorState, ScanOutcome, ScanReport, ScanTrigger};
pub use registry::{MergeOutcome, TargetRegistry};
pub use scheduler::ProbeScheduler;
pub use status::StatusReader;
pub use store::{StoredTarget, TargetStore};
pub use types::{ProbeResult, StatusEntry, Target, TargetId, TargetMetadata, TargetStatus};
