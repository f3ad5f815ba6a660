use thiserror::Error;

use crate::types::TargetId;

/// Rejections from registry mutation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Target {0} not found")]
    NotFound(TargetId),

    #[error("Target {0} is already registered")]
    DuplicateId(TargetId),

    #[error("Address {address} is already used by target {existing}")]
    DuplicateAddress { address: String, existing: TargetId },
}

/// Failures of the scan pipeline, absorbed by the monitor loop
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Scan returned {actual} results for {expected} targets")]
    IncompleteScan { expected: usize, actual: usize },

    #[error("Scan task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Failures reported by a persistent target store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Address {0} is already registered")]
    DuplicateAddress(String),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}
