use std::sync::Arc;

use crate::registry::TargetRegistry;
use crate::types::{StatusEntry, Target, TargetId};

/// Read-only view over the registry for status queries.
///
/// Never probes; every call is a snapshot read.
#[derive(Debug, Clone)]
pub struct StatusReader {
    registry: Arc<TargetRegistry>,
}

impl StatusReader {
    pub fn new(registry: Arc<TargetRegistry>) -> Self {
        Self { registry }
    }

    pub async fn list_statuses(&self) -> Vec<StatusEntry> {
        self.registry.snapshot().await.iter().map(StatusEntry::from).collect()
    }

    pub async fn list_targets(&self) -> Vec<Target> {
        self.registry.snapshot().await
    }

    pub async fn get_target(&self, id: TargetId) -> Option<Target> {
        self.registry.get(id).await
    }
}
