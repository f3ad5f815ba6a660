use std::sync::Arc;

use printwatch_monitor::{ScanTrigger, StatusReader, TargetRegistry, TargetStore};
use tokio::sync::{Mutex, MutexGuard};

/// Shared handles given to every HTTP worker
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TargetStore>,
    pub registry: Arc<TargetRegistry>,
    pub status: StatusReader,
    pub scans: ScanTrigger,
    writes: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(store: Arc<dyn TargetStore>, registry: Arc<TargetRegistry>, scans: ScanTrigger) -> Self {
        let status = StatusReader::new(Arc::clone(&registry));
        Self { store, registry, status, scans, writes: Arc::new(Mutex::new(())) }
    }

    /// Serialises mutations so each store write and its registry write land
    /// together, keeping the registry in step with the store.
    pub async fn write_lock(&self) -> MutexGuard<'_, ()> {
        self.writes.lock().await
    }
}
