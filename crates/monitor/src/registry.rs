//! Authoritative in-memory set of monitored targets.
//!
//! Every read and write goes through a single [`RwLock`], which is never held
//! across I/O. A scan works on a [`TargetRegistry::snapshot`] and writes its
//! results back with [`TargetRegistry::merge_results`] in one write-locked
//! pass, so readers see either the pre-scan or the fully merged table.

use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{RegistryError, StoreError};
use crate::store::TargetStore;
use crate::types::{ProbeResult, Target, TargetId, TargetMetadata};

/// Counts produced by a merge pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Results written into a live target
    pub merged: usize,
    /// Results whose address no longer belongs to any target
    pub discarded: usize,
}

/// Registry of monitored targets and their latest status
#[derive(Debug, Default)]
pub struct TargetRegistry {
    targets: RwLock<Vec<Target>>,
}

impl TargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from the store's listing
    pub async fn load(store: &dyn TargetStore) -> Result<Self, StoreError> {
        let stored = store.list_targets().await?;
        let registry = Self::new();
        let loaded = registry
            .seed(stored.into_iter().map(|t| Target::new(t.id, t.metadata)))
            .await;
        info!("Loaded {} targets from store", loaded);
        Ok(registry)
    }

    /// Add targets in bulk, skipping any that would break uniqueness.
    ///
    /// Returns how many targets were added.
    pub async fn seed(&self, targets: impl IntoIterator<Item = Target>) -> usize {
        let mut guard = self.targets.write().await;
        let mut added = 0;
        for target in targets {
            match check_unique(&guard, target.id, target.address(), None) {
                Ok(()) => {
                    guard.push(target);
                    added += 1;
                }
                Err(e) => warn!(target_id = target.id, "Skipping target while seeding: {}", e),
            }
        }
        added
    }

    /// Independent copy of the current target set
    pub async fn snapshot(&self) -> Vec<Target> {
        self.targets.read().await.clone()
    }

    pub async fn get(&self, id: TargetId) -> Option<Target> {
        self.targets.read().await.iter().find(|t| t.id == id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.targets.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.targets.read().await.is_empty()
    }

    /// Register a target.
    ///
    /// Both the id and the address must be unused.
    pub async fn add(&self, target: Target) -> Result<(), RegistryError> {
        let mut guard = self.targets.write().await;
        check_unique(&guard, target.id, target.address(), None)?;
        debug!(target_id = target.id, address = %target.address(), "Target added");
        guard.push(target);
        Ok(())
    }

    /// Remove a target, returning it if it was present
    pub async fn remove(&self, id: TargetId) -> Option<Target> {
        let mut guard = self.targets.write().await;
        let index = guard.iter().position(|t| t.id == id)?;
        let removed = guard.remove(index);
        debug!(target_id = id, "Target removed");
        Some(removed)
    }

    /// Replace the descriptive fields of a target, leaving its status intact
    pub async fn update_metadata(
        &self,
        id: TargetId,
        metadata: TargetMetadata,
    ) -> Result<(), RegistryError> {
        let mut guard = self.targets.write().await;
        let index = guard.iter().position(|t| t.id == id).ok_or(RegistryError::NotFound(id))?;
        check_unique(&guard, id, &metadata.address, Some(id))?;
        guard[index].metadata = metadata;
        Ok(())
    }

    /// Write probe results into the status fields of the matching targets.
    ///
    /// Results are matched by address. A result whose address is no longer
    /// registered (the target was removed mid-scan) is discarded.
    pub async fn merge_results(&self, results: &[ProbeResult]) -> MergeOutcome {
        let mut guard = self.targets.write().await;
        let index: HashMap<&str, usize> =
            guard.iter().enumerate().map(|(i, t)| (t.metadata.address.as_str(), i)).collect();

        let mut outcome = MergeOutcome::default();
        let mut updates = Vec::with_capacity(results.len());
        for result in results {
            match index.get(result.address.as_str()) {
                Some(&i) => {
                    updates.push((i, result.status()));
                    outcome.merged += 1;
                }
                None => {
                    debug!(address = %result.address, "Discarding result for unregistered address");
                    outcome.discarded += 1;
                }
            }
        }
        drop(index);

        for (i, status) in updates {
            guard[i].status = status;
        }
        outcome
    }
}

fn check_unique(
    targets: &[Target],
    id: TargetId,
    address: &str,
    updating: Option<TargetId>,
) -> Result<(), RegistryError> {
    if updating.is_none() && targets.iter().any(|t| t.id == id) {
        return Err(RegistryError::DuplicateId(id));
    }
    match targets.iter().find(|t| t.address() == address && Some(t.id) != updating) {
        Some(existing) => Err(RegistryError::DuplicateAddress {
            address: address.to_owned(),
            existing: existing.id,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn metadata(address: &str) -> TargetMetadata {
        TargetMetadata {
            name: format!("Printer at {address}"),
            address: address.to_string(),
            model: "Kyocera ECOSYS".to_string(),
            location: "Office".to_string(),
        }
    }

    fn target(id: TargetId, address: &str) -> Target {
        Target::new(id, metadata(address))
    }

    #[tokio::test]
    async fn test_add_and_snapshot() {
        let registry = TargetRegistry::new();
        registry.add(target(1, "10.0.0.1")).await.unwrap();
        registry.add(target(2, "10.0.0.2")).await.unwrap();

        let snapshot = registry.snapshot().await;
        assert_eq!(snapshot.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 2]);
        assert!(snapshot.iter().all(|t| t.status.last_checked_at.is_none()));
    }

    #[tokio::test]
    async fn test_snapshot_is_independent() {
        let registry = TargetRegistry::new();
        registry.add(target(1, "10.0.0.1")).await.unwrap();

        let mut snapshot = registry.snapshot().await;
        snapshot[0].metadata.name = "changed".to_string();
        snapshot.clear();

        assert_eq!(registry.len().await, 1);
        assert_eq!(registry.get(1).await.unwrap().metadata.name, "Printer at 10.0.0.1");
    }

    #[tokio::test]
    async fn test_add_rejects_duplicates() {
        let registry = TargetRegistry::new();
        registry.add(target(1, "10.0.0.1")).await.unwrap();

        assert_eq!(registry.add(target(1, "10.0.0.9")).await, Err(RegistryError::DuplicateId(1)));
        assert_eq!(
            registry.add(target(2, "10.0.0.1")).await,
            Err(RegistryError::DuplicateAddress { address: "10.0.0.1".to_string(), existing: 1 })
        );
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_remove_absent_reports_not_found() {
        let registry = TargetRegistry::new();
        registry.add(target(1, "10.0.0.1")).await.unwrap();

        assert!(registry.remove(5).await.is_none());
        assert_eq!(registry.remove(1).await.map(|t| t.id), Some(1));
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_update_metadata_keeps_status() {
        let registry = TargetRegistry::new();
        registry.add(target(1, "10.0.0.1")).await.unwrap();
        registry.merge_results(&[ProbeResult::reachable("10.0.0.1", 4.5)]).await;

        let mut edited = metadata("10.0.0.11");
        edited.location = "Basement".to_string();
        registry.update_metadata(1, edited.clone()).await.unwrap();

        let stored = registry.get(1).await.unwrap();
        assert_eq!(stored.metadata, edited);
        assert!(stored.status.reachable);
        assert_eq!(stored.status.latency_ms, 4.5);
    }

    #[tokio::test]
    async fn test_update_metadata_errors() {
        let registry = TargetRegistry::new();
        registry.add(target(1, "10.0.0.1")).await.unwrap();
        registry.add(target(2, "10.0.0.2")).await.unwrap();

        assert_eq!(
            registry.update_metadata(3, metadata("10.0.0.3")).await,
            Err(RegistryError::NotFound(3))
        );
        assert!(matches!(
            registry.update_metadata(2, metadata("10.0.0.1")).await,
            Err(RegistryError::DuplicateAddress { existing: 1, .. })
        ));
        // Keeping its own address is not a conflict
        assert!(registry.update_metadata(2, metadata("10.0.0.2")).await.is_ok());
    }

    #[tokio::test]
    async fn test_merge_discards_unknown_addresses() {
        let registry = TargetRegistry::new();
        registry.add(target(1, "10.0.0.1")).await.unwrap();

        let outcome = registry
            .merge_results(&[
                ProbeResult::reachable("10.0.0.1", 12.3),
                ProbeResult::reachable("10.0.0.2", 8.0),
            ])
            .await;

        assert_eq!(outcome, MergeOutcome { merged: 1, discarded: 1 });
        assert_eq!(registry.len().await, 1);
        let status = registry.get(1).await.unwrap().status;
        assert!(status.reachable);
        assert_eq!(status.latency_ms, 12.3);
        assert!(status.last_checked_at.is_some());
    }

    #[tokio::test]
    async fn test_merge_is_idempotent() {
        let registry = TargetRegistry::new();
        registry.add(target(1, "10.0.0.1")).await.unwrap();
        let result = ProbeResult::reachable("10.0.0.1", 3.25);

        registry.merge_results(std::slice::from_ref(&result)).await;
        let once = registry.snapshot().await;
        registry.merge_results(&[result.clone(), result]).await;
        let twice = registry.snapshot().await;

        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn test_seed_skips_conflicts() {
        let registry = TargetRegistry::new();
        let added = registry
            .seed(vec![target(1, "10.0.0.1"), target(1, "10.0.0.5"), target(2, "10.0.0.1")])
            .await;

        assert_eq!(added, 1);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_snapshot_never_torn_under_mutation() {
        let registry = Arc::new(TargetRegistry::new());
        for id in 0..50 {
            registry.add(target(id, &format!("10.0.1.{id}"))).await.unwrap();
        }

        let writer = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move {
                for id in 50..250 {
                    registry.add(target(id, &format!("10.0.2.{id}"))).await.unwrap();
                    registry.remove(id - 50).await;
                }
            })
        };

        // Every add is paired with a remove, so any consistent view holds
        // either 50 or 51 fully formed targets.
        for _ in 0..200 {
            let snapshot = registry.snapshot().await;
            assert!(snapshot.len() == 50 || snapshot.len() == 51, "torn size {}", snapshot.len());
            assert!(snapshot.iter().all(|t| t.address().starts_with("10.0.")));
            tokio::task::yield_now().await;
        }

        writer.await.unwrap();
        assert_eq!(registry.len().await, 50);
    }
}
