use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::types::{TargetId, TargetMetadata};

/// A target as recorded by the persistent store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTarget {
    pub id: TargetId,
    #[serde(flatten)]
    pub metadata: TargetMetadata,
}

/// System of record for target identity and metadata.
///
/// The monitor only reads the listing once at startup; the HTTP layer calls
/// the mutating methods and forwards successful changes to the registry.
#[async_trait]
pub trait TargetStore: Send + Sync {
    /// Persist a new target and return its assigned id
    async fn create_target(&self, metadata: &TargetMetadata) -> Result<TargetId, StoreError>;

    /// Overwrite a target's metadata, returning `false` if it does not exist
    async fn update_target(&self, id: TargetId, metadata: &TargetMetadata)
    -> Result<bool, StoreError>;

    /// Delete a target, returning `false` if it does not exist
    async fn delete_target(&self, id: TargetId) -> Result<bool, StoreError>;

    /// All persisted targets
    async fn list_targets(&self) -> Result<Vec<StoredTarget>, StoreError>;
}
