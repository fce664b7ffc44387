use super::types::*;
use crate::snapshot::types::Snapshot;

use async_trait::async_trait;
use std::sync::Arc;

/// The document store consumed by ingestion, index provisioning and history
/// queries.
///
/// Implementations must make each document write atomic; nothing above this
/// trait serializes access.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Cheap reachability check.
    async fn ping(&self) -> Result<(), StorageError>;

    /// Inserts a whole batch or nothing.
    async fn insert_many(&self, batch: Vec<Snapshot>) -> Result<Vec<DocumentId>, StorageError>;

    async fn find(&self, query: &FindQuery) -> Result<Vec<StoredSnapshot>, StorageError>;

    /// Ensures a single-field ascending index. Existing indexes are a no-op.
    async fn create_index(&self, field: &str) -> Result<IndexCreation, StorageError>;

    async fn list_indexes(&self) -> Result<Vec<String>, StorageError>;
}

/// Store handle shared by every component; owned by the process entrypoint.
pub type SharedStore = Arc<dyn SnapshotStore>;
