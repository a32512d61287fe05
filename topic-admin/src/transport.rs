//! Capabilities consumed from the cluster-admin transport.
//!
//! Wire encoding, broker discovery and retries live behind these traits. The
//! crate ships an rdkafka-backed [`MetadataSource`] and an in-memory
//! implementation of both traits; the mutating [`ClusterAdmin`] side is
//! provided by the host application.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::metadata::ClusterMetadata;
use crate::types::{AclCreation, AclFilter, PartitionId, ReassignmentStatus, TopicPlacement};

pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Read side: brokers, topics, partitions and their current replicas.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Fetch a complete snapshot. The `version` field of the result is
    /// ignored; the cache assigns it.
    async fn fetch_metadata(&self) -> TransportResult<ClusterMetadata>;
}

/// Write side: reassignments and ACL mutations.
#[async_trait]
pub trait ClusterAdmin: Send + Sync {
    async fn submit_reassignment(&self, placement: &TopicPlacement) -> TransportResult<()>;

    /// Status for the requested partitions. Partitions with no reassignment
    /// in flight may be omitted.
    async fn reassignment_status(
        &self,
        topic: &str,
        partitions: &[PartitionId],
    ) -> TransportResult<HashMap<PartitionId, ReassignmentStatus>>;

    async fn create_acls(&self, creations: Vec<AclCreation>) -> TransportResult<()>;

    /// Returns the number of bindings removed.
    async fn delete_acls(&self, filters: Vec<AclFilter>) -> TransportResult<usize>;

    async fn list_acls(&self) -> TransportResult<Vec<AclCreation>>;
}
