//! Replication-factor and ACL administration for a Kafka cluster.
//!
//! Replica planning is purely local over an immutable [`ClusterMetadata`]
//! snapshot; submission and ACL mutation go through the [`ClusterAdmin`]
//! capability. ACL mutations are coalesced by debounced batch queues.

pub mod acl;
pub mod assignment;
pub mod client;
pub mod config;
pub mod error;
pub mod in_memory;
pub mod kafka;
pub mod metadata;
pub mod metrics_consts;
pub mod planner;
pub mod status;
pub mod transport;
pub mod types;

pub use client::AdminClient;
pub use error::{Error, Result, TransportError};
pub use metadata::{ClusterMetadata, MetadataCache, TopicMetadata};
pub use transport::{ClusterAdmin, MetadataSource};
pub use types::{
    AclCreation, AclFilter, BrokerId, PartitionId, ReassignmentStatus, ReplicaSet,
    TopicPlacement, NO_BROKER,
};
