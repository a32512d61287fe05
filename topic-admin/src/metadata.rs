use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::metrics_consts::METADATA_REFRESHES_COUNTER;
use crate::transport::MetadataSource;
use crate::types::{BrokerId, PartitionId, ReplicaSet, NO_BROKER};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicMetadata {
    pub name: String,
    pub partitions: BTreeMap<PartitionId, ReplicaSet>,
}

impl TopicMetadata {
    pub fn partition_ids(&self) -> Vec<PartitionId> {
        self.partitions.keys().copied().collect()
    }

    /// Replica count of the widest partition. Partitions of a healthy topic
    /// all share one factor.
    pub fn replication_factor(&self) -> usize {
        self.partitions.values().map(Vec::len).max().unwrap_or(0)
    }
}

/// Immutable view of cluster membership and topic placement.
///
/// A new snapshot is built on every refresh and swapped in whole; holders of
/// an older `Arc<ClusterMetadata>` keep a consistent view for as long as they
/// need it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterMetadata {
    /// Assigned by [`MetadataCache`] on swap; strictly increasing.
    pub version: u64,
    pub brokers: BTreeSet<BrokerId>,
    pub topics: BTreeMap<String, TopicMetadata>,
}

impl ClusterMetadata {
    /// Build a snapshot from broker ids and `(topic, partition, replicas)`
    /// rows, as metadata responses list them.
    pub fn from_parts<B, P>(brokers: B, partitions: P) -> Self
    where
        B: IntoIterator<Item = BrokerId>,
        P: IntoIterator<Item = (String, PartitionId, ReplicaSet)>,
    {
        let mut topics: BTreeMap<String, TopicMetadata> = BTreeMap::new();
        for (topic, partition, replicas) in partitions {
            topics
                .entry(topic.clone())
                .or_insert_with(|| TopicMetadata {
                    name: topic,
                    partitions: BTreeMap::new(),
                })
                .partitions
                .insert(partition, replicas);
        }

        Self {
            version: 0,
            brokers: brokers.into_iter().collect(),
            topics,
        }
    }

    /// Every broker eligible to host a replica.
    pub fn replica_pool(&self) -> BTreeSet<BrokerId> {
        self.brokers
            .iter()
            .copied()
            .filter(|&id| id != NO_BROKER)
            .collect()
    }

    pub fn topic(&self, name: &str) -> Result<&TopicMetadata> {
        self.topics
            .get(name)
            .ok_or_else(|| Error::TopicNotFound(name.to_string()))
    }

    pub fn has_topic(&self, name: &str) -> bool {
        self.topics.contains_key(name)
    }

    pub fn partitions(&self, topic: &str) -> Result<Vec<PartitionId>> {
        Ok(self.topic(topic)?.partition_ids())
    }

    pub fn replicas(&self, topic: &str, partition: PartitionId) -> Result<&[BrokerId]> {
        self.topic(topic)?
            .partitions
            .get(&partition)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::PartitionNotFound {
                topic: topic.to_string(),
                partition,
            })
    }
}

/// Shared, refreshable holder of the latest [`ClusterMetadata`].
pub struct MetadataCache {
    source: Arc<dyn MetadataSource>,
    current: RwLock<Arc<ClusterMetadata>>,
}

impl MetadataCache {
    pub fn new(source: Arc<dyn MetadataSource>) -> Self {
        Self {
            source,
            current: RwLock::new(Arc::new(ClusterMetadata::default())),
        }
    }

    /// Latest snapshot. Never blocks on an in-progress refresh's fetch.
    pub fn snapshot(&self) -> Arc<ClusterMetadata> {
        Arc::clone(&self.current.read())
    }

    /// Fetch a fresh snapshot and swap it in.
    ///
    /// The fetch runs without holding the lock; only the pointer swap is
    /// exclusive. On failure the previous snapshot stays in place.
    pub async fn refresh(&self) -> Result<Arc<ClusterMetadata>> {
        let mut fresh = match self.source.fetch_metadata().await {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::error!(error = %e, "failed to refresh cluster metadata");
                metrics::counter!(METADATA_REFRESHES_COUNTER, "outcome" => "failure").increment(1);
                return Err(e.into());
            }
        };

        let snapshot = {
            let mut current = self.current.write();
            fresh.version = current.version + 1;
            let snapshot = Arc::new(fresh);
            *current = Arc::clone(&snapshot);
            snapshot
        };

        tracing::debug!(
            version = snapshot.version,
            brokers = snapshot.brokers.len(),
            topics = snapshot.topics.len(),
            "refreshed cluster metadata"
        );
        metrics::counter!(METADATA_REFRESHES_COUNTER, "outcome" => "success").increment(1);

        Ok(snapshot)
    }
}
