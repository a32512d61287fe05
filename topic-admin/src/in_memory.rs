//! In-memory cluster implementing both transport capabilities.
//!
//! Reassignments submitted here stay "in flight" (reported with adding and
//! removing replicas) until [`InMemoryCluster::complete_reassignments`] is
//! called. Every call is recorded for assertions.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::TransportError;
use crate::metadata::ClusterMetadata;
use crate::transport::{ClusterAdmin, MetadataSource, TransportResult};
use crate::types::{
    AclCreation, AclFilter, BrokerId, PartitionId, ReassignmentStatus, ReplicaSet, TopicPlacement,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCall {
    FetchMetadata,
    SubmitReassignment(TopicPlacement),
    ReassignmentStatus {
        topic: String,
        partitions: Vec<PartitionId>,
    },
    CreateAcls(Vec<AclCreation>),
    DeleteAcls(Vec<AclFilter>),
    ListAcls,
}

#[derive(Default)]
struct ClusterState {
    brokers: BTreeSet<BrokerId>,
    topics: BTreeMap<String, BTreeMap<PartitionId, ReplicaSet>>,
    in_flight: BTreeMap<(String, PartitionId), ReassignmentStatus>,
    acls: Vec<AclCreation>,
    calls: Vec<AdminCall>,
    acl_failures: usize,
    metadata_failures: usize,
}

#[derive(Default)]
pub struct InMemoryCluster {
    state: Mutex<ClusterState>,
}

impl InMemoryCluster {
    pub fn new(brokers: impl IntoIterator<Item = BrokerId>) -> Self {
        let cluster = Self::default();
        cluster.state.lock().brokers = brokers.into_iter().collect();
        cluster
    }

    /// Add a topic whose partition `i` has replicas `partitions[i]`.
    pub fn add_topic(&self, topic: &str, partitions: Vec<ReplicaSet>) {
        let partitions = (0..)
            .zip(partitions)
            .collect::<BTreeMap<PartitionId, ReplicaSet>>();
        self.state.lock().topics.insert(topic.to_string(), partitions);
    }

    pub fn add_broker(&self, broker: BrokerId) {
        self.state.lock().brokers.insert(broker);
    }

    pub fn remove_broker(&self, broker: BrokerId) {
        self.state.lock().brokers.remove(&broker);
    }

    pub fn replicas(&self, topic: &str, partition: PartitionId) -> Option<ReplicaSet> {
        self.state
            .lock()
            .topics
            .get(topic)
            .and_then(|p| p.get(&partition))
            .cloned()
    }

    pub fn set_reassignment_status(
        &self,
        topic: &str,
        partition: PartitionId,
        status: ReassignmentStatus,
    ) {
        self.state
            .lock()
            .in_flight
            .insert((topic.to_string(), partition), status);
    }

    /// Finish every in-flight reassignment: target replicas become current.
    pub fn complete_reassignments(&self) {
        let mut state = self.state.lock();
        let in_flight = std::mem::take(&mut state.in_flight);
        for ((topic, partition), status) in in_flight {
            if let Some(partitions) = state.topics.get_mut(&topic) {
                partitions.insert(partition, status.replicas);
            }
        }
    }

    pub fn insert_acls(&self, acls: impl IntoIterator<Item = AclCreation>) {
        self.state.lock().acls.extend(acls);
    }

    pub fn acls(&self) -> Vec<AclCreation> {
        self.state.lock().acls.clone()
    }

    /// Make the next `count` ACL create/delete calls fail.
    pub fn fail_next_acl_flushes(&self, count: usize) {
        self.state.lock().acl_failures = count;
    }

    /// Make the next `count` metadata fetches fail.
    pub fn fail_next_metadata_fetches(&self, count: usize) {
        self.state.lock().metadata_failures = count;
    }

    pub fn calls(&self) -> Vec<AdminCall> {
        self.state.lock().calls.clone()
    }

    fn take_acl_failure(state: &mut ClusterState, operation: &'static str) -> TransportResult<()> {
        if state.acl_failures > 0 {
            state.acl_failures -= 1;
            return Err(TransportError::rejected(operation, "injected failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl MetadataSource for InMemoryCluster {
    async fn fetch_metadata(&self) -> TransportResult<ClusterMetadata> {
        let mut state = self.state.lock();
        state.calls.push(AdminCall::FetchMetadata);
        if state.metadata_failures > 0 {
            state.metadata_failures -= 1;
            return Err(TransportError::rejected("fetch_metadata", "injected failure"));
        }

        let rows = state.topics.iter().flat_map(|(topic, partitions)| {
            partitions
                .iter()
                .map(move |(&partition, replicas)| (topic.clone(), partition, replicas.clone()))
        });
        Ok(ClusterMetadata::from_parts(state.brokers.iter().copied(), rows))
    }
}

#[async_trait]
impl ClusterAdmin for InMemoryCluster {
    async fn submit_reassignment(&self, placement: &TopicPlacement) -> TransportResult<()> {
        let mut state = self.state.lock();
        state
            .calls
            .push(AdminCall::SubmitReassignment(placement.clone()));

        let Some(current) = state.topics.get(&placement.topic).cloned() else {
            return Err(TransportError::rejected(
                "submit_reassignment",
                format!("unknown topic {}", placement.topic),
            ));
        };

        for (&partition, target) in &placement.partitions {
            let old = current.get(&partition).cloned().unwrap_or_default();
            if &old == target {
                continue;
            }
            let status = ReassignmentStatus {
                replicas: target.clone(),
                adding_replicas: target.iter().copied().filter(|b| !old.contains(b)).collect(),
                removing_replicas: old.iter().copied().filter(|b| !target.contains(b)).collect(),
            };
            state
                .in_flight
                .insert((placement.topic.clone(), partition), status);
        }
        Ok(())
    }

    async fn reassignment_status(
        &self,
        topic: &str,
        partitions: &[PartitionId],
    ) -> TransportResult<HashMap<PartitionId, ReassignmentStatus>> {
        let mut state = self.state.lock();
        state.calls.push(AdminCall::ReassignmentStatus {
            topic: topic.to_string(),
            partitions: partitions.to_vec(),
        });

        Ok(partitions
            .iter()
            .filter_map(|&partition| {
                state
                    .in_flight
                    .get(&(topic.to_string(), partition))
                    .map(|status| (partition, status.clone()))
            })
            .collect())
    }

    async fn create_acls(&self, creations: Vec<AclCreation>) -> TransportResult<()> {
        let mut state = self.state.lock();
        state.calls.push(AdminCall::CreateAcls(creations.clone()));
        Self::take_acl_failure(&mut state, "create_acls")?;

        for acl in creations {
            if !state.acls.contains(&acl) {
                state.acls.push(acl);
            }
        }
        Ok(())
    }

    async fn delete_acls(&self, filters: Vec<AclFilter>) -> TransportResult<usize> {
        let mut state = self.state.lock();
        state.calls.push(AdminCall::DeleteAcls(filters.clone()));
        Self::take_acl_failure(&mut state, "delete_acls")?;

        let before = state.acls.len();
        state
            .acls
            .retain(|acl| !filters.iter().any(|filter| filter.matches(acl)));
        Ok(before - state.acls.len())
    }

    async fn list_acls(&self) -> TransportResult<Vec<AclCreation>> {
        let mut state = self.state.lock();
        state.calls.push(AdminCall::ListAcls);
        Ok(state.acls.clone())
    }
}
