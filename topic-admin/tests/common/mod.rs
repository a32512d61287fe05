#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

use topic_admin::config::Config;
use topic_admin::in_memory::{AdminCall, InMemoryCluster};
use topic_admin::types::{AclOperation, AclPatternType, AclPermissionType, AclResourceType};
use topic_admin::{AclCreation, AdminClient};

pub const ACL_WINDOW: Duration = Duration::from_millis(500);
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub fn config() -> Config {
    Config {
        acl_batch_window_ms: ACL_WINDOW.as_millis() as u64,
        reassignment_poll_interval_ms: POLL_INTERVAL.as_millis() as u64,
        ..Config::default()
    }
}

/// Cluster with brokers 1..=5 and topic `events` of four single-replica
/// partitions led by brokers 1..=4.
pub fn cluster() -> Arc<InMemoryCluster> {
    let cluster = Arc::new(InMemoryCluster::new(1..=5));
    cluster.add_topic("events", vec![vec![1], vec![2], vec![3], vec![4]]);
    cluster
}

pub fn client(cluster: &Arc<InMemoryCluster>) -> Arc<AdminClient> {
    Arc::new(AdminClient::with_rng(
        &config(),
        cluster.clone(),
        cluster.clone(),
        StdRng::seed_from_u64(17),
    ))
}

pub fn acl(principal: &str, topic: &str) -> AclCreation {
    AclCreation {
        resource_type: AclResourceType::Topic,
        resource_name: topic.to_string(),
        pattern_type: AclPatternType::Literal,
        principal: format!("User:{principal}"),
        host: "*".to_string(),
        operation: AclOperation::Read,
        permission_type: AclPermissionType::Allow,
    }
}

pub fn count_calls(cluster: &InMemoryCluster, pred: impl Fn(&AdminCall) -> bool) -> usize {
    cluster.calls().iter().filter(|c| pred(c)).count()
}
