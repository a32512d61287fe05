use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Broker identifier as reported in cluster metadata.
pub type BrokerId = i32;

/// Partition index within a topic, dense from 0.
pub type PartitionId = i32;

/// Ordered replica list for one partition. The first entry is the preferred
/// leader.
pub type ReplicaSet = Vec<BrokerId>;

/// Broker id that metadata uses for "no broker". Never part of a replica pool.
pub const NO_BROKER: BrokerId = -1;

/// Full replica placement for a topic, keyed by partition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicPlacement {
    pub topic: String,
    pub partitions: BTreeMap<PartitionId, ReplicaSet>,
}

impl TopicPlacement {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            partitions: BTreeMap::new(),
        }
    }

    pub fn replicas(&self, partition: PartitionId) -> Option<&[BrokerId]> {
        self.partitions.get(&partition).map(Vec::as_slice)
    }

    /// First partition whose replica count differs from `factor`, with its
    /// actual count.
    pub fn first_mismatch(&self, factor: usize) -> Option<(PartitionId, usize)> {
        self.partitions
            .iter()
            .find(|(_, replicas)| replicas.len() != factor)
            .map(|(&partition, replicas)| (partition, replicas.len()))
    }
}

/// In-flight reassignment state for one partition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReassignmentStatus {
    pub replicas: ReplicaSet,
    pub adding_replicas: Vec<BrokerId>,
    pub removing_replicas: Vec<BrokerId>,
}

impl ReassignmentStatus {
    pub fn is_reassigning(&self) -> bool {
        !self.adding_replicas.is_empty() || !self.removing_replicas.is_empty()
    }
}

// ── ACLs ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AclResourceType {
    Any,
    Topic,
    Group,
    Cluster,
    TransactionalId,
    DelegationToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AclPatternType {
    /// Filter-only: matches any pattern type.
    Any,
    /// Filter-only: matches literal, wildcard and prefixed resources that
    /// would apply to the given name.
    Match,
    Literal,
    Prefixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AclOperation {
    Any,
    All,
    Read,
    Write,
    Create,
    Delete,
    Alter,
    Describe,
    ClusterAction,
    DescribeConfigs,
    AlterConfigs,
    IdempotentWrite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AclPermissionType {
    Any,
    Deny,
    Allow,
}

/// A single ACL binding to create.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AclCreation {
    pub resource_type: AclResourceType,
    pub resource_name: String,
    pub pattern_type: AclPatternType,
    pub principal: String,
    pub host: String,
    pub operation: AclOperation,
    pub permission_type: AclPermissionType,
}

/// Selects ACL bindings to delete. `None` fields match anything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AclFilter {
    pub resource_type: AclResourceType,
    pub resource_name: Option<String>,
    pub pattern_type: AclPatternType,
    pub principal: Option<String>,
    pub host: Option<String>,
    pub operation: AclOperation,
    pub permission_type: AclPermissionType,
}

const WILDCARD_RESOURCE: &str = "*";

impl AclFilter {
    /// A filter that matches exactly the given binding.
    pub fn exact(acl: &AclCreation) -> Self {
        Self {
            resource_type: acl.resource_type,
            resource_name: Some(acl.resource_name.clone()),
            pattern_type: acl.pattern_type,
            principal: Some(acl.principal.clone()),
            host: Some(acl.host.clone()),
            operation: acl.operation,
            permission_type: acl.permission_type,
        }
    }

    pub fn matches(&self, acl: &AclCreation) -> bool {
        self.matches_resource(acl)
            && matches_optional(&self.principal, &acl.principal)
            && matches_optional(&self.host, &acl.host)
            && (self.operation == AclOperation::Any || self.operation == acl.operation)
            && (self.permission_type == AclPermissionType::Any
                || self.permission_type == acl.permission_type)
    }

    fn matches_resource(&self, acl: &AclCreation) -> bool {
        if self.resource_type != AclResourceType::Any && self.resource_type != acl.resource_type {
            return false;
        }

        let Some(name) = &self.resource_name else {
            return matches!(self.pattern_type, AclPatternType::Any | AclPatternType::Match)
                || self.pattern_type == acl.pattern_type;
        };

        match self.pattern_type {
            AclPatternType::Any => *name == acl.resource_name,
            AclPatternType::Match => match acl.pattern_type {
                AclPatternType::Literal => {
                    acl.resource_name == *name || acl.resource_name == WILDCARD_RESOURCE
                }
                AclPatternType::Prefixed => name.starts_with(&acl.resource_name),
                AclPatternType::Any | AclPatternType::Match => false,
            },
            pattern => pattern == acl.pattern_type && *name == acl.resource_name,
        }
    }
}

fn matches_optional(filter: &Option<String>, value: &str) -> bool {
    filter.as_deref().map_or(true, |f| f == value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic_acl(name: &str, pattern_type: AclPatternType) -> AclCreation {
        AclCreation {
            resource_type: AclResourceType::Topic,
            resource_name: name.to_string(),
            pattern_type,
            principal: "User:alice".to_string(),
            host: "*".to_string(),
            operation: AclOperation::Read,
            permission_type: AclPermissionType::Allow,
        }
    }

    fn any_filter() -> AclFilter {
        AclFilter {
            resource_type: AclResourceType::Any,
            resource_name: None,
            pattern_type: AclPatternType::Any,
            principal: None,
            host: None,
            operation: AclOperation::Any,
            permission_type: AclPermissionType::Any,
        }
    }

    #[test]
    fn placement_reports_first_mismatch() {
        let mut placement = TopicPlacement::new("events");
        placement.partitions.insert(0, vec![1, 2]);
        placement.partitions.insert(1, vec![2]);
        placement.partitions.insert(2, vec![3]);

        assert_eq!(placement.first_mismatch(2), Some((1, 1)));
        assert_eq!(placement.first_mismatch(1), Some((0, 2)));
        assert_eq!(placement.replicas(0), Some(&[1, 2][..]));
        assert_eq!(placement.replicas(9), None);
    }

    #[test]
    fn reassignment_status_detects_movement() {
        let idle = ReassignmentStatus {
            replicas: vec![1, 2],
            ..Default::default()
        };
        assert!(!idle.is_reassigning());

        let adding = ReassignmentStatus {
            adding_replicas: vec![3],
            ..idle.clone()
        };
        assert!(adding.is_reassigning());

        let removing = ReassignmentStatus {
            removing_replicas: vec![2],
            ..idle
        };
        assert!(removing.is_reassigning());
    }

    #[test]
    fn any_filter_matches_everything() {
        let filter = any_filter();
        assert!(filter.matches(&topic_acl("events", AclPatternType::Literal)));
        assert!(filter.matches(&topic_acl("ev", AclPatternType::Prefixed)));
    }

    #[test]
    fn exact_filter_matches_only_its_binding() {
        let acl = topic_acl("events", AclPatternType::Literal);
        let filter = AclFilter::exact(&acl);
        assert!(filter.matches(&acl));

        let mut write = acl.clone();
        write.operation = AclOperation::Write;
        assert!(!filter.matches(&write));
        assert!(!filter.matches(&topic_acl("events", AclPatternType::Prefixed)));
    }

    #[test]
    fn match_pattern_covers_literal_wildcard_and_prefix() {
        let filter = AclFilter {
            resource_type: AclResourceType::Topic,
            resource_name: Some("events_json".to_string()),
            pattern_type: AclPatternType::Match,
            ..any_filter()
        };

        assert!(filter.matches(&topic_acl("events_json", AclPatternType::Literal)));
        assert!(filter.matches(&topic_acl("*", AclPatternType::Literal)));
        assert!(filter.matches(&topic_acl("events", AclPatternType::Prefixed)));
        assert!(!filter.matches(&topic_acl("clicks", AclPatternType::Prefixed)));
        assert!(!filter.matches(&topic_acl("events", AclPatternType::Literal)));
    }

    #[test]
    fn resource_type_must_agree() {
        let filter = AclFilter {
            resource_type: AclResourceType::Group,
            ..any_filter()
        };
        assert!(!filter.matches(&topic_acl("events", AclPatternType::Literal)));
    }

    #[test]
    fn acl_creation_roundtrip() {
        let acl = topic_acl("events", AclPatternType::Prefixed);
        let json = serde_json::to_string(&acl).unwrap();
        let deserialized: AclCreation = serde_json::from_str(&json).unwrap();
        assert_eq!(acl, deserialized);
    }
}
