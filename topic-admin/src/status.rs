use crate::error::Result;
use crate::transport::ClusterAdmin;
use crate::types::PartitionId;

/// Point-in-time check: true if any of `partitions` still has replicas being
/// added or removed. Holds no state; poll until it returns false.
pub async fn is_reassignment_in_progress(
    admin: &dyn ClusterAdmin,
    topic: &str,
    partitions: &[PartitionId],
) -> Result<bool> {
    if partitions.is_empty() {
        return Ok(false);
    }

    let statuses = admin.reassignment_status(topic, partitions).await?;
    let reassigning: Vec<PartitionId> = statuses
        .iter()
        .filter(|(partition, status)| {
            partitions.contains(*partition) && status.is_reassigning()
        })
        .map(|(&partition, _)| partition)
        .collect();

    if reassigning.is_empty() {
        return Ok(false);
    }

    tracing::debug!(topic, partitions = ?reassigning, "reassignment in progress");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::in_memory::InMemoryCluster;
    use crate::types::ReassignmentStatus;

    #[tokio::test]
    async fn idle_topic_is_not_reassigning() {
        let cluster = InMemoryCluster::new([1, 2, 3]);
        cluster.add_topic("events", vec![vec![1, 2], vec![2, 3]]);

        assert!(!is_reassignment_in_progress(&cluster, "events", &[0, 1])
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn any_moving_partition_reports_in_progress() {
        let cluster = InMemoryCluster::new([1, 2, 3]);
        cluster.add_topic("events", vec![vec![1, 2], vec![2, 3]]);
        cluster.set_reassignment_status(
            "events",
            1,
            ReassignmentStatus {
                replicas: vec![2, 3],
                adding_replicas: vec![],
                removing_replicas: vec![3],
            },
        );

        assert!(is_reassignment_in_progress(&cluster, "events", &[0, 1])
            .await
            .unwrap());
        // Only queried partitions count.
        assert!(!is_reassignment_in_progress(&cluster, "events", &[0])
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn no_partitions_skips_the_call() {
        let cluster = InMemoryCluster::new([1]);
        assert!(!is_reassignment_in_progress(&cluster, "events", &[])
            .await
            .unwrap());
        assert!(cluster.calls().is_empty());
    }
}
