use rand::Rng;

use crate::error::{Error, Result};
use crate::metadata::ClusterMetadata;
use crate::metrics_consts::REASSIGNMENTS_PLANNED_COUNTER;
use crate::planner::plan_replicas;
use crate::types::TopicPlacement;

/// Build the placement that takes every partition of `topic` to
/// `target_replication_factor`.
///
/// Purely local: nothing is sent to the cluster. The first partition that
/// cannot be planned aborts the whole build. The result is checked so that
/// every partition has exactly the target number of replicas.
pub fn build_assignment<R>(
    metadata: &ClusterMetadata,
    topic: &str,
    target_replication_factor: i32,
    rng: &mut R,
) -> Result<TopicPlacement>
where
    R: Rng + ?Sized,
{
    let result = build(metadata, topic, target_replication_factor, rng);
    let outcome = if result.is_ok() { "success" } else { "failure" };
    metrics::counter!(REASSIGNMENTS_PLANNED_COUNTER, "outcome" => outcome).increment(1);
    result
}

fn build<R>(
    metadata: &ClusterMetadata,
    topic: &str,
    target_replication_factor: i32,
    rng: &mut R,
) -> Result<TopicPlacement>
where
    R: Rng + ?Sized,
{
    if target_replication_factor < 1 {
        return Err(Error::InvalidReplicationFactor(target_replication_factor));
    }

    let topic_metadata = metadata.topic(topic)?;
    let pool = metadata.replica_pool();
    let mut placement = TopicPlacement::new(topic);

    for (&partition, current) in &topic_metadata.partitions {
        let delta = target_replication_factor - current.len() as i32;
        let replicas = plan_replicas(&pool, current, delta, rng).inspect_err(|e| {
            tracing::warn!(
                topic,
                partition,
                current = ?current,
                delta,
                error = %e,
                "cannot plan partition replicas"
            );
        })?;

        tracing::debug!(
            topic,
            partition,
            old = ?current,
            new = ?replicas,
            "planned partition replicas"
        );
        placement.partitions.insert(partition, replicas);
    }

    let expected = target_replication_factor.unsigned_abs() as usize;
    if let Some((partition, actual)) = placement.first_mismatch(expected) {
        return Err(Error::InconsistentPlan {
            partition,
            expected,
            actual,
        });
    }

    tracing::info!(
        topic,
        partitions = placement.partitions.len(),
        replication_factor = target_replication_factor,
        metadata_version = metadata.version,
        "built reassignment plan"
    );

    Ok(placement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BrokerId, NO_BROKER};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn metadata(brokers: &[BrokerId], replicas: &[&[BrokerId]]) -> ClusterMetadata {
        ClusterMetadata::from_parts(
            brokers.iter().copied(),
            replicas
                .iter()
                .enumerate()
                .map(|(p, r)| ("events".to_string(), p as i32, r.to_vec())),
        )
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(1)
    }

    #[test]
    fn unchanged_factor_keeps_placement() {
        let md = metadata(&[1, 2, 3], &[&[1, 2], &[2, 3], &[3, 1]]);
        let placement = build_assignment(&md, "events", 2, &mut rng()).unwrap();

        assert_eq!(placement.topic, "events");
        assert_eq!(placement.replicas(0), Some(&[1, 2][..]));
        assert_eq!(placement.replicas(1), Some(&[2, 3][..]));
        assert_eq!(placement.replicas(2), Some(&[3, 1][..]));
    }

    #[test]
    fn grows_every_partition_to_target() {
        let md = metadata(&[1, 2, 3, 4, 5, NO_BROKER], &[&[1], &[2], &[3], &[4]]);
        let placement = build_assignment(&md, "events", 3, &mut rng()).unwrap();

        assert_eq!(placement.partitions.len(), 4);
        for (partition, replicas) in &placement.partitions {
            assert_eq!(replicas.len(), 3);
            assert_eq!(replicas[0], partition + 1, "leader must stay first");
            let distinct: HashSet<_> = replicas.iter().collect();
            assert_eq!(distinct.len(), 3);
            assert!(!replicas.contains(&NO_BROKER));
        }
    }

    #[test]
    fn shrinks_every_partition_from_tail() {
        let md = metadata(&[1, 2, 3], &[&[1, 2, 3], &[2, 3, 1]]);
        let placement = build_assignment(&md, "events", 1, &mut rng()).unwrap();

        assert_eq!(placement.replicas(0), Some(&[1][..]));
        assert_eq!(placement.replicas(1), Some(&[2][..]));
    }

    #[test]
    fn normalises_uneven_partitions() {
        let md = metadata(&[1, 2, 3], &[&[1, 2, 3], &[2]]);
        let placement = build_assignment(&md, "events", 2, &mut rng()).unwrap();

        assert_eq!(placement.replicas(0), Some(&[1, 2][..]));
        assert_eq!(placement.replicas(1).unwrap().len(), 2);
        assert_eq!(placement.replicas(1).unwrap()[0], 2);
    }

    #[test]
    fn first_failing_partition_aborts() {
        let md = metadata(&[1, 2, 3], &[&[1], &[1, 2, 3]]);
        let err = build_assignment(&md, "events", 4, &mut rng()).unwrap_err();
        assert_eq!(
            err,
            Error::InsufficientBrokers {
                needed: 3,
                available: 2
            }
        );
    }

    #[test]
    fn unknown_topic() {
        let md = metadata(&[1, 2, 3], &[&[1]]);
        let err = build_assignment(&md, "clicks", 1, &mut rng()).unwrap_err();
        assert_eq!(err, Error::TopicNotFound("clicks".to_string()));
    }

    #[test]
    fn rejects_factor_below_one() {
        let md = metadata(&[1, 2, 3], &[&[1]]);
        for factor in [0, -1] {
            let err = build_assignment(&md, "events", factor, &mut rng()).unwrap_err();
            assert_eq!(err, Error::InvalidReplicationFactor(factor));
        }
    }

    #[test]
    fn same_seed_same_plan() {
        let md = metadata(&[1, 2, 3, 4, 5, 6], &[&[1], &[2], &[3]]);
        let a = build_assignment(&md, "events", 3, &mut StdRng::seed_from_u64(9)).unwrap();
        let b = build_assignment(&md, "events", 3, &mut StdRng::seed_from_u64(9)).unwrap();
        assert_eq!(a, b);
    }
}
