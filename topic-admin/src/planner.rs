//! Per-partition replica planning.
//!
//! Growing a partition appends brokers picked uniformly at random from those
//! not already holding a replica; shrinking drops replicas from the tail so
//! the preferred leader at index 0 survives. Randomness is injected so callers
//! and tests choose the source.

use std::collections::{BTreeSet, HashSet};

use rand::Rng;

use crate::error::{Error, Result};
use crate::types::{BrokerId, ReplicaSet};

/// Brokers from `pool` that hold no replica in `used`, in pool order.
///
/// `extra` is only a capacity hint. Callers check that enough candidates
/// exist; this function does not.
pub fn find_unused_replicas(
    pool: &BTreeSet<BrokerId>,
    used: &[BrokerId],
    extra: usize,
) -> Vec<BrokerId> {
    let used: HashSet<BrokerId> = used.iter().copied().collect();

    let mut unused = Vec::with_capacity(extra);
    for &broker in pool {
        if !used.contains(&broker) {
            unused.push(broker);
        }
    }
    unused
}

/// Compute a partition's new replica set for a replication factor change of
/// `delta` (new factor minus current factor).
///
/// - `delta == 0` returns `current` unchanged.
/// - `delta < 0` drops the last `|delta|` replicas; fails with
///   [`Error::InsufficientReplicas`] if none would remain.
/// - `delta > 0` appends `delta` distinct brokers not already in `current`;
///   fails with [`Error::InsufficientBrokers`] if the pool doesn't have that
///   many unused brokers.
///
/// `current` is never modified, on success or failure.
pub fn plan_replicas<R>(
    pool: &BTreeSet<BrokerId>,
    current: &[BrokerId],
    delta: i32,
    rng: &mut R,
) -> Result<ReplicaSet>
where
    R: Rng + ?Sized,
{
    if delta == 0 {
        return Ok(current.to_vec());
    }

    if delta < 0 {
        let remove = delta.unsigned_abs() as usize;
        if remove >= current.len() {
            return Err(Error::InsufficientReplicas {
                current: current.len(),
                remove,
            });
        }
        return Ok(current[..current.len() - remove].to_vec());
    }

    let needed = delta.unsigned_abs() as usize;
    let extra = pool.len().saturating_sub(current.len());
    let mut unused = find_unused_replicas(pool, current, extra);
    if unused.len() < needed {
        return Err(Error::InsufficientBrokers {
            needed,
            available: unused.len(),
        });
    }

    let mut replicas = Vec::with_capacity(current.len() + needed);
    replicas.extend_from_slice(current);
    for _ in 0..needed {
        let pick = rng.gen_range(0..unused.len());
        replicas.push(unused.swap_remove(pick));
    }

    Ok(replicas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn pool(ids: &[BrokerId]) -> BTreeSet<BrokerId> {
        ids.iter().copied().collect()
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn unused_replicas_are_pool_minus_used() {
        let unused = find_unused_replicas(&pool(&[1, 2, 3, 4, 5]), &[4, 1], 3);
        assert_eq!(unused, vec![2, 3, 5]);
    }

    #[test]
    fn unused_replicas_ignore_brokers_outside_pool() {
        let unused = find_unused_replicas(&pool(&[1, 2, 3]), &[1, 9], 1);
        assert_eq!(unused, vec![2, 3]);
    }

    #[test]
    fn zero_delta_returns_input_unchanged() {
        for current in [vec![3, 1, 2], vec![5], vec![2, 4, 1, 3]] {
            let planned = plan_replicas(&pool(&[1, 2, 3, 4, 5]), &current, 0, &mut rng()).unwrap();
            assert_eq!(planned, current);
        }
    }

    #[test]
    fn shrink_drops_from_tail() {
        let current = vec![4, 2, 3, 1];
        let p = pool(&[1, 2, 3, 4]);

        assert_eq!(plan_replicas(&p, &current, -1, &mut rng()).unwrap(), vec![4, 2, 3]);
        assert_eq!(plan_replicas(&p, &current, -2, &mut rng()).unwrap(), vec![4, 2]);
    }

    #[test]
    fn shrink_to_single_replica_keeps_leader() {
        let current = vec![1, 2, 3, 4];
        let planned = plan_replicas(&pool(&[1, 2, 3, 4]), &current, -3, &mut rng()).unwrap();
        assert_eq!(planned, vec![1]);
    }

    #[test]
    fn shrink_to_zero_fails() {
        let current = vec![1, 2, 3, 4];
        let err = plan_replicas(&pool(&[1, 2, 3, 4]), &current, -4, &mut rng()).unwrap_err();
        assert_eq!(
            err,
            Error::InsufficientReplicas {
                current: 4,
                remove: 4
            }
        );

        let err = plan_replicas(&pool(&[1, 2, 3, 4]), &current, -10, &mut rng()).unwrap_err();
        assert!(matches!(err, Error::InsufficientReplicas { .. }));
        assert_eq!(current, vec![1, 2, 3, 4]);
    }

    #[test]
    fn grow_appends_distinct_unused_brokers() {
        let p = pool(&[1, 2, 3, 4, 5]);
        let current = vec![1, 2];

        for seed in 0..50 {
            let planned =
                plan_replicas(&p, &current, 2, &mut StdRng::seed_from_u64(seed)).unwrap();
            assert_eq!(planned.len(), 4);
            assert_eq!(&planned[..2], &[1, 2]);

            let added: HashSet<BrokerId> = planned[2..].iter().copied().collect();
            assert_eq!(added.len(), 2, "added brokers must be distinct: {planned:?}");
            assert!(added.iter().all(|b| [3, 4, 5].contains(b)));
        }
    }

    #[test]
    fn grow_spreads_across_candidates() {
        let p = pool(&[1, 2, 3, 4, 5]);
        let mut seen = HashSet::new();
        let mut rng = rng();
        for _ in 0..100 {
            let planned = plan_replicas(&p, &[1], 1, &mut rng).unwrap();
            seen.insert(planned[1]);
        }
        assert_eq!(seen, [2, 3, 4, 5].into_iter().collect());
    }

    #[test]
    fn grow_with_fixed_sequence_is_deterministic() {
        let p = pool(&[1, 2, 3, 4, 5]);

        // A zero source always picks index 0; swap_remove then moves the last
        // candidate into that slot.
        let planned = plan_replicas(&p, &[1, 2], 2, &mut StepRng::new(0, 0)).unwrap();
        assert_eq!(planned, vec![1, 2, 3, 5]);

        let a = plan_replicas(&p, &[2], 3, &mut StdRng::seed_from_u64(7)).unwrap();
        let b = plan_replicas(&p, &[2], 3, &mut StdRng::seed_from_u64(7)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn grow_uses_every_remaining_broker() {
        let planned = plan_replicas(&pool(&[1, 2, 3]), &[2], 2, &mut rng()).unwrap();
        assert_eq!(planned[0], 2);
        let mut tail = planned[1..].to_vec();
        tail.sort();
        assert_eq!(tail, vec![1, 3]);
    }

    #[test]
    fn grow_past_pool_fails() {
        let current = vec![1, 2, 3];
        let err = plan_replicas(&pool(&[1, 2, 3]), &current, 1, &mut rng()).unwrap_err();
        assert_eq!(
            err,
            Error::InsufficientBrokers {
                needed: 1,
                available: 0
            }
        );
        assert_eq!(current, vec![1, 2, 3]);
    }

    #[test]
    fn grow_counts_unused_brokers_not_free_slots() {
        // Broker 9 left the cluster but still holds a replica. The replica set
        // is as large as the pool, yet broker 3 is still a valid candidate.
        let planned = plan_replicas(&pool(&[1, 2, 3]), &[1, 2, 9], 1, &mut rng()).unwrap();
        assert_eq!(planned, vec![1, 2, 9, 3]);

        let err = plan_replicas(&pool(&[1, 2, 3]), &[1, 2, 9], 2, &mut rng()).unwrap_err();
        assert_eq!(
            err,
            Error::InsufficientBrokers {
                needed: 2,
                available: 1
            }
        );
    }
}
