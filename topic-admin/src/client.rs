use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::acl::{self, AclCache, AclCreationQueue, AclDeletionQueue};
use crate::assignment::build_assignment;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::metadata::{ClusterMetadata, MetadataCache};
use crate::metrics_consts::REASSIGNMENTS_SUBMITTED_COUNTER;
use crate::status;
use crate::transport::{ClusterAdmin, MetadataSource};
use crate::types::{AclCreation, AclFilter, TopicPlacement};

/// Entry point for replication and ACL administration.
///
/// Holds the metadata snapshot cache, the two ACL mutation queues and the
/// randomness used to place new replicas. Every operation that reads
/// topic placement refreshes the snapshot first.
pub struct AdminClient {
    metadata: MetadataCache,
    admin: Arc<dyn ClusterAdmin>,
    acl_cache: Arc<AclCache>,
    acl_creations: AclCreationQueue,
    acl_deletions: AclDeletionQueue,
    rng: Mutex<StdRng>,
    poll_interval: Duration,
}

impl AdminClient {
    pub fn new(
        config: &Config,
        source: Arc<dyn MetadataSource>,
        admin: Arc<dyn ClusterAdmin>,
    ) -> Self {
        Self::with_rng(config, source, admin, StdRng::from_entropy())
    }

    /// Like [`AdminClient::new`] with a caller-chosen placement source.
    pub fn with_rng(
        config: &Config,
        source: Arc<dyn MetadataSource>,
        admin: Arc<dyn ClusterAdmin>,
        rng: StdRng,
    ) -> Self {
        let acl_cache = Arc::new(AclCache::default());
        let (acl_creations, acl_deletions) = acl::acl_queues(
            Arc::clone(&admin),
            Arc::clone(&acl_cache),
            config.acl_batch_window(),
        );

        Self {
            metadata: MetadataCache::new(source),
            admin,
            acl_cache,
            acl_creations,
            acl_deletions,
            rng: Mutex::new(rng),
            poll_interval: config.reassignment_poll_interval(),
        }
    }

    pub async fn refresh_metadata(&self) -> Result<Arc<ClusterMetadata>> {
        self.metadata.refresh().await
    }

    /// Refresh metadata and plan every partition of `topic` to the new
    /// factor. Nothing is submitted.
    pub async fn plan_reassignment(
        &self,
        topic: &str,
        target_replication_factor: i32,
    ) -> Result<TopicPlacement> {
        let snapshot = self.metadata.refresh().await?;
        let mut rng = self.rng.lock();
        build_assignment(&snapshot, topic, target_replication_factor, &mut *rng)
    }

    /// Refresh metadata, plan every partition of `topic` to the new factor and
    /// submit the result as a single reassignment.
    ///
    /// Returns the submitted placement. On a planning failure nothing is
    /// submitted.
    pub async fn alter_replication_factor(
        &self,
        topic: &str,
        target_replication_factor: i32,
    ) -> Result<TopicPlacement> {
        let placement = self
            .plan_reassignment(topic, target_replication_factor)
            .await?;

        if let Err(e) = self.admin.submit_reassignment(&placement).await {
            tracing::error!(topic, error = %e, "failed to submit reassignment");
            metrics::counter!(REASSIGNMENTS_SUBMITTED_COUNTER, "outcome" => "failure")
                .increment(1);
            return Err(e.into());
        }

        tracing::info!(
            topic,
            partitions = placement.partitions.len(),
            replication_factor = target_replication_factor,
            "submitted reassignment"
        );
        metrics::counter!(REASSIGNMENTS_SUBMITTED_COUNTER, "outcome" => "success").increment(1);

        Ok(placement)
    }

    /// True while any partition of `topic` is still moving replicas.
    pub async fn is_reassignment_in_progress(&self, topic: &str) -> Result<bool> {
        let snapshot = self.metadata.refresh().await?;
        let partitions = snapshot.partitions(topic)?;
        status::is_reassignment_in_progress(self.admin.as_ref(), topic, &partitions).await
    }

    /// Poll until the reassignment of `topic` finishes, or fail with
    /// [`Error::ReassignmentTimeout`] once `timeout` elapses.
    pub async fn wait_for_reassignment(&self, topic: &str, timeout: Duration) -> Result<()> {
        let poll = async {
            loop {
                if !self.is_reassignment_in_progress(topic).await? {
                    return Ok::<_, Error>(());
                }
                tokio::time::sleep(self.poll_interval).await;
            }
        };

        match tokio::time::timeout(timeout, poll).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(topic, ?timeout, "reassignment did not finish in time");
                Err(Error::ReassignmentTimeout(topic.to_string()))
            }
        }
    }

    /// Queue an ACL binding for creation and wait for its batch to flush.
    pub async fn enqueue_acl_creation(&self, acl: AclCreation) -> Result<()> {
        Ok(self.acl_creations.submit(acl).await?)
    }

    /// Queue an ACL deletion filter and wait for its batch to flush.
    ///
    /// Returns how many bindings the whole batch removed.
    pub async fn enqueue_acl_deletion(&self, filter: AclFilter) -> Result<usize> {
        Ok(self.acl_deletions.submit(filter).await?)
    }

    pub async fn list_acls(&self) -> Result<Arc<Vec<AclCreation>>> {
        acl::list_acls(self.admin.as_ref(), &self.acl_cache).await
    }

    /// Flush both ACL queues without waiting for their windows. Returns the
    /// number of mutations sent.
    pub async fn flush_acl_queues(&self) -> usize {
        let created = self.acl_creations.flush_now().await;
        let deleted = self.acl_deletions.flush_now().await;
        created + deleted
    }
}
