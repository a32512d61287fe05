use std::sync::Arc;

use async_trait::async_trait;
use batch_queue::{BatchFlusher, BatchQueueConfig, DebouncedBatchQueue};
use parking_lot::RwLock;

use crate::error::{Result, TransportError};
use crate::metrics_consts::ACL_LISTINGS_COUNTER;
use crate::transport::ClusterAdmin;
use crate::types::{AclCreation, AclFilter};

pub const ACL_CREATION_QUEUE: &str = "acl_creations";
pub const ACL_DELETION_QUEUE: &str = "acl_deletions";

pub type AclCreationQueue = DebouncedBatchQueue<AclCreation, AclCreationFlusher>;
pub type AclDeletionQueue = DebouncedBatchQueue<AclFilter, AclDeletionFlusher>;

/// Cached result of the last ACL listing.
///
/// Every flushed mutation batch invalidates it, whatever the outcome. A
/// listing that started before an invalidation is not stored.
#[derive(Default)]
pub struct AclCache {
    inner: RwLock<CacheSlot>,
}

#[derive(Default)]
struct CacheSlot {
    epoch: u64,
    acls: Option<Arc<Vec<AclCreation>>>,
}

impl AclCache {
    pub fn get(&self) -> Option<Arc<Vec<AclCreation>>> {
        self.inner.read().acls.clone()
    }

    /// Epoch to pass to [`AclCache::store`] once the listing completes.
    pub fn epoch(&self) -> u64 {
        self.inner.read().epoch
    }

    /// Store a listing read at `epoch`. Returns false and drops the listing if
    /// the cache was invalidated in the meantime.
    pub fn store(&self, epoch: u64, acls: Vec<AclCreation>) -> bool {
        let mut slot = self.inner.write();
        if slot.epoch != epoch {
            return false;
        }
        slot.acls = Some(Arc::new(acls));
        true
    }

    pub fn invalidate(&self) {
        let mut slot = self.inner.write();
        slot.epoch += 1;
        slot.acls = None;
    }

    pub fn is_valid(&self) -> bool {
        self.inner.read().acls.is_some()
    }
}

/// Read ACLs through the cache, going to the cluster only when it is empty.
pub async fn list_acls(
    admin: &dyn ClusterAdmin,
    cache: &AclCache,
) -> Result<Arc<Vec<AclCreation>>> {
    if let Some(acls) = cache.get() {
        metrics::counter!(ACL_LISTINGS_COUNTER, "source" => "cache").increment(1);
        return Ok(acls);
    }

    let epoch = cache.epoch();
    let acls = admin.list_acls().await?;
    metrics::counter!(ACL_LISTINGS_COUNTER, "source" => "cluster").increment(1);

    if !cache.store(epoch, acls.clone()) {
        tracing::debug!("ACL cache invalidated during listing, not storing");
    }
    Ok(Arc::new(acls))
}

pub struct AclCreationFlusher {
    admin: Arc<dyn ClusterAdmin>,
    cache: Arc<AclCache>,
}

impl AclCreationFlusher {
    pub fn new(admin: Arc<dyn ClusterAdmin>, cache: Arc<AclCache>) -> Self {
        Self { admin, cache }
    }
}

#[async_trait]
impl BatchFlusher<AclCreation> for AclCreationFlusher {
    type Output = ();
    type Error = TransportError;

    async fn flush(&self, batch: Vec<AclCreation>) -> std::result::Result<(), TransportError> {
        let count = batch.len();
        let result = self.admin.create_acls(batch).await;
        self.cache.invalidate();

        match &result {
            Ok(()) => tracing::info!(count, "created ACLs"),
            Err(e) => tracing::error!(count, error = %e, "failed to create ACLs"),
        }
        result
    }
}

pub struct AclDeletionFlusher {
    admin: Arc<dyn ClusterAdmin>,
    cache: Arc<AclCache>,
}

impl AclDeletionFlusher {
    pub fn new(admin: Arc<dyn ClusterAdmin>, cache: Arc<AclCache>) -> Self {
        Self { admin, cache }
    }
}

#[async_trait]
impl BatchFlusher<AclFilter> for AclDeletionFlusher {
    type Output = usize;
    type Error = TransportError;

    async fn flush(&self, batch: Vec<AclFilter>) -> std::result::Result<usize, TransportError> {
        let count = batch.len();
        let result = self.admin.delete_acls(batch).await;
        self.cache.invalidate();

        match &result {
            Ok(deleted) => tracing::info!(filters = count, deleted, "deleted ACLs"),
            Err(e) => tracing::error!(filters = count, error = %e, "failed to delete ACLs"),
        }
        result
    }
}

/// Build both ACL queues over one admin handle and cache.
///
/// The two queues flush independently; nothing orders a creation batch
/// against a deletion batch that touches the same bindings.
pub fn acl_queues(
    admin: Arc<dyn ClusterAdmin>,
    cache: Arc<AclCache>,
    window: std::time::Duration,
) -> (AclCreationQueue, AclDeletionQueue) {
    let creations = DebouncedBatchQueue::new(
        BatchQueueConfig {
            name: ACL_CREATION_QUEUE.to_string(),
            window,
        },
        AclCreationFlusher::new(Arc::clone(&admin), Arc::clone(&cache)),
    );
    let deletions = DebouncedBatchQueue::new(
        BatchQueueConfig {
            name: ACL_DELETION_QUEUE.to_string(),
            window,
        },
        AclDeletionFlusher::new(admin, cache),
    );
    (creations, deletions)
}
