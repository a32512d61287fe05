/// Counter for reassignment plans built, labelled `outcome` (success/failure)
pub const REASSIGNMENTS_PLANNED_COUNTER: &str = "topic_admin_reassignments_planned_total";

/// Counter for reassignments handed to the cluster, labelled `outcome`
pub const REASSIGNMENTS_SUBMITTED_COUNTER: &str = "topic_admin_reassignments_submitted_total";

/// Counter for metadata snapshot refreshes, labelled `outcome`
pub const METADATA_REFRESHES_COUNTER: &str = "topic_admin_metadata_refreshes_total";

/// Counter for ACL listings, labelled `source` (cache/cluster)
pub const ACL_LISTINGS_COUNTER: &str = "topic_admin_acl_listings_total";
