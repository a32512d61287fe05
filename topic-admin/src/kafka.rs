use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rdkafka::admin::AdminClient as KafkaAdminClient;
use rdkafka::client::DefaultClientContext;
use rdkafka::config::ClientConfig;
use rdkafka::error::KafkaResult;
use rdkafka::metadata::Metadata;
use rdkafka::util::Timeout;

use crate::config::Config;
use crate::error::TransportError;
use crate::metadata::ClusterMetadata;
use crate::transport::{MetadataSource, TransportResult};
use crate::types::{PartitionId, ReplicaSet};

/// [`MetadataSource`] backed by an rdkafka admin client.
pub struct KafkaMetadataSource {
    client: Arc<KafkaAdminClient<DefaultClientContext>>,
    timeout: Duration,
}

impl KafkaMetadataSource {
    pub fn new(config: &Config) -> KafkaResult<Self> {
        let client = client_config(config).create()?;
        Ok(Self {
            client: Arc::new(client),
            timeout: config.metadata_timeout(),
        })
    }
}

pub fn client_config(config: &Config) -> ClientConfig {
    let mut client_config = ClientConfig::new();
    client_config.set("bootstrap.servers", &config.kafka_hosts);

    if config.kafka_tls {
        client_config
            .set("security.protocol", "ssl")
            .set("enable.ssl.certificate.verification", "false");
    };
    client_config
}

#[async_trait]
impl MetadataSource for KafkaMetadataSource {
    async fn fetch_metadata(&self) -> TransportResult<ClusterMetadata> {
        let client = Arc::clone(&self.client);
        let timeout = self.timeout;

        // librdkafka's metadata call blocks the calling thread.
        let metadata = tokio::task::spawn_blocking(move || {
            client
                .inner()
                .fetch_metadata(None, Timeout::After(timeout))
                .map(|metadata| snapshot_from(&metadata))
        })
        .await
        .map_err(|e| TransportError::Interrupted {
            operation: "fetch_metadata",
            message: e.to_string(),
        })??;

        Ok(metadata)
    }
}

fn snapshot_from(metadata: &Metadata) -> ClusterMetadata {
    let brokers = metadata.brokers().iter().map(|b| b.id());

    let mut rows: Vec<(String, PartitionId, ReplicaSet)> = Vec::new();
    for topic in metadata.topics() {
        if let Some(err) = topic.error() {
            tracing::warn!(
                topic = topic.name(),
                error = ?err,
                "skipping topic with metadata error"
            );
            continue;
        }
        for partition in topic.partitions() {
            rows.push((
                topic.name().to_string(),
                partition.id(),
                partition.replicas().to_vec(),
            ));
        }
    }

    ClusterMetadata::from_parts(brokers, rows)
}
