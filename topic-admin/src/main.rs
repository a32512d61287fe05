use std::sync::Arc;

use anyhow::{Context, Result};
use envconfig::Envconfig;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use topic_admin::assignment::build_assignment;
use topic_admin::config::Config;
use topic_admin::kafka::KafkaMetadataSource;
use topic_admin::metadata::MetadataCache;

/// Dry run: plan a replication factor change for one topic and print it.
/// Nothing is submitted to the cluster.
#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::init_from_env()
        .context("Failed to load configuration from environment variables")?;

    let log_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_default_env())
        .boxed();

    tracing_subscriber::registry().with(log_layer).init();

    let topic = config.topic.clone().context("TOPIC must be set")?;
    let target = config
        .target_replication_factor
        .context("TARGET_REPLICATION_FACTOR must be set")?;

    info!(kafka_hosts = %config.kafka_hosts, topic = %topic, target, "planning reassignment");

    let source =
        KafkaMetadataSource::new(&config).context("Failed to create Kafka admin client")?;
    let cache = MetadataCache::new(Arc::new(source));
    let metadata = cache
        .refresh()
        .await
        .context("Failed to fetch cluster metadata")?;

    let placement = build_assignment(&metadata, &topic, target, &mut StdRng::from_entropy())
        .with_context(|| format!("Failed to plan replication factor {target} for {topic}"))?;

    let json = serde_json::to_string_pretty(&placement).context("Failed to encode plan")?;
    println!("{json}");

    Ok(())
}
