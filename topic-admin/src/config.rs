use std::time::Duration;

use envconfig::Envconfig;

#[derive(Envconfig, Clone, Debug)]
pub struct Config {
    // ── Kafka ───────────────────────────────────────────────────────
    #[envconfig(default = "localhost:9092")]
    pub kafka_hosts: String,

    #[envconfig(default = "false")]
    pub kafka_tls: bool,

    #[envconfig(default = "10000")]
    pub metadata_timeout_ms: u64,

    // ── Batching / polling ──────────────────────────────────────────
    #[envconfig(default = "500")]
    pub acl_batch_window_ms: u64,

    #[envconfig(default = "1000")]
    pub reassignment_poll_interval_ms: u64,

    // ── Dry run ─────────────────────────────────────────────────────
    pub topic: Option<String>,

    pub target_replication_factor: Option<i32>,
}

impl Config {
    pub fn metadata_timeout(&self) -> Duration {
        Duration::from_millis(self.metadata_timeout_ms)
    }

    pub fn acl_batch_window(&self) -> Duration {
        Duration::from_millis(self.acl_batch_window_ms)
    }

    pub fn reassignment_poll_interval(&self) -> Duration {
        Duration::from_millis(self.reassignment_poll_interval_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            kafka_hosts: "localhost:9092".to_string(),
            kafka_tls: false,
            metadata_timeout_ms: 10_000,
            acl_batch_window_ms: 500,
            reassignment_poll_interval_ms: 1000,
            topic: None,
            target_replication_factor: None,
        }
    }
}
