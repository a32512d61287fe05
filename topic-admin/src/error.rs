use batch_queue::BatchError;
use rdkafka::error::KafkaError;
use thiserror::Error;

use crate::types::PartitionId;

/// Failure reported by the cluster-admin transport.
///
/// `Clone` so that one failed batch flush can be handed to every waiter of
/// that batch unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error(transparent)]
    Kafka(#[from] KafkaError),

    #[error("{operation} rejected by cluster: {message}")]
    Rejected {
        operation: &'static str,
        message: String,
    },

    #[error("{operation} did not complete: {message}")]
    Interrupted {
        operation: &'static str,
        message: String,
    },
}

impl TransportError {
    pub fn rejected(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Rejected {
            operation,
            message: message.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("cannot remove {remove} of {current} replicas: at least one replica must remain")]
    InsufficientReplicas { current: usize, remove: usize },

    #[error("not enough brokers: need {needed} unused brokers, {available} available")]
    InsufficientBrokers { needed: usize, available: usize },

    #[error("topic not found: {0}")]
    TopicNotFound(String),

    #[error("partition {partition} not found in topic {topic}")]
    PartitionNotFound { topic: String, partition: PartitionId },

    #[error("invalid replication factor {0}: must be at least 1")]
    InvalidReplicationFactor(i32),

    #[error("planned replica set for partition {partition} has {actual} replicas, expected {expected}")]
    InconsistentPlan {
        partition: PartitionId,
        expected: usize,
        actual: usize,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("batch flush failed: {0}")]
    BatchFlushFailure(TransportError),

    #[error("batch queue closed before delivering a result")]
    QueueClosed,

    #[error("reassignment of {0} still in progress after timeout")]
    ReassignmentTimeout(String),
}

impl From<BatchError<TransportError>> for Error {
    fn from(e: BatchError<TransportError>) -> Self {
        match e {
            BatchError::Flush(e) => Self::BatchFlushFailure(e),
            BatchError::Closed => Self::QueueClosed,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
