use thiserror::Error;

/// Outcome delivered to a waiter when its batch did not succeed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BatchError<E> {
    /// The single flush call for the batch failed. Every waiter in the batch
    /// receives the same value.
    #[error("batch flush failed: {0}")]
    Flush(E),

    /// The result channel was dropped before a result was written, e.g. the
    /// flush task panicked or the runtime shut down.
    #[error("batch queue closed before the result was delivered")]
    Closed,
}

impl<E> BatchError<E> {
    pub fn flush_error(&self) -> Option<&E> {
        match self {
            BatchError::Flush(e) => Some(e),
            BatchError::Closed => None,
        }
    }
}
