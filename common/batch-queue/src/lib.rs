//! Debounced request batching.
//!
//! Callers submit single mutations against a shared remote resource. The queue
//! buffers them until no new mutation has arrived for a quiescence window, then
//! hands the whole buffer to one [`BatchFlusher::flush`] call and delivers that
//! call's outcome to every caller whose mutation was in the batch.
//!
//! ```text
//! submit(a) ──┐
//! submit(b) ──┼──> [ buffer | timer reset on each arrival ] ──(window of silence)──> flush([a, b, c])
//! submit(c) ──┘                                                                        │
//!    ▲                                                                                 │
//!    └──────────────────── same Result cloned to every waiter ◄────────────────────────┘
//! ```

mod error;
mod queue;

pub use error::BatchError;
pub use queue::{
    BatchFlusher, BatchQueueConfig, DebouncedBatchQueue, PendingResult, QueueState,
    DEFAULT_WINDOW,
};

pub const BATCH_QUEUE_FLUSHES_COUNTER: &str = "batch_queue_flushes_total";
pub const BATCH_QUEUE_BATCH_SIZE_HISTOGRAM: &str = "batch_queue_batch_size";
pub const BATCH_QUEUE_SUPERSEDED_TIMERS_COUNTER: &str = "batch_queue_superseded_timers_total";
