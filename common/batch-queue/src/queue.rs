use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::error::BatchError;
use crate::{
    BATCH_QUEUE_BATCH_SIZE_HISTOGRAM, BATCH_QUEUE_FLUSHES_COUNTER,
    BATCH_QUEUE_SUPERSEDED_TIMERS_COUNTER,
};

pub const DEFAULT_WINDOW: Duration = Duration::from_millis(500);

/// The remote call that applies one accumulated batch.
///
/// Implementations receive every buffered mutation in arrival order and return
/// a single outcome for the whole batch. The queue never retries a failed
/// flush.
#[async_trait]
pub trait BatchFlusher<M>: Send + Sync + 'static {
    type Output: Clone + Send + 'static;
    type Error: Clone + Send + 'static;

    async fn flush(&self, batch: Vec<M>) -> Result<Self::Output, Self::Error>;
}

#[derive(Debug, Clone)]
pub struct BatchQueueConfig {
    /// Used in log fields and metric labels.
    pub name: String,
    /// Quiescence window. A batch flushes once this much time passes with no
    /// new submissions.
    pub window: Duration,
}

impl Default for BatchQueueConfig {
    fn default() -> Self {
        Self {
            name: "batch".to_string(),
            window: DEFAULT_WINDOW,
        }
    }
}

/// Observable state of the queue.
///
/// Flushes run detached from the buffer, so a queue reports `Accumulating`
/// while it buffers a new batch even if earlier batches are still in flight.
/// `Flushing` means the buffer is empty and at least one flush call has not
/// returned yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    Idle,
    Accumulating { generation: u64, pending: usize },
    Flushing { in_flight: usize },
}

type Waiter<O, E> = oneshot::Sender<Result<O, BatchError<E>>>;

/// The buffer and its timer. Only ever touched under `Shared::batch`.
struct Batch<M, O, E> {
    /// Bumped every time the timer is (re)armed and every time a batch is
    /// detached. A timer only flushes if the generation it was armed with is
    /// still current.
    generation: u64,
    mutations: Vec<M>,
    waiters: Vec<Waiter<O, E>>,
    timer: Option<JoinHandle<()>>,
}

struct Detached<M, O, E> {
    generation: u64,
    mutations: Vec<M>,
    waiters: Vec<Waiter<O, E>>,
}

impl<M, O, E> Batch<M, O, E> {
    fn new() -> Self {
        Self {
            generation: 0,
            mutations: Vec::new(),
            waiters: Vec::new(),
            timer: None,
        }
    }

    fn push(&mut self, mutation: M, waiter: Waiter<O, E>) -> u64 {
        self.mutations.push(mutation);
        self.waiters.push(waiter);
        self.generation += 1;
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.generation
    }

    /// Swap the buffer out for an empty one if `generation` is still the one
    /// the current timer was armed with.
    fn take_if_current(&mut self, generation: u64) -> Option<Detached<M, O, E>> {
        if generation != self.generation || self.mutations.is_empty() {
            return None;
        }
        Some(self.detach())
    }

    fn detach(&mut self) -> Detached<M, O, E> {
        let detached = Detached {
            generation: self.generation,
            mutations: mem::take(&mut self.mutations),
            waiters: mem::take(&mut self.waiters),
        };
        self.generation += 1;
        // Dropping the handle detaches the task; the caller may be that task.
        self.timer = None;
        detached
    }

    fn state(&self) -> QueueState {
        if self.mutations.is_empty() {
            QueueState::Idle
        } else {
            QueueState::Accumulating {
                generation: self.generation,
                pending: self.mutations.len(),
            }
        }
    }
}

struct Shared<M, O, E> {
    batch: Mutex<Batch<M, O, E>>,
    in_flight: AtomicUsize,
}

/// Coalesces concurrent submissions into one flush per quiescence window.
///
/// Submitting arms (or re-arms) a timer for `config.window`. When the timer
/// fires the buffer is detached under the lock, the lock is released, and the
/// flusher runs. Submissions arriving during that flush start a new batch.
pub struct DebouncedBatchQueue<M, F>
where
    F: BatchFlusher<M>,
{
    config: Arc<BatchQueueConfig>,
    flusher: Arc<F>,
    shared: Arc<Shared<M, F::Output, F::Error>>,
}

impl<M, F> Clone for DebouncedBatchQueue<M, F>
where
    F: BatchFlusher<M>,
{
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            flusher: Arc::clone(&self.flusher),
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<M, F> DebouncedBatchQueue<M, F>
where
    M: Send + 'static,
    F: BatchFlusher<M>,
{
    pub fn new(config: BatchQueueConfig, flusher: F) -> Self {
        Self::with_flusher(config, Arc::new(flusher))
    }

    pub fn with_flusher(config: BatchQueueConfig, flusher: Arc<F>) -> Self {
        Self {
            config: Arc::new(config),
            flusher,
            shared: Arc::new(Shared {
                batch: Mutex::new(Batch::new()),
                in_flight: AtomicUsize::new(0),
            }),
        }
    }

    /// Submit a mutation and wait for the outcome of the batch it lands in.
    pub async fn submit(&self, mutation: M) -> Result<F::Output, BatchError<F::Error>> {
        self.enqueue(mutation).await
    }

    /// Add a mutation to the current batch and reset the quiescence timer.
    ///
    /// The mutation is accepted before this returns; the returned future only
    /// waits for the result. Must be called from within a tokio runtime.
    pub fn enqueue(&self, mutation: M) -> PendingResult<F::Output, F::Error> {
        let (tx, rx) = oneshot::channel();

        let mut batch = self.shared.batch.lock();
        let generation = batch.push(mutation, tx);
        tracing::debug!(
            queue = %self.config.name,
            generation,
            pending = batch.mutations.len(),
            "armed batch timer"
        );
        batch.timer = Some(self.spawn_timer(generation));
        drop(batch);

        PendingResult { receiver: rx }
    }

    /// Detach the current batch immediately and flush it, without waiting for
    /// the quiescence window. Returns the number of mutations flushed.
    pub async fn flush_now(&self) -> usize {
        let detached = {
            let mut batch = self.shared.batch.lock();
            if batch.mutations.is_empty() {
                return 0;
            }
            if let Some(timer) = batch.timer.take() {
                timer.abort();
            }
            batch.detach()
        };
        let size = detached.mutations.len();
        run_flush(&self.config, self.flusher.as_ref(), &self.shared, detached).await;
        size
    }

    pub fn state(&self) -> QueueState {
        match self.shared.batch.lock().state() {
            QueueState::Idle => match self.in_flight() {
                0 => QueueState::Idle,
                in_flight => QueueState::Flushing { in_flight },
            },
            accumulating => accumulating,
        }
    }

    /// Number of flush calls currently awaiting the remote side.
    pub fn in_flight(&self) -> usize {
        self.shared.in_flight.load(Ordering::SeqCst)
    }

    fn spawn_timer(&self, generation: u64) -> JoinHandle<()> {
        let config = Arc::clone(&self.config);
        let flusher = Arc::clone(&self.flusher);
        let shared = Arc::clone(&self.shared);

        tokio::spawn(async move {
            tokio::time::sleep(config.window).await;

            let detached = shared.batch.lock().take_if_current(generation);
            match detached {
                Some(detached) => {
                    run_flush(&config, flusher.as_ref(), &shared, detached).await;
                }
                None => {
                    tracing::debug!(
                        queue = %config.name,
                        generation,
                        "ignoring superseded batch timer"
                    );
                    metrics::counter!(BATCH_QUEUE_SUPERSEDED_TIMERS_COUNTER, "queue" => config.name.clone())
                        .increment(1);
                }
            }
        })
    }
}

async fn run_flush<M, F>(
    config: &BatchQueueConfig,
    flusher: &F,
    shared: &Shared<M, F::Output, F::Error>,
    detached: Detached<M, F::Output, F::Error>,
) where
    F: BatchFlusher<M>,
{
    let Detached {
        generation,
        mutations,
        waiters,
    } = detached;
    let batch_size = mutations.len();

    tracing::info!(queue = %config.name, generation, batch_size, "flushing batch");
    metrics::histogram!(BATCH_QUEUE_BATCH_SIZE_HISTOGRAM, "queue" => config.name.clone())
        .record(batch_size as f64);

    let outcome = {
        let _in_flight = InFlight::enter(&shared.in_flight);
        flusher.flush(mutations).await.map_err(BatchError::Flush)
    };

    let label = if outcome.is_ok() { "success" } else { "failure" };
    metrics::counter!(BATCH_QUEUE_FLUSHES_COUNTER, "queue" => config.name.clone(), "outcome" => label)
        .increment(1);
    if outcome.is_err() {
        tracing::warn!(queue = %config.name, generation, batch_size, "batch flush failed");
    }

    for waiter in waiters {
        // A waiter that stopped listening doesn't affect the others.
        drop(waiter.send(outcome.clone()));
    }
}

/// Counts one running flush call; released on drop so a panicking flusher or
/// a cancelled `flush_now` still decrements.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Resolves to the outcome of the batch a mutation was flushed with.
pub struct PendingResult<O, E> {
    receiver: oneshot::Receiver<Result<O, BatchError<E>>>,
}

impl<O, E> Future for PendingResult<O, E> {
    type Output = Result<O, BatchError<E>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(BatchError::Closed)),
            Poll::Pending => Poll::Pending,
        }
    }
}
