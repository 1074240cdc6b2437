//! Data-parallel task dispatch for batch jobs
//!
//! Partitions a worklist round-robin across a fixed number of workers, runs
//! each chunk through a caller-supplied function on the blocking thread pool,
//! and collects one result envelope per worker. There is no load balancing
//! and no work stealing: the partitioning is static and predictable, which is
//! what batch maintenance jobs over depositions want.
//!
//! Every worker always produces a [`ChunkResult`] — a panic inside the
//! worker function or an exceeded timeout surfaces as a tagged failure for
//! that chunk instead of blocking the collector, so `run_multi` always
//! terminates.
//!
//! Results arrive in completion order. A caller that needs a stable order
//! must tag each item with its original index inside the worker function.

use crate::error::DispatchError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Per-chunk result envelope
#[must_use]
#[derive(Debug)]
pub struct ChunkResult<R> {
    /// Index of the worker that processed (or failed to process) the chunk
    pub worker: usize,
    /// Number of items in the chunk
    pub items: usize,
    /// The worker function's return value, or a tagged failure
    pub outcome: Result<R, DispatchError>,
}

impl<R> ChunkResult<R> {
    /// True when the worker completed its chunk
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Static round-robin task dispatcher
///
/// # Examples
///
/// ```
/// use depvault::TaskDispatcher;
///
/// # #[tokio::main]
/// # async fn main() {
/// let dispatcher = TaskDispatcher::new(3);
/// let items = vec![1u32, 2, 3, 4, 5, 6];
/// let results = dispatcher.run_multi(items, |chunk| chunk.iter().sum::<u32>()).await;
///
/// let total: u32 = results.iter().filter_map(|r| r.outcome.as_ref().ok()).sum();
/// assert_eq!(total, 21);
/// # }
/// ```
pub struct TaskDispatcher {
    worker_count: usize,
    timeout: Option<Duration>,
}

impl TaskDispatcher {
    /// Create a dispatcher with a fixed worker count (minimum 1)
    pub fn new(worker_count: usize) -> Self {
        Self {
            worker_count: worker_count.max(1),
            timeout: None,
        }
    }

    /// Set a per-worker wall-clock timeout
    ///
    /// A worker that exceeds the timeout is reported as
    /// [`DispatchError::TimedOut`]. The underlying blocking thread is not
    /// interrupted; it runs to completion in the background and its result is
    /// discarded.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Number of workers this dispatcher spawns per batch
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Partition items round-robin into exactly `worker_count` chunks
    ///
    /// `chunk[i]` receives items at positions `i, i + n, i + 2n, ...`, so the
    /// relative order within each chunk follows the input order. Some chunks
    /// may be empty when there are fewer items than workers.
    pub fn partition<T>(items: Vec<T>, worker_count: usize) -> Vec<Vec<T>> {
        let n = worker_count.max(1);
        let mut chunks: Vec<Vec<T>> = (0..n).map(|_| Vec::new()).collect();
        for (i, item) in items.into_iter().enumerate() {
            chunks[i % n].push(item);
        }
        chunks
    }

    /// Run one batch: partition, dispatch, collect
    ///
    /// Spawns exactly `worker_count` workers on the blocking thread pool
    /// (each receives its whole chunk, empty or not) and blocks until every
    /// worker has reported. Workers share nothing: each one owns its chunk
    /// and its own reference to the worker function, so any caching inside
    /// the function's captures is shared only through whatever synchronization
    /// the caller built in.
    ///
    /// Returns one [`ChunkResult`] per worker, in completion order.
    pub async fn run_multi<T, R, F>(&self, items: Vec<T>, worker_fn: F) -> Vec<ChunkResult<R>>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(Vec<T>) -> R + Send + Sync + 'static,
    {
        let total_items = items.len();
        let chunks = Self::partition(items, self.worker_count);
        let worker_fn = Arc::new(worker_fn);
        let (result_tx, mut result_rx) = mpsc::channel::<ChunkResult<R>>(self.worker_count);

        info!(
            workers = self.worker_count,
            items = total_items,
            timeout = ?self.timeout,
            "dispatching batch"
        );

        for (worker, chunk) in chunks.into_iter().enumerate() {
            let worker_fn = Arc::clone(&worker_fn);
            let result_tx = result_tx.clone();
            let timeout = self.timeout;
            let items = chunk.len();

            tokio::spawn(async move {
                let handle = tokio::task::spawn_blocking(move || (*worker_fn)(chunk));
                let joined = match timeout {
                    Some(limit) => match tokio::time::timeout(limit, handle).await {
                        Ok(joined) => joined,
                        Err(_) => {
                            warn!(worker, ?limit, "worker timed out");
                            let _ = result_tx
                                .send(ChunkResult {
                                    worker,
                                    items,
                                    outcome: Err(DispatchError::TimedOut {
                                        worker,
                                        timeout: limit,
                                    }),
                                })
                                .await;
                            return;
                        }
                    },
                    None => handle.await,
                };

                let outcome = match joined {
                    Ok(result) => {
                        debug!(worker, items, "worker completed chunk");
                        Ok(result)
                    }
                    Err(e) if e.is_panic() => {
                        warn!(worker, "worker panicked");
                        Err(DispatchError::WorkerPanicked { worker })
                    }
                    Err(_) => Err(DispatchError::ResultChannelClosed),
                };
                let _ = result_tx
                    .send(ChunkResult {
                        worker,
                        items,
                        outcome,
                    })
                    .await;
            });
        }
        drop(result_tx);

        let mut results = Vec::with_capacity(self.worker_count);
        while results.len() < self.worker_count {
            match result_rx.recv().await {
                Some(result) => results.push(result),
                None => {
                    // Every spawned task sends exactly once, so this is
                    // unreachable in practice
                    error!(
                        received = results.len(),
                        expected = self.worker_count,
                        "result channel closed early"
                    );
                    break;
                }
            }
        }

        let failed = results.iter().filter(|r| !r.is_ok()).count();
        info!(
            workers = self.worker_count,
            failed, "batch complete"
        );
        results
    }
}
