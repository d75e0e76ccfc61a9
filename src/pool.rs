//! Fixed-size worker pool with a quiescence barrier.
//!
//! Tasks travel over an unbounded channel so the producer never waits on the
//! workers. Every task carries a clone of the current [`WaitGroup`];
//! [`WorkerPool::wait_for_all`] swaps in a fresh group and waits on the old
//! one, which returns once every task enqueued before the call has run.

use anyhow::{Context, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use crossbeam_utils::sync::WaitGroup;
use parking_lot::Mutex;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error};

type Job = Box<dyn FnOnce() + Send + 'static>;

struct Task {
    job: Job,
    _pending: WaitGroup,
}

#[derive(Default)]
struct Shared {
    stopping: AtomicBool,
    panicked: AtomicU64,
    discarded: AtomicU64,
}

/// Counters reported when the pool shuts down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolReport {
    /// Tasks that panicked while running.
    pub panicked: u64,
    /// Tasks still queued at shutdown and never started.
    pub discarded: u64,
}

pub struct WorkerPool {
    sender: Option<Sender<Task>>,
    workers: Vec<JoinHandle<()>>,
    pending: Mutex<WaitGroup>,
    shared: Arc<Shared>,
}

impl WorkerPool {
    /// Spawns `threads` workers (at least one).
    pub fn new(threads: usize) -> Result<Self> {
        let threads = threads.max(1);
        let (sender, receiver) = unbounded::<Task>();
        let shared = Arc::new(Shared::default());

        let workers = (0..threads)
            .map(|i| {
                let receiver = receiver.clone();
                let shared = Arc::clone(&shared);
                thread::Builder::new()
                    .name(format!("ponder-worker-{i}"))
                    .spawn(move || worker_loop(receiver, shared))
                    .with_context(|| format!("Failed to spawn worker thread {i}"))
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(threads, "Worker pool started");

        Ok(Self {
            sender: Some(sender),
            workers,
            pending: Mutex::new(WaitGroup::new()),
            shared,
        })
    }

    pub fn threads(&self) -> usize {
        self.workers.len()
    }

    /// Queues a task. Only fails if every worker has already exited.
    pub fn enqueue<F>(&self, job: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let sender = self
            .sender
            .as_ref()
            .context("Worker pool is shut down")?;
        let task = Task {
            job: Box::new(job),
            _pending: self.pending.lock().clone(),
        };
        sender
            .send(task)
            .map_err(|_| anyhow::anyhow!("Worker pool has no running workers"))
    }

    /// Blocks until every task enqueued before this call has finished.
    /// The pool stays usable afterwards.
    pub fn wait_for_all(&self) {
        let current = std::mem::replace(&mut *self.pending.lock(), WaitGroup::new());
        current.wait();
    }

    /// Number of tasks that panicked so far.
    pub fn panicked(&self) -> u64 {
        self.shared.panicked.load(Ordering::Relaxed)
    }

    /// Stops the workers: in-flight tasks finish, queued ones are dropped.
    pub fn shutdown(mut self) -> PoolReport {
        self.stop();
        PoolReport {
            panicked: self.shared.panicked.load(Ordering::Relaxed),
            discarded: self.shared.discarded.load(Ordering::Relaxed),
        }
    }

    fn stop(&mut self) {
        let Some(sender) = self.sender.take() else {
            return;
        };
        self.shared.stopping.store(true, Ordering::Release);
        // Dropping the last sender disconnects the channel and wakes idle workers.
        drop(sender);
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                error!("Worker thread terminated abnormally");
            }
        }
        let discarded = self.shared.discarded.load(Ordering::Relaxed);
        if discarded > 0 {
            debug!(discarded, "Dropped queued tasks at shutdown");
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker_loop(receiver: Receiver<Task>, shared: Arc<Shared>) {
    while let Ok(Task { job, _pending }) = receiver.recv() {
        if shared.stopping.load(Ordering::Acquire) {
            shared.discarded.fetch_add(1, Ordering::Relaxed);
            continue;
        }
        if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
            shared.panicked.fetch_add(1, Ordering::Relaxed);
            error!(
                worker = thread::current().name().unwrap_or("worker"),
                "Task panicked"
            );
        }
    }
}
