//! Off-thread work with completion callbacks delivered on the owning thread.
//!
//! Work closures run on background threads and return plain values. The
//! value is paired with its completion callback and parked in a shared FIFO;
//! the owning thread calls [`TaskQueue::drain`] once per tick to run every
//! parked callback against its own state. Workers never see that state.
//!
//! Delivery order is completion order, not submission order.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};

/// How background work is executed
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerConfig {
    /// One short-lived thread per submitted task
    #[default]
    PerTask,
    /// Fixed-size rayon pool shared by every task
    Pooled { threads: usize },
}

/// Result value bundled with its completion callback
type Delivery<C> = Box<dyn FnOnce(&mut C) + Send>;

struct Shared<C> {
    ready: Mutex<VecDeque<Delivery<C>>>,
    /// Submitted but not yet delivered
    pending: AtomicUsize,
}

impl<C> Shared<C> {
    fn ready(&self) -> MutexGuard<'_, VecDeque<Delivery<C>>> {
        self.ready.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Clone)]
enum Executor {
    PerTask,
    Pool(Arc<rayon::ThreadPool>),
}

/// Cloneable submit-only handle to a [`TaskQueue`].
///
/// Handed to chunk code so that completion callbacks can chain further work.
pub struct TaskSpawner<C> {
    shared: Arc<Shared<C>>,
    executor: Executor,
}

impl<C> Clone for TaskSpawner<C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            executor: self.executor.clone(),
        }
    }
}

impl<C: 'static> TaskSpawner<C> {
    /// Run `work` off-thread, then `on_complete(ctx, result)` on the next drain.
    ///
    /// Never blocks. Every submitted task runs to completion and its
    /// callback always fires; there is no cancellation.
    pub fn submit<R, W, F>(&self, work: W, on_complete: F)
    where
        R: Send + 'static,
        W: FnOnce() -> R + Send + 'static,
        F: FnOnce(&mut C, R) + Send + 'static,
    {
        self.shared.pending.fetch_add(1, Ordering::SeqCst);

        let shared = Arc::clone(&self.shared);
        let job = move || {
            let result = work();
            let delivery: Delivery<C> = Box::new(move |ctx: &mut C| on_complete(ctx, result));
            shared.ready().push_back(delivery);
        };

        match &self.executor {
            Executor::PerTask => spawn_task_thread(job),
            Executor::Pool(pool) => pool.spawn(job),
        }
        log::trace!("Task submitted ({} pending)", self.pending_count());
    }

    /// Tasks submitted but not yet delivered
    pub fn pending_count(&self) -> usize {
        self.shared.pending.load(Ordering::SeqCst)
    }
}

fn spawn_task_thread<J>(job: J)
where
    J: FnOnce() + Send + 'static,
{
    // The job is parked in a slot so it can still run inline if the OS refuses a thread
    let slot = Arc::new(Mutex::new(Some(job)));
    let worker_slot = Arc::clone(&slot);
    let spawned = thread::Builder::new()
        .name("terrain-task".to_string())
        .spawn(move || {
            if let Some(job) = take_job(&worker_slot) {
                job();
            }
        });

    if let Err(e) = spawned {
        log::error!("Failed to spawn task thread, running inline: {}", e);
        if let Some(job) = take_job(&slot) {
            job();
        }
    }
}

fn take_job<J>(slot: &Mutex<Option<J>>) -> Option<J> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).take()
}

/// Work queue whose completions are applied to a context of type `C`
pub struct TaskQueue<C> {
    spawner: TaskSpawner<C>,
}

impl<C: 'static> TaskQueue<C> {
    /// Create a queue with the given execution strategy.
    ///
    /// Fails only when a pooled configuration cannot build its pool.
    pub fn new(config: &WorkerConfig) -> Result<Self> {
        let executor = match config {
            WorkerConfig::PerTask => Executor::PerTask,
            WorkerConfig::Pooled { threads } => {
                if *threads == 0 {
                    return Err(Error::Worker("pooled worker count must be at least 1".to_string()));
                }
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(*threads)
                    .thread_name(|i| format!("terrain-worker-{}", i))
                    .build()
                    .map_err(|e| Error::Worker(e.to_string()))?;
                log::debug!("Created terrain worker pool with {} threads", threads);
                Executor::Pool(Arc::new(pool))
            }
        };

        Ok(Self::with_executor(executor))
    }

    /// Queue that spawns one thread per task
    pub fn per_task() -> Self {
        Self::with_executor(Executor::PerTask)
    }

    fn with_executor(executor: Executor) -> Self {
        Self {
            spawner: TaskSpawner {
                shared: Arc::new(Shared {
                    ready: Mutex::new(VecDeque::new()),
                    pending: AtomicUsize::new(0),
                }),
                executor,
            },
        }
    }

    /// Submit-only handle sharing this queue
    pub fn spawner(&self) -> TaskSpawner<C> {
        self.spawner.clone()
    }

    /// See [`TaskSpawner::submit`]
    pub fn submit<R, W, F>(&self, work: W, on_complete: F)
    where
        R: Send + 'static,
        W: FnOnce() -> R + Send + 'static,
        F: FnOnce(&mut C, R) + Send + 'static,
    {
        self.spawner.submit(work, on_complete);
    }

    /// Run every callback that has completed so far, in completion order,
    /// on the calling thread. Returns the number delivered.
    ///
    /// Tasks that complete while draining (including ones submitted by the
    /// callbacks themselves) are left for the next drain.
    pub fn drain(&self, ctx: &mut C) -> usize {
        let ready = std::mem::take(&mut *self.spawner.shared.ready());
        let delivered = ready.len();

        for delivery in ready {
            self.spawner.shared.pending.fetch_sub(1, Ordering::SeqCst);
            delivery(ctx);
        }

        if delivered > 0 {
            log::trace!("Delivered {} task results", delivered);
        }
        delivered
    }

    /// Tasks submitted but not yet delivered
    pub fn pending_count(&self) -> usize {
        self.spawner.pending_count()
    }

    /// Completed tasks waiting for the next drain
    pub fn completed_count(&self) -> usize {
        self.spawner.shared.ready().len()
    }
}
