use super::{Completion, Job};
use anyhow::{Context, Result};
use crossbeam::channel::Sender;
use parking_lot::Mutex;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::collections::VecDeque;
use std::thread;

/// Where jobs run. Implementations must eventually send one completion per
/// job that is not stale, and may drop stale jobs silently.
pub trait Executor: Send {
    fn execute(&self, job: Job, done: Sender<Completion>);

    /// Do a bounded amount of queued work on the calling thread. Returns
    /// whether anything ran.
    fn run_pending(&self) -> bool {
        false
    }
}

/// Runs jobs in parallel on a dedicated rayon pool.
pub struct RayonExecutor {
    pool: ThreadPool,
}

impl RayonExecutor {
    /// `threads == 0` lets rayon pick one per logical core.
    pub fn new(threads: usize) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("ukeire-{i}"))
            .build()
            .context("failed to build ukeire thread pool")?;
        Ok(Self { pool })
    }
}

impl Executor for RayonExecutor {
    fn execute(&self, job: Job, done: Sender<Completion>) {
        self.pool.spawn(move || job.run_into(&done));
    }
}

/// Queues jobs and runs one per [`Executor::run_pending`] call on the
/// calling thread, yielding afterwards so an interactive caller stays
/// responsive between units.
#[derive(Default)]
pub struct SequentialExecutor {
    queue: Mutex<VecDeque<(Job, Sender<Completion>)>>,
}

impl SequentialExecutor {
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }
}

impl Executor for SequentialExecutor {
    fn execute(&self, job: Job, done: Sender<Completion>) {
        self.queue.lock().push_back((job, done));
    }

    fn run_pending(&self) -> bool {
        // the lock must not be held while the job runs
        let next = self.queue.lock().pop_front();
        let Some((job, done)) = next else {
            return false;
        };
        job.run_into(&done);
        thread::yield_now();
        true
    }
}
