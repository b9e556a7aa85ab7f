//! Periodic job scheduler.
//!
//! Every job runs as its own cooperative task on one `edge-executor`
//! [`LocalExecutor`], timed by `async-io-mini` reactor timers.  No task
//! busy-waits and no job can starve another for longer than one `run()`.
//!
//! ```text
//!  ┌──────────────────────────────────────────────────────────────┐
//!  │  futures_lite::block_on                                      │
//!  │  ┌────────────────────────────────────────────────────────┐  │
//!  │  │  edge_executor::LocalExecutor                          │  │
//!  │  │                                                        │  │
//!  │  │  ┌───────────┐ ┌─────────┐ ┌─────────┐ ┌───────────┐   │  │
//!  │  │  │ reservoir │ │  well   │ │   tds   │ │  control  │…  │  │
//!  │  │  │  500ms ⏱  │ │ 500ms ⏱ │ │ 2000ms ⏱│ │  200ms ⏱  │   │  │
//!  │  │  └───────────┘ └─────────┘ └─────────┘ └───────────┘   │  │
//!  │  └────────────────────────────────────────────────────────┘  │
//!  └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Deadlines are drift-free: each one is the previous deadline plus the
//! period.  A job that overruns skips the slots it missed instead of
//! running back-to-back to catch up.

use core::future::Future;
use core::time::Duration;
use std::time::Instant;

use edge_executor::LocalExecutor;
use log::{debug, info, warn};

/// Upper bound on concurrently scheduled jobs.
pub const MAX_JOBS: usize = 8;

/// Work that runs at a fixed period until power-off.
pub trait PeriodicJob {
    /// Human-readable label for logs.
    fn label(&self) -> &'static str;

    /// Period between successive runs, in milliseconds.  Zero is treated as one.
    fn interval_ms(&self) -> u64;

    fn run(&mut self);
}

/// Next deadline after `previous` for a job with `period_ms`, given the
/// current time `now` (all in ms since the scheduler epoch).
///
/// Returns the deadline and how many slots were skipped to reach it.
/// The result is never earlier than `now` and stays on the job's grid.
pub fn next_deadline(previous: u64, period_ms: u64, now: u64) -> (u64, u64) {
    let period = period_ms.max(1);
    let candidate = previous.saturating_add(period);
    if candidate >= now {
        return (candidate, 0);
    }
    let skipped = (now - candidate).div_ceil(period);
    (candidate.saturating_add(skipped.saturating_mul(period)), skipped)
}

/// Run `job` forever on the deadline grid anchored at `epoch`.
async fn drive<J: PeriodicJob>(mut job: J, epoch: Instant) {
    let period = job.interval_ms().max(1);
    let mut deadline = 0u64;
    loop {
        job.run();

        let now = epoch.elapsed().as_millis() as u64;
        let (next, skipped) = next_deadline(deadline, period, now);
        if skipped > 0 {
            debug!("{}: overran, skipped {} slot(s)", job.label(), skipped);
        }
        deadline = next;
        async_io_mini::Timer::at(epoch + Duration::from_millis(deadline)).await;
    }
}

pub struct Scheduler<'a> {
    executor: LocalExecutor<'a, MAX_JOBS>,
    epoch: Instant,
    jobs: usize,
}

impl Default for Scheduler<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Scheduler<'a> {
    pub fn new() -> Self {
        Self {
            executor: LocalExecutor::new(),
            epoch: Instant::now(),
            jobs: 0,
        }
    }

    /// Schedule `job`; its first run happens as soon as the executor starts.
    ///
    /// Returns `false` if the scheduler is already full.
    pub fn spawn<J: PeriodicJob + 'a>(&mut self, job: J) -> bool {
        if self.jobs >= MAX_JOBS {
            warn!("Scheduler: no slot left for '{}'", job.label());
            return false;
        }
        info!("Scheduler: '{}' every {}ms", job.label(), job.interval_ms());
        self.executor.spawn(drive(job, self.epoch)).detach();
        self.jobs += 1;
        true
    }

    pub fn job_count(&self) -> usize {
        self.jobs
    }

    /// Drive every job until power-off.
    pub fn run(&self) {
        self.run_until(core::future::pending::<()>());
    }

    /// Drive every job for `limit`, then return.
    pub fn run_for(&self, limit: Duration) {
        self.run_until(async move {
            async_io_mini::Timer::after(limit).await;
        });
    }

    fn run_until(&self, until: impl Future<Output = ()>) {
        futures_lite::future::block_on(self.executor.run(until));
    }
}
