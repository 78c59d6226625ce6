//! Pool state shared between submitters, workers, and the destructor.
//!
//! A single lock guards everything mutable; the condition variables
//! (per-worker wake, per-envelope completion, pool-wide drain) are all
//! waited on through that one lock. Task code never runs while it is held.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::config::PoolConfig;
use crate::pool::queue::SubmitQueue;
use crate::pool::PoolStats;
use crate::task::Runnable;

/// Immutable handles plus the guarded state. One instance per pool,
/// referenced by the controller and by every worker thread.
pub(crate) struct Shared {
    /// Pool name for logging and worker thread names.
    pub(crate) name: String,
    pub(crate) config: PoolConfig,
    state: Mutex<PoolState>,
    /// Notified whenever the queue transitions to empty.
    pub(crate) drained: Condvar,
}

impl Shared {
    pub(crate) fn new(name: String, config: PoolConfig) -> Self {
        let queue = SubmitQueue::with_capacity(config.max_waiting());
        Self {
            name,
            config,
            state: Mutex::new(PoolState {
                workers: Vec::new(),
                queue,
                live: 0,
                stats: PoolStats::default(),
            }),
            drained: Condvar::new(),
        }
    }

    /// Enter the monitor. Nothing panics while the lock is held (task code
    /// runs outside it), so a poisoned lock still guards consistent state
    /// and is recovered rather than propagated.
    pub(crate) fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Block on a condition inside the monitor.
pub(crate) fn cond_wait<'a>(
    condvar: &Condvar,
    guard: MutexGuard<'a, PoolState>,
) -> MutexGuard<'a, PoolState> {
    condvar.wait(guard).unwrap_or_else(PoisonError::into_inner)
}

/// Block on a condition inside the monitor, for at most `timeout`.
/// Expiry is re-derived by the caller; the primitive's verdict is ignored.
pub(crate) fn cond_wait_timeout<'a>(
    condvar: &Condvar,
    guard: MutexGuard<'a, PoolState>,
    timeout: Duration,
) -> MutexGuard<'a, PoolState> {
    condvar
        .wait_timeout(guard, timeout)
        .unwrap_or_else(PoisonError::into_inner)
        .0
}

/// Everything mutable, guarded by the pool lock.
pub(crate) struct PoolState {
    /// Worker records, indexed by worker id. Slots of exited workers keep
    /// their join handle until the destructor reaps them.
    pub(crate) workers: Vec<WorkerSlot>,
    pub(crate) queue: SubmitQueue,
    /// Workers that have not yet decremented themselves out.
    pub(crate) live: usize,
    pub(crate) stats: PoolStats,
}

impl PoolState {
    /// First parked worker, if any.
    pub(crate) fn idle_worker_mut(&mut self) -> Option<&mut WorkerSlot> {
        self.workers.iter_mut().find(|w| w.idle)
    }

    pub(crate) fn idle_count(&self) -> usize {
        self.workers.iter().filter(|w| w.idle).count()
    }

    /// Structural invariants; queue capacity is asserted by the queue
    /// itself on push.
    pub(crate) fn check(&self, config: &PoolConfig) {
        assert!(
            self.live <= config.max_thread_count(),
            "live worker count {} exceeds max_thread_count {}",
            self.live,
            config.max_thread_count()
        );
        debug_assert!(
            self.queue.is_empty() || self.idle_count() == 0,
            "queued work while workers sit idle"
        );
    }
}

/// Per-worker record. Flags are only touched under the pool lock; the wake
/// condition is shared with the worker thread.
pub(crate) struct WorkerSlot {
    pub(crate) wake: Arc<Condvar>,
    /// True iff the worker is parked on `wake` with no task in hand.
    pub(crate) idle: bool,
    /// Exit request from the destructor; honored once any handed-off task
    /// has run.
    pub(crate) stop: bool,
    /// Direct handoff slot: a task committed to this worker, bypassing the
    /// queue.
    pub(crate) assigned: Option<Box<dyn Runnable>>,
    pub(crate) handle: Option<JoinHandle<()>>,
}

impl WorkerSlot {
    pub(crate) fn new(wake: Arc<Condvar>) -> Self {
        Self {
            wake,
            idle: false,
            stop: false,
            assigned: None,
            handle: None,
        }
    }
}
