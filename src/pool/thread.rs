//! Pool controller: admission, growth, and drain-on-drop.

use std::sync::atomic::Ordering;
use std::sync::{Arc, Condvar, PoisonError};
use std::thread;
use std::time::Duration;

use crate::config::PoolConfig;
use crate::pool::queue::Envelope;
use crate::pool::shared::{PoolState, Shared, WorkerSlot};
use crate::pool::worker::worker_loop;
use crate::pool::PoolStats;
use crate::task::Runnable;

/// A bounded pool of worker threads that grows on submission pressure and
/// shrinks when workers stay idle past the configured timeout.
///
/// [`submit`](ThreadPool::submit) hands a task to a parked worker when one
/// exists, spawns a new worker while the pool is below its ceiling, and
/// otherwise blocks the caller in a bounded queue. When the queue is full
/// too, the task is refused: its `cancel_run` is invoked and `submit`
/// returns `false`.
///
/// Dropping the pool blocks until the queue drains, then stops and joins
/// every worker; tasks already admitted always run.
pub struct ThreadPool {
    shared: Arc<Shared>,
}

impl ThreadPool {
    /// Create an empty pool. Construction is cheap and spawns no threads;
    /// workers appear lazily as tasks are submitted.
    pub fn new(config: PoolConfig, name: impl Into<String>) -> Self {
        let shared = Arc::new(Shared::new(name.into(), config));

        tracing::info!(
            pool = %shared.name,
            max_threads = shared.config.max_thread_count(),
            queue_capacity = shared.config.max_waiting(),
            idle_timeout_ms = shared.config.idle_timeout().as_millis() as u64,
            "thread pool created"
        );

        Self { shared }
    }

    /// Submit a task for execution.
    ///
    /// Returns `true` once the task has been handed to a worker (possibly
    /// after blocking in the queue), `false` if the pool is saturated and
    /// the task was cancel-notified instead. Exactly one of the task's
    /// `run` or `cancel_run` will be invoked, never both.
    pub fn submit(&self, task: Box<dyn Runnable>) -> bool {
        let mut state = self.shared.lock();
        state.stats.submitted += 1;
        state.check(&self.shared.config);

        // A parked worker takes the task directly, bypassing the queue.
        if let Some(slot) = state.idle_worker_mut() {
            slot.idle = false;
            slot.assigned = Some(task);
            slot.wake.notify_one();
            return true;
        }

        // Below the ceiling: spawn a worker with the task as its first
        // unit of work. On spawn failure the task is reclaimed and falls
        // through to the queue.
        let task = if state.live < self.shared.config.max_thread_count() {
            match self.spawn_worker(&mut state, task) {
                Ok(()) => return true,
                Err(task) => task,
            }
        } else {
            task
        };

        // Saturated: block in the queue until a worker takes the envelope.
        // With no live worker left (spawn failure path) nothing would ever
        // drain the queue, so refuse instead.
        if !state.queue.is_full() && state.live > 0 {
            let (envelope, handed_off, completion) = Envelope::new(task);
            state.queue.push(envelope);
            while !handed_off.load(Ordering::SeqCst) {
                state = completion
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
            }
            return true;
        }

        // Refused: cancel-notify outside the lock, where the handler is
        // free to submit elsewhere.
        state.stats.rejected += 1;
        let queue_len = state.queue.len();
        drop(state);

        tracing::debug!(
            pool = %self.shared.name,
            task = %task.id(),
            queued = queue_len,
            "submission refused, pool saturated"
        );
        task.cancel_run();
        false
    }

    /// Number of live workers. The value is stale the instant it is read.
    pub fn current_thread_count(&self) -> usize {
        self.shared.lock().live
    }

    /// Number of envelopes waiting in the queue, each with a blocked
    /// submitter behind it.
    pub fn pending_count(&self) -> usize {
        self.shared.lock().queue.len()
    }

    /// Counters accumulated since construction.
    pub fn stats(&self) -> PoolStats {
        self.shared.lock().stats
    }

    /// Get the worker ceiling.
    pub fn max_thread_count(&self) -> usize {
        self.shared.config.max_thread_count()
    }

    /// Get the queue capacity.
    pub fn queue_capacity(&self) -> usize {
        self.shared.config.max_waiting()
    }

    /// Get the idle lifetime budget.
    pub fn idle_timeout(&self) -> Duration {
        self.shared.config.idle_timeout()
    }

    /// Get the pool name.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Spawn a worker whose first task is `task`. Called with the pool
    /// lock held; the new thread blocks on that lock until the caller
    /// releases it, so its slot is always in place before it runs.
    fn spawn_worker(
        &self,
        state: &mut PoolState,
        task: Box<dyn Runnable>,
    ) -> Result<(), Box<dyn Runnable>> {
        let index = state.workers.len();
        let wake = Arc::new(Condvar::new());

        let shared = Arc::clone(&self.shared);
        let worker_wake = Arc::clone(&wake);
        let spawned = thread::Builder::new()
            .name(format!("{}-{}", self.shared.name, index))
            .spawn(move || worker_loop(shared, index, worker_wake));

        match spawned {
            Ok(handle) => {
                let mut slot = WorkerSlot::new(wake);
                slot.assigned = Some(task);
                slot.handle = Some(handle);
                state.workers.push(slot);
                state.live += 1;
                state.stats.workers_spawned += 1;
                state.check(&self.shared.config);
                Ok(())
            }
            Err(error) => {
                tracing::warn!(
                    pool = %self.shared.name,
                    error = %error,
                    "failed to spawn worker thread"
                );
                Err(task)
            }
        }
    }
}

impl Drop for ThreadPool {
    /// Drain, then stop: waits until the queue is empty, requests every
    /// worker to exit, and joins them. Admitted tasks have all run by the
    /// time this returns.
    fn drop(&mut self) {
        let mut state = self.shared.lock();
        while !state.queue.is_empty() {
            state = self
                .shared
                .drained
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }

        for slot in state.workers.iter_mut() {
            slot.stop = true;
            slot.wake.notify_one();
        }
        let handles: Vec<_> = state
            .workers
            .iter_mut()
            .filter_map(|slot| slot.handle.take())
            .collect();
        drop(state);

        for handle in handles {
            if handle.join().is_err() {
                tracing::error!(
                    pool = %self.shared.name,
                    "worker thread panicked outside a task"
                );
            }
        }

        let state = self.shared.lock();
        assert_eq!(state.live, 0, "worker thread leaked past shutdown");
        drop(state);

        tracing::info!(pool = %self.shared.name, "thread pool shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::from_fn;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn pool(max_threads: usize, max_waiting: usize, idle_timeout: Duration) -> ThreadPool {
        let config = PoolConfig::new(max_threads, max_waiting, idle_timeout).unwrap();
        ThreadPool::new(config, "test")
    }

    #[test]
    fn test_basic_execution() {
        let hits = Arc::new(AtomicUsize::new(0));
        let pool = pool(2, 10, Duration::from_secs(5));

        let hits_clone = Arc::clone(&hits);
        assert!(pool.submit(from_fn("t-0", move || {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        })));

        drop(pool);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_tasks_drain_before_shutdown() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pool = pool(2, 10, Duration::from_secs(5));

        for i in 0..6 {
            let log = Arc::clone(&log);
            assert!(pool.submit(from_fn(format!("t-{i}"), move || {
                thread::sleep(Duration::from_millis(10));
                log.lock().unwrap().push(i);
            })));
        }

        drop(pool);
        let mut seen = log.lock().unwrap().clone();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_observers() {
        let pool = pool(3, 7, Duration::from_millis(400));
        assert_eq!(pool.max_thread_count(), 3);
        assert_eq!(pool.queue_capacity(), 7);
        assert_eq!(pool.idle_timeout(), Duration::from_millis(400));
        assert_eq!(pool.name(), "test");
        assert_eq!(pool.current_thread_count(), 0);
        assert_eq!(pool.pending_count(), 0);
    }

    #[test]
    fn test_stats_accounting() {
        let pool = pool(2, 10, Duration::from_secs(5));
        for i in 0..4 {
            assert!(pool.submit(from_fn(format!("t-{i}"), || {})));
        }
        // Workers are joined by drop, so completion counts are final.
        let shared = Arc::clone(&pool.shared);
        drop(pool);

        let state = shared.lock();
        assert_eq!(state.stats.submitted, 4);
        assert_eq!(state.stats.completed, 4);
        assert_eq!(state.stats.rejected, 0);
        assert!(state.stats.workers_spawned >= 1);
        assert!(state.stats.workers_spawned <= 2);
    }

    #[test]
    fn test_panicking_task_does_not_kill_worker() {
        let pool = pool(1, 4, Duration::from_secs(5));
        let hits = Arc::new(AtomicUsize::new(0));

        assert!(pool.submit(from_fn("bad", || panic!("intentional"))));
        let hits_clone = Arc::clone(&hits);
        assert!(pool.submit(from_fn("good", move || {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        })));

        drop(pool);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
