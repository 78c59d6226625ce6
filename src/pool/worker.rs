//! Worker thread main loop.
//!
//! A worker cycles through Dispatching -> Running -> Idle until an idle
//! episode expires or the destructor requests a stop. Every state decision
//! happens under the pool lock; task code runs strictly outside it.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar};

use crate::pool::idle::{IdleBudget, IdleWait};
use crate::pool::shared::{cond_wait, cond_wait_timeout, Shared};
use crate::task::Runnable;

/// Why a worker left its loop.
enum Exit {
    Stop,
    IdleTimeout,
}

pub(crate) fn worker_loop(shared: Arc<Shared>, index: usize, wake: Arc<Condvar>) {
    tracing::debug!(pool = %shared.name, worker = index, "worker started");

    let mut guard = shared.lock();
    let exit = loop {
        // Dispatching. A task in the handoff slot is committed work (its
        // submitter was already told `true`), so it runs before any stop
        // request is honored; the destructor only sets `stop` once the
        // queue is drained.
        if let Some(task) = guard.workers[index].assigned.take() {
            drop(guard);
            run_task(&shared, index, task);
            guard = shared.lock();
            guard.stats.completed += 1;
            continue;
        }

        if guard.workers[index].stop {
            break Exit::Stop;
        }

        if let Some(envelope) = guard.queue.pop() {
            let task = envelope.into_dispatch();
            if guard.queue.is_empty() {
                shared.drained.notify_all();
            }
            drop(guard);
            run_task(&shared, index, task);
            guard = shared.lock();
            guard.stats.completed += 1;
            continue;
        }

        // Idle. One budget covers the whole episode; spurious wakeups
        // re-poll it instead of rearming.
        guard.workers[index].idle = true;
        let budget = IdleBudget::start(shared.config.idle_timeout());
        let expired = loop {
            if guard.workers[index].stop {
                break false;
            }
            if !guard.workers[index].idle {
                // A submitter claimed this worker; the task is in the
                // handoff slot.
                break false;
            }
            if !guard.queue.is_empty() {
                guard.workers[index].idle = false;
                break false;
            }
            match budget.poll() {
                IdleWait::Expired => {
                    guard.workers[index].idle = false;
                    break true;
                }
                IdleWait::Unbounded => guard = cond_wait(&wake, guard),
                IdleWait::For(remaining) => {
                    guard = cond_wait_timeout(&wake, guard, remaining);
                }
            }
        };

        if expired {
            break Exit::IdleTimeout;
        }
    };

    // Exiting
    guard.workers[index].idle = false;
    guard.live -= 1;
    if matches!(exit, Exit::IdleTimeout) {
        guard.stats.workers_reaped += 1;
    }
    drop(guard);

    match exit {
        Exit::Stop => {
            tracing::debug!(pool = %shared.name, worker = index, "worker stopped");
        }
        Exit::IdleTimeout => {
            tracing::debug!(
                pool = %shared.name,
                worker = index,
                "worker reaped after idle timeout"
            );
        }
    }
}

/// Run one task with panic containment. A task that panics is logged and
/// counted as complete; the worker survives to serve further tasks.
fn run_task(shared: &Shared, worker: usize, task: Box<dyn Runnable>) {
    let task_id = task.id();
    tracing::trace!(pool = %shared.name, worker, task = %task_id, "task dispatched");

    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(move || task.run())) {
        tracing::error!(
            pool = %shared.name,
            worker,
            task = %task_id,
            panic = panic_message(payload.as_ref()),
            "task panicked"
        );
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
