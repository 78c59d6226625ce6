//! Elastic worker pool with admission control.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        ThreadPool                            │
//! ├──────────────────────────────────────────────────────────────┤
//! │  submit(task)                                                │
//! │      │                                                       │
//! │      ├── parked worker? ──► handoff slot ──► Worker N        │
//! │      ├── below ceiling? ──► spawn ─────────► Worker N+1      │
//! │      ├── queue has room? ─► enqueue, block ─► next free      │
//! │      │                      (bounded FIFO)    worker         │
//! │      └── otherwise ───────► cancel_run, return false         │
//! │                                                              │
//! │  Workers park when the queue empties and exit after          │
//! │  `idle_timeout` without work. Drop drains the queue, then    │
//! │  stops and joins every worker.                               │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! A single lock guards the pool state; per-worker wake signals and
//! per-envelope completion signals keep wakeups targeted instead of
//! herd-wide. Tasks execute strictly outside the lock.

mod idle;
mod queue;
mod shared;
mod thread;
mod worker;

pub use thread::ThreadPool;

/// Counters accumulated over a pool's lifetime.
///
/// `submitted` counts every `submit` call; `rejected` is the subset that
/// was refused. A task that panicked still counts as `completed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Total submissions, accepted or not.
    pub submitted: u64,
    /// Submissions refused at admission.
    pub rejected: u64,
    /// Tasks whose `run` finished (including by panic).
    pub completed: u64,
    /// Worker threads spawned.
    pub workers_spawned: u64,
    /// Workers that exited by idle timeout.
    pub workers_reaped: u64,
}
