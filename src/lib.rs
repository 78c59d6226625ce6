//! taskpool - Bounded elastic thread pool with admission control.
//!
//! This crate provides a pool of worker threads that grows lazily under
//! submission pressure up to a configured ceiling and shrinks again when
//! workers stay idle past a configured timeout.
//!
//! # Features
//!
//! - **Lazy growth**: no threads at construction; workers spawn on demand
//! - **Back-pressure**: a bounded queue blocks submitters, and refuses
//!   tasks (with a cancellation notice) once it is full
//! - **Idle reaping**: workers self-terminate after `idle_timeout` without
//!   work, down to an empty pool
//! - **Drain on drop**: destruction waits for every admitted task, then
//!   joins all workers
//! - **Structured logging**: worker lifecycle and admission outcomes via
//!   `tracing`
//!
//! # Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use taskpool::{task, PoolConfig, ThreadPool};
//!
//! let config = PoolConfig::new(4, 100, Duration::from_secs(30))?;
//! let pool = ThreadPool::new(config, "crunch");
//!
//! let accepted = pool.submit(task::from_fn("job-1", || {
//!     // heavy work here
//! }));
//! assert!(accepted);
//! // dropping the pool waits for job-1 to finish
//! ```

/// Package version from Cargo.toml
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod pool;
pub mod task;

// Re-exports for convenience
pub use config::{ConfigError, PoolConfig};
pub use pool::{PoolStats, ThreadPool};
pub use task::Runnable;
