//! Pool configuration.
//!
//! Configuration is immutable after construction. Values can be given
//! programmatically or loaded from environment variables:
//!
//! | Variable            | Meaning                              | Default            |
//! |---------------------|--------------------------------------|--------------------|
//! | `POOL_MAX_THREADS`  | upper bound on live workers          | CPU count          |
//! | `POOL_MAX_WAITING`  | queue capacity (blocked submitters)  | workers × 100      |
//! | `POOL_IDLE_TIMEOUT` | idle lifetime before a worker exits  | `30s` (`off` = never) |

mod error;
mod parse;

pub use error::ConfigError;

use parse::{env_opt, env_or, parse_duration};
use std::num::NonZeroUsize;
use std::time::Duration;

/// Default queue capacity multiplier per worker.
const DEFAULT_QUEUE_MULTIPLIER: usize = 100;

/// Default idle lifetime of a worker.
const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Immutable pool configuration.
///
/// All values are validated at construction time for zero-cost access.
#[derive(Clone, Debug)]
pub struct PoolConfig {
    /// Upper bound on live workers (never zero).
    max_thread_count: NonZeroUsize,
    /// Upper bound on submitters blocked awaiting a worker.
    max_waiting: usize,
    /// Duration a worker may stay idle before self-terminating.
    idle_timeout: Duration,
}

impl PoolConfig {
    /// Build a validated configuration.
    ///
    /// `max_thread_count` must be at least 1. A `max_waiting` of zero means
    /// no submitter ever blocks: once every worker is busy and the pool is
    /// at full size, submissions are refused. An `idle_timeout` of zero
    /// makes workers exit as soon as they run out of work;
    /// `Duration::MAX` keeps them alive for the pool's lifetime.
    pub fn new(
        max_thread_count: usize,
        max_waiting: usize,
        idle_timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let max_thread_count =
            NonZeroUsize::new(max_thread_count).ok_or_else(|| ConfigError::Invalid {
                key: "max_thread_count".into(),
                message: "must be at least 1".into(),
            })?;

        Ok(Self {
            max_thread_count,
            max_waiting,
            idle_timeout,
        })
    }

    /// Load configuration from environment variables.
    ///
    /// `POOL_MAX_THREADS=0` (or unset) resolves to the CPU count. An unset
    /// `POOL_MAX_WAITING` resolves to workers × 100; an explicit `0`
    /// disables queuing. `POOL_IDLE_TIMEOUT=off` disables idle reaping.
    pub fn from_env() -> Result<Self, ConfigError> {
        let max_thread_count = Self::parse_max_threads()?;
        let max_waiting = Self::parse_max_waiting(max_thread_count)?;
        let idle_timeout = Self::parse_idle_timeout()?;

        Ok(Self {
            max_thread_count,
            max_waiting,
            idle_timeout,
        })
    }

    /// Get the worker ceiling (pre-computed, zero-cost).
    #[inline]
    pub fn max_thread_count(&self) -> usize {
        self.max_thread_count.get()
    }

    /// Get the queue capacity.
    #[inline]
    pub fn max_waiting(&self) -> usize {
        self.max_waiting
    }

    /// Get the idle lifetime budget.
    #[inline]
    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    fn parse_max_threads() -> Result<NonZeroUsize, ConfigError> {
        let raw = env_or("POOL_MAX_THREADS", "0");
        let threads: usize = raw.parse().map_err(|e| ConfigError::Parse {
            key: "POOL_MAX_THREADS".into(),
            value: raw,
            error: format!("{e}"),
        })?;

        // Resolve 0 to CPU count
        let count = if threads == 0 { num_cpus::get() } else { threads };

        NonZeroUsize::new(count).ok_or_else(|| ConfigError::Invalid {
            key: "POOL_MAX_THREADS".into(),
            message: "thread count cannot be zero".into(),
        })
    }

    fn parse_max_waiting(threads: NonZeroUsize) -> Result<usize, ConfigError> {
        // Unset derives from the worker ceiling; an explicit 0 is a real
        // "no queue" request, so env_or's defaulting is not used here.
        match env_opt("POOL_MAX_WAITING") {
            None => Ok(threads.get() * DEFAULT_QUEUE_MULTIPLIER),
            Some(raw) => raw.parse().map_err(|e| ConfigError::Parse {
                key: "POOL_MAX_WAITING".into(),
                value: raw,
                error: format!("{e}"),
            }),
        }
    }

    fn parse_idle_timeout() -> Result<Duration, ConfigError> {
        let raw = env_or("POOL_IDLE_TIMEOUT", "30s");
        let parsed = parse_duration(&raw).map_err(|e| ConfigError::Parse {
            key: "POOL_IDLE_TIMEOUT".into(),
            value: raw,
            error: e,
        })?;

        // "off"/"0" disable reaping entirely
        Ok(parsed.unwrap_or(Duration::MAX))
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        let max_thread_count =
            NonZeroUsize::new(num_cpus::get()).unwrap_or(NonZeroUsize::MIN);
        Self {
            max_thread_count,
            max_waiting: max_thread_count.get() * DEFAULT_QUEUE_MULTIPLIER,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}
