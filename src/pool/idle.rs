//! Idle-episode deadline accounting.
//!
//! One budget is armed per idle episode. The expiry verdict is only acted
//! on under the pool lock, so a worker that was handed a task right at the
//! deadline is never torn down with work in hand.

use std::time::{Duration, Instant};

/// What an idle worker should do next.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum IdleWait {
    /// Keep waiting, at most this long.
    For(Duration),
    /// No deadline; wait until signalled.
    Unbounded,
    /// The idle budget is spent.
    Expired,
}

/// Deadline for a single idle episode.
///
/// Spurious wakeups re-poll the same budget, so an episode never stretches
/// past its original deadline.
pub(crate) struct IdleBudget {
    deadline: Option<Instant>,
}

impl IdleBudget {
    /// Arm the budget at the start of an idle episode. A timeout too large
    /// to represent as a deadline means the worker never self-terminates.
    pub(crate) fn start(timeout: Duration) -> Self {
        Self {
            deadline: Instant::now().checked_add(timeout),
        }
    }

    pub(crate) fn poll(&self) -> IdleWait {
        match self.deadline {
            None => IdleWait::Unbounded,
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    IdleWait::Expired
                } else {
                    IdleWait::For(deadline - now)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_budget_expires_immediately() {
        let budget = IdleBudget::start(Duration::ZERO);
        assert_eq!(budget.poll(), IdleWait::Expired);
    }

    #[test]
    fn test_budget_counts_down() {
        let budget = IdleBudget::start(Duration::from_secs(60));
        match budget.poll() {
            IdleWait::For(remaining) => assert!(remaining <= Duration::from_secs(60)),
            other => panic!("expected a bounded wait, got {:?}", other),
        }
    }

    #[test]
    fn test_elapsed_budget_expires() {
        let budget = IdleBudget::start(Duration::from_millis(10));
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(budget.poll(), IdleWait::Expired);
    }

    #[test]
    fn test_unrepresentable_deadline_never_expires() {
        let budget = IdleBudget::start(Duration::MAX);
        assert_eq!(budget.poll(), IdleWait::Unbounded);
    }
}
