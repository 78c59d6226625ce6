//! Bounded FIFO of pending task envelopes.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar};

use crate::task::Runnable;

/// A queued task plus the signal back to its blocked submitter.
///
/// The envelope is co-owned by the queue and the submitter until a worker
/// dispatches it; [`into_dispatch`](Envelope::into_dispatch) transfers sole
/// ownership of the task to the worker and releases the submitter.
pub(crate) struct Envelope {
    task: Box<dyn Runnable>,
    /// Set exactly once, when a worker takes the task.
    handed_off: Arc<AtomicBool>,
    /// Wakes the submitter blocked in the enqueue branch.
    completion: Arc<Condvar>,
}

impl Envelope {
    /// Wrap a task for queuing. Returns the envelope together with the
    /// submitter's halves of the completion signal.
    pub(crate) fn new(task: Box<dyn Runnable>) -> (Self, Arc<AtomicBool>, Arc<Condvar>) {
        let handed_off = Arc::new(AtomicBool::new(false));
        let completion = Arc::new(Condvar::new());
        let envelope = Self {
            task,
            handed_off: Arc::clone(&handed_off),
            completion: Arc::clone(&completion),
        };
        (envelope, handed_off, completion)
    }

    /// Mark the envelope handed off, release the blocked submitter, and
    /// yield the task. Must be called while holding the pool lock so the
    /// submitter cannot observe a half-completed handoff.
    pub(crate) fn into_dispatch(self) -> Box<dyn Runnable> {
        let already = self.handed_off.swap(true, Ordering::SeqCst);
        assert!(!already, "envelope dispatched twice");
        self.completion.notify_one();
        self.task
    }
}

/// FIFO buffer of pending envelopes with a hard capacity.
///
/// All access happens under the pool lock.
pub(crate) struct SubmitQueue {
    entries: VecDeque<Envelope>,
    capacity: usize,
}

impl SubmitQueue {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    pub(crate) fn push(&mut self, envelope: Envelope) {
        assert!(
            self.entries.len() < self.capacity,
            "submission queue over capacity ({})",
            self.capacity
        );
        self.entries.push_back(envelope);
    }

    pub(crate) fn pop(&mut self) -> Option<Envelope> {
        self.entries.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::from_fn;

    fn envelope(id: &str) -> Envelope {
        Envelope::new(from_fn(id, || {})).0
    }

    #[test]
    fn test_fifo_order() {
        let mut queue = SubmitQueue::with_capacity(3);
        queue.push(envelope("a"));
        queue.push(envelope("b"));
        queue.push(envelope("c"));

        assert!(queue.is_full());
        let first = queue.pop().unwrap().into_dispatch();
        assert_eq!(first.id(), "a");
        let second = queue.pop().unwrap().into_dispatch();
        assert_eq!(second.id(), "b");
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_dispatch_signals_submitter() {
        let (envelope, handed_off, _completion) = Envelope::new(from_fn("t", || {}));
        assert!(!handed_off.load(Ordering::SeqCst));
        let _task = envelope.into_dispatch();
        assert!(handed_off.load(Ordering::SeqCst));
    }

    #[test]
    fn test_zero_capacity_always_full() {
        let queue = SubmitQueue::with_capacity(0);
        assert!(queue.is_full());
        assert!(queue.is_empty());
    }

    #[test]
    #[should_panic(expected = "over capacity")]
    fn test_push_past_capacity_panics() {
        let mut queue = SubmitQueue::with_capacity(1);
        queue.push(envelope("a"));
        queue.push(envelope("b"));
    }
}
