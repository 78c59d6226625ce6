//! The unit-of-work contract consumed by the pool.

/// A unit of work submitted to a [`ThreadPool`](crate::ThreadPool).
///
/// The pool calls exactly one of [`run`](Runnable::run) or
/// [`cancel_run`](Runnable::cancel_run) over the lifetime of a task:
/// `run` when the task is dispatched to a worker, `cancel_run` when
/// admission is refused. Both receivers consume the box, so neither can be
/// called twice and they can never race each other.
///
/// [`id`](Runnable::id) is used for logging only and may be called at any
/// time before the task is consumed.
pub trait Runnable: Send {
    /// Execute the work. Called on a worker thread, never under the pool
    /// lock. A panic escaping `run` is caught and logged; the worker
    /// survives.
    fn run(self: Box<Self>);

    /// Notification that the task was refused admission and will never run.
    fn cancel_run(self: Box<Self>);

    /// Stable identifier for logging.
    fn id(&self) -> String;
}

/// Wrap a closure as a [`Runnable`].
///
/// The returned task ignores cancellation beyond dropping the closure.
/// Implement [`Runnable`] directly when a rejection handler is needed.
pub fn from_fn<F>(id: impl Into<String>, f: F) -> Box<dyn Runnable>
where
    F: FnOnce() + Send + 'static,
{
    Box::new(FnRunnable { id: id.into(), f })
}

struct FnRunnable<F> {
    id: String,
    f: F,
}

impl<F> Runnable for FnRunnable<F>
where
    F: FnOnce() + Send + 'static,
{
    fn run(self: Box<Self>) {
        (self.f)()
    }

    fn cancel_run(self: Box<Self>) {}

    fn id(&self) -> String {
        self.id.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_from_fn_runs_closure() {
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_clone = Arc::clone(&hits);

        let task = from_fn("closure-1", move || {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(task.id(), "closure-1");
        task.run();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_from_fn_cancel_does_not_run() {
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_clone = Arc::clone(&hits);

        let task = from_fn("closure-2", move || {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });

        task.cancel_run();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
