//! Producer execution: construction, deferred start, and panic recovery.
//!
//! A producer is any `FnOnce(Bridge, Bridge) + Send + 'static`; the two
//! bridges settle the success and failure branches. [`future`] constructs
//! and immediately starts in background mode; [`future_deferred`] hands
//! back a [`Starter`] so handlers and hooks can be registered first.
//!
//! Whichever mode runs the producer, the whole execution - producer,
//! settling chain, hooks - happens on the executing unit inside one
//! recovery boundary: a panic anywhere in it forces
//! [`State::Recovered`](crate::State::Recovered), runs the catch hook once,
//! and still runs the completion sequence, on that same unit. Background
//! mode brackets the run with the promise's completion synchronizer so
//! [`Promise::wait`] covers everything up to and including `finally`.

use crate::error::Fault;
use crate::promise::{Bridge, Promise};
use std::thread;
use tracing::trace;

type Producer = Box<dyn FnOnce(Bridge, Bridge) + Send>;

/// Construct a promise and start its producer in background mode.
///
/// Registration is frozen from the moment this returns a handle; use
/// [`future_deferred`] when handlers must be attached first.
///
/// # Example
///
/// ```rust
/// use vow::{future, State, Value};
///
/// let promise = future(|resolve, _reject| {
///     resolve.call(7i64);
/// });
/// promise.wait();
/// assert_eq!(promise.state(), State::Resolved);
/// assert_eq!(promise.results(), vec![Value::Int(7)]);
/// ```
pub fn future<P>(producer: P) -> Promise
where
    P: FnOnce(Bridge, Bridge) + Send + 'static,
{
    let (starter, promise) = future_deferred(producer);
    starter.start(true);
    promise
}

/// Construct a promise without starting it.
///
/// Returns the [`Starter`] alongside the promise handle; the execution
/// begins only at [`Starter::start`].
pub fn future_deferred<P>(producer: P) -> (Starter, Promise)
where
    P: FnOnce(Bridge, Bridge) + Send + 'static,
{
    let promise = Promise::new();
    let starter = Starter {
        promise: promise.clone(),
        producer: Box::new(producer),
    };
    (starter, promise)
}

/// The deferred-execution handle.
///
/// Consumed by [`start`](Starter::start), so a producer cannot be run
/// twice. Dropping an unstarted starter abandons the promise: its state
/// stays `Unknown`, `finally` never fires, and `wait` returns immediately.
pub struct Starter {
    promise: Promise,
    producer: Producer,
}

impl Starter {
    /// Freeze registration and run the producer.
    ///
    /// With `background` set, the producer runs on a named spawned thread
    /// and this returns immediately; otherwise it runs on the calling
    /// thread and returns only after the completion sequence.
    pub fn start(self, background: bool) {
        let Starter { promise, producer } = self;
        promise.mark_started();
        if background {
            promise.add_pending();
            let runner = promise.clone();
            thread::Builder::new()
                .name("vow-producer".to_string())
                .spawn(move || run_producer(&runner, producer, true))
                .expect("failed to spawn producer thread");
        } else {
            run_producer(&promise, producer, false);
        }
    }
}

/// Releases one unit of the completion synchronizer on drop, so waiters
/// are unblocked even when a hook panics on the way out.
struct PendingGuard(Promise);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.finish_pending();
    }
}

/// One full execution: producer inside the recovery boundary, then the
/// completion sequence, all on the current thread.
fn run_producer(promise: &Promise, producer: Producer, background: bool) {
    trace!(background, "producer starting");
    let _pending = background.then(|| PendingGuard(promise.clone()));
    let (resolve, reject) = promise.bridges();
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
        producer(resolve, reject);
    }));
    if let Err(payload) = outcome {
        let fault = Fault::from_payload(payload);
        promise.recover(&fault);
    }
    promise.complete();
    trace!(state = ?promise.state(), "producer finished");
}
