//! The promise cell: state machine, registration API, and settle bridges.
//!
//! A [`Promise`] is a cheap cloneable handle over one shared cell. The cell
//! holds the [`State`], the two handler chains, the stored results, the
//! catch/finally hooks, the settle observers used by [`race`](crate::race),
//! and the completion synchronizer behind [`Promise::wait`].
//!
//! # Lifecycle
//!
//! State starts at [`State::Unknown`]. The producer settles at most once
//! through one of its two [`Bridge`] handles, which moves the state to
//! [`State::Resolved`] or [`State::Rejected`] and then runs that branch's
//! chain. A panic anywhere in the producer or a chain forces
//! [`State::Recovered`], superseding whatever was set. After the producer
//! returns (or is recovered), the completion sequence runs `finally(state,
//! results)` exactly once - also when the producer never settled and the
//! state is still `Unknown`.
//!
//! # Locking
//!
//! Registration takes the cell lock briefly. Settling snapshots the chain
//! and runs it outside the lock, so handlers are free to inspect other
//! promises (or this one) while they run.

use crate::chain::{HandlerChain, MaybeHandler};
use crate::error::{Fault, SetupError};
use crate::sync::WaitGroup;
use crate::value::{IntoValues, Value};
use std::sync::{Arc, Mutex};
use tracing::{error, trace};

/// The four observable promise states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Not settled. Also the terminal state of a producer that returned
    /// without calling either bridge.
    Unknown,
    /// Settled through the success bridge.
    Resolved,
    /// Settled through the failure bridge.
    Rejected,
    /// A panic was recovered; supersedes `Resolved` and `Rejected`.
    Recovered,
}

type CatchFn = dyn Fn(&Fault) + Send + Sync;
type FinallyFn = dyn Fn(State, &[Value]) + Send + Sync;
type SettleObserver = Box<dyn FnOnce() + Send>;

/// Default catch hook: report the fault and move on.
fn default_catch(fault: &Fault) {
    error!(%fault, "recovered producer fault");
}

fn default_finally(_state: State, _results: &[Value]) {}

struct Inner {
    state: State,
    results: Vec<Value>,
    resolved: HandlerChain,
    rejected: HandlerChain,
    catch: Arc<CatchFn>,
    finally: Arc<FinallyFn>,
    observers: Vec<SettleObserver>,
    started: bool,
    settled: bool,
    completed: bool,
}

impl Inner {
    fn new() -> Self {
        Self {
            state: State::Unknown,
            results: Vec::new(),
            resolved: HandlerChain::new(),
            rejected: HandlerChain::new(),
            catch: Arc::new(default_catch),
            finally: Arc::new(default_finally),
            observers: Vec::new(),
            started: false,
            settled: false,
            completed: false,
        }
    }
}

pub(crate) struct Shared {
    inner: Mutex<Inner>,
    done: WaitGroup,
}

/// Which bridge a settle call came through.
#[derive(Debug, Clone, Copy)]
enum Branch {
    Resolve,
    Reject,
}

/// A handle to one settled-or-not outcome.
///
/// Obtained from [`future`](crate::future) or
/// [`future_deferred`](crate::future_deferred). Clones share the same cell;
/// registration through any clone is visible to all.
///
/// # Example
///
/// ```rust
/// use vow::{future_deferred, Pass, State, Value};
///
/// let (starter, promise) = future_deferred(|resolve, _reject| {
///     resolve.call("A");
/// });
/// promise.then(|s: String| format!("{s}B"), Pass).unwrap();
/// starter.start(false);
///
/// assert_eq!(promise.state(), State::Resolved);
/// assert_eq!(promise.results(), vec![Value::Str("AB".into())]);
/// ```
#[derive(Clone)]
pub struct Promise {
    shared: Arc<Shared>,
}

impl Promise {
    pub(crate) fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner::new()),
                done: WaitGroup::new(),
            }),
        }
    }

    /// Append a success handler and a failure handler in one call.
    ///
    /// Either slot accepts a handler, an `Option` of one, or [`Pass`]
    /// (`Pass`/`None` leave the slot's chain untouched). Returns the same
    /// promise handle for fluent chaining; later calls extend the same
    /// chains rather than creating new promises.
    ///
    /// Fails with [`SetupError::Started`] once execution has begun.
    ///
    /// [`Pass`]: crate::Pass
    pub fn then<S, SArgs, R, RArgs>(
        &self,
        on_resolved: S,
        on_rejected: R,
    ) -> Result<&Self, SetupError>
    where
        S: MaybeHandler<SArgs>,
        R: MaybeHandler<RArgs>,
    {
        let mut inner = self.shared.inner.lock().unwrap();
        if inner.started {
            return Err(SetupError::Started);
        }
        if let Some(entry) = on_resolved.into_entry() {
            inner.resolved.append(entry);
        }
        if let Some(entry) = on_rejected.into_entry() {
            inner.rejected.append(entry);
        }
        Ok(self)
    }

    /// Append a handler to the resolved chain only.
    pub fn on_success<H, Args>(&self, handler: H) -> Result<&Self, SetupError>
    where
        H: MaybeHandler<Args>,
    {
        let mut inner = self.shared.inner.lock().unwrap();
        if inner.started {
            return Err(SetupError::Started);
        }
        if let Some(entry) = handler.into_entry() {
            inner.resolved.append(entry);
        }
        Ok(self)
    }

    /// Append a handler to the rejected chain only.
    pub fn on_fail<H, Args>(&self, handler: H) -> Result<&Self, SetupError>
    where
        H: MaybeHandler<Args>,
    {
        let mut inner = self.shared.inner.lock().unwrap();
        if inner.started {
            return Err(SetupError::Started);
        }
        if let Some(entry) = handler.into_entry() {
            inner.rejected.append(entry);
        }
        Ok(self)
    }

    /// Replace the catch hook invoked once when a panic is recovered.
    ///
    /// The default hook logs the fault at ERROR level. Hooks are
    /// per-promise values, never process-global state.
    pub fn set_catch<F>(&self, hook: F) -> Result<(), SetupError>
    where
        F: Fn(&Fault) + Send + Sync + 'static,
    {
        let mut inner = self.shared.inner.lock().unwrap();
        if inner.started {
            return Err(SetupError::Started);
        }
        inner.catch = Arc::new(hook);
        Ok(())
    }

    /// Replace the finally hook invoked once after every execution with the
    /// terminal state and the stored results.
    ///
    /// The default hook does nothing.
    pub fn set_finally<F>(&self, hook: F) -> Result<(), SetupError>
    where
        F: Fn(State, &[Value]) + Send + Sync + 'static,
    {
        let mut inner = self.shared.inner.lock().unwrap();
        if inner.started {
            return Err(SetupError::Started);
        }
        inner.finally = Arc::new(hook);
        Ok(())
    }

    /// Block until the execution (producer, chain, hooks) has completed.
    ///
    /// Returns immediately when nothing is outstanding - always the case
    /// after inline execution, and before a deferred promise is started.
    pub fn wait(&self) {
        self.shared.done.wait();
    }

    /// The current state.
    pub fn state(&self) -> State {
        self.shared.inner.lock().unwrap().state
    }

    /// The stored results: the last handler's outputs of the settling
    /// chain (the settle arguments themselves when the chain is empty).
    pub fn results(&self) -> Vec<Value> {
        self.shared.inner.lock().unwrap().results.clone()
    }

    /// Both settle handles for this promise, success first.
    pub(crate) fn bridges(&self) -> (Bridge, Bridge) {
        (
            Bridge {
                shared: Arc::clone(&self.shared),
                branch: Branch::Resolve,
            },
            Bridge {
                shared: Arc::clone(&self.shared),
                branch: Branch::Reject,
            },
        )
    }

    /// Freeze chains and hooks; registration fails from here on.
    pub(crate) fn mark_started(&self) {
        self.shared.inner.lock().unwrap().started = true;
    }

    pub(crate) fn add_pending(&self) {
        self.shared.done.add(1);
    }

    pub(crate) fn finish_pending(&self) {
        self.shared.done.done();
    }

    /// Force `Recovered`, notify settle observers, then run the catch hook.
    pub(crate) fn recover(&self, fault: &Fault) {
        let (catch, observers) = {
            let mut inner = self.shared.inner.lock().unwrap();
            inner.state = State::Recovered;
            inner.settled = true;
            (Arc::clone(&inner.catch), std::mem::take(&mut inner.observers))
        };
        for observer in observers {
            observer();
        }
        catch(fault);
    }

    /// Run the completion sequence: mark completed and fire `finally` with
    /// the terminal state and results.
    pub(crate) fn complete(&self) {
        let (finally, state, results) = {
            let mut inner = self.shared.inner.lock().unwrap();
            inner.completed = true;
            (Arc::clone(&inner.finally), inner.state, inner.results.clone())
        };
        finally(state, &results);
    }

    /// Register a one-shot observer fired when this promise settles
    /// (including by recovery). Fires immediately when already settled.
    pub(crate) fn subscribe_settled(&self, observer: SettleObserver) {
        let pending = {
            let mut inner = self.shared.inner.lock().unwrap();
            if inner.settled {
                Some(observer)
            } else {
                inner.observers.push(observer);
                None
            }
        };
        if let Some(observer) = pending {
            observer();
        }
    }
}

// ============================================================================
// Bridges
// ============================================================================

/// A producer-side settle handle for one branch of one promise.
///
/// The producer receives two of these (resolve, reject) and calls at most
/// one. The first call wins: it fixes the state, runs that branch's chain
/// with the given arguments, and returns the chain's final output adapted
/// to the bridge signature's return shape. Any later call on either branch
/// - or any call after the execution completed - is ignored and returns an
/// empty list.
#[derive(Clone)]
pub struct Bridge {
    shared: Arc<Shared>,
    branch: Branch,
}

impl Bridge {
    /// Settle the promise through this branch.
    pub fn call(&self, args: impl IntoValues) -> Vec<Value> {
        settle(&self.shared, self.branch, args.into_values())
    }
}

fn settle(shared: &Arc<Shared>, branch: Branch, args: Vec<Value>) -> Vec<Value> {
    let target = match branch {
        Branch::Resolve => State::Resolved,
        Branch::Reject => State::Rejected,
    };
    let snapshot = {
        let mut inner = shared.inner.lock().unwrap();
        if inner.state != State::Unknown || inner.completed {
            trace!(state = ?inner.state, attempted = ?target, "late settle ignored");
            return Vec::new();
        }
        inner.state = target;
        match branch {
            Branch::Resolve => inner.resolved.snapshot(),
            Branch::Reject => inner.rejected.snapshot(),
        }
    };
    trace!(state = ?target, entries = snapshot.len(), "dispatching settle");
    let outcome = snapshot.run(args);
    let observers = {
        let mut inner = shared.inner.lock().unwrap();
        inner.results = outcome.results;
        inner.settled = true;
        std::mem::take(&mut inner.observers)
    };
    for observer in observers {
        observer();
    }
    outcome.bridged
}
