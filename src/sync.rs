//! Completion synchronizer.

use std::sync::{Condvar, Mutex};

/// A counter that lets threads block until outstanding work reaches zero.
///
/// [`Promise::wait`](crate::Promise::wait) is built on this: background
/// execution adds one before spawning and signals done after the completion
/// sequence, so waiters observe a fully finished promise. Waiting on a zero
/// counter returns immediately, which is always the case after inline
/// execution.
#[derive(Debug)]
pub struct WaitGroup {
    count: Mutex<usize>,
    zero: Condvar,
}

impl WaitGroup {
    /// Create a group with a zero counter.
    pub fn new() -> Self {
        Self {
            count: Mutex::new(0),
            zero: Condvar::new(),
        }
    }

    /// Add `delta` units of outstanding work.
    pub fn add(&self, delta: usize) {
        *self.count.lock().unwrap() += delta;
    }

    /// Mark one unit done, waking waiters when the counter reaches zero.
    pub fn done(&self) {
        let mut count = self.count.lock().unwrap();
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.zero.notify_all();
        }
    }

    /// Block until the counter is zero.
    pub fn wait(&self) {
        let mut count = self.count.lock().unwrap();
        while *count > 0 {
            count = self.zero.wait(count).unwrap();
        }
    }
}

impl Default for WaitGroup {
    fn default() -> Self {
        Self::new()
    }
}
