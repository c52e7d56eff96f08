//! First-to-settle racing.

use crate::error::SetupError;
use crate::promise::Promise;
use crossbeam_channel::bounded;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Return the first of `promises` to settle, fully completed.
///
/// Each contender gets a settle observer; the first to fire publishes its
/// index into a single-slot channel, guarded by a one-shot flag so exactly
/// one publish ever happens no matter how many contenders settle
/// concurrently. The call then blocks until the winner's whole execution
/// (chain, hooks) has completed and returns its handle.
///
/// Recovery counts as settling, so a field of all-faulting contenders
/// still produces a winner. A contender that already settled wins
/// immediately at subscription. Losers are untouched: they keep running
/// and complete with their own hooks.
///
/// An empty field is [`SetupError::NoContenders`]. A field whose
/// contenders all complete without ever settling never produces a winner,
/// and this call blocks indefinitely - the same contract as waiting on a
/// producer that never settles.
///
/// # Example
///
/// ```rust
/// use vow::{future_deferred, race, Value};
/// use std::time::Duration;
///
/// let (slow_start, slow) = future_deferred(|resolve, _reject| {
///     std::thread::sleep(Duration::from_millis(50));
///     resolve.call(1i64);
/// });
/// let (fast_start, fast) = future_deferred(|resolve, _reject| {
///     resolve.call(2i64);
/// });
/// slow_start.start(true);
/// fast_start.start(true);
///
/// let winner = race([slow.clone(), fast]).unwrap();
/// assert_eq!(winner.results(), vec![Value::Int(2)]);
///
/// slow.wait(); // the loser ran on
/// assert_eq!(slow.results(), vec![Value::Int(1)]);
/// ```
pub fn race(promises: impl IntoIterator<Item = Promise>) -> Result<Promise, SetupError> {
    let contenders: Vec<Promise> = promises.into_iter().collect();
    if contenders.is_empty() {
        return Err(SetupError::NoContenders);
    }

    let (tx, rx) = bounded::<usize>(1);
    let published = Arc::new(Mutex::new(false));
    for (index, contender) in contenders.iter().enumerate() {
        let tx = tx.clone();
        let published = Arc::clone(&published);
        contender.subscribe_settled(Box::new(move || {
            let mut published = published.lock().unwrap();
            if !*published {
                *published = true;
                debug!(winner = index, "race settled");
                let _ = tx.send(index); // capacity 1, only ever one send
            }
        }));
    }

    // `tx` outlives the recv, so the channel cannot disconnect first.
    let index = rx.recv().expect("race channel closed before a settle");
    let winner = contenders[index].clone();
    winner.wait();
    Ok(winner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::{future, future_deferred};
    use crate::promise::State;
    use crate::value::Value;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_fastest_contender_wins() {
        let (slow_start, slow) = future_deferred(|resolve, _reject| {
            thread::sleep(Duration::from_millis(60));
            resolve.call("slow");
        });
        let (fast_start, fast) = future_deferred(|resolve, _reject| {
            resolve.call("fast");
        });
        slow_start.start(true);
        fast_start.start(true);

        let winner = race([slow.clone(), fast]).unwrap();
        assert_eq!(winner.results(), vec![Value::Str("fast".into())]);

        slow.wait();
        assert_eq!(slow.results(), vec![Value::Str("slow".into())]);
    }

    #[test]
    fn test_already_settled_contender_wins_at_subscription() {
        let done = future(|resolve, _reject| {
            resolve.call(9i64);
        });
        done.wait();
        let (pending_start, pending) = future_deferred(|resolve, _reject| {
            thread::sleep(Duration::from_millis(30));
            resolve.call(0i64);
        });
        pending_start.start(true);

        let winner = race([done, pending.clone()]).unwrap();
        assert_eq!(winner.results(), vec![Value::Int(9)]);
        pending.wait();
    }

    #[test]
    fn test_rejection_settles_a_race_too() {
        let rejected = future(|_resolve, reject| {
            reject.call("no");
        });
        let winner = race([rejected]).unwrap();
        assert_eq!(winner.state(), State::Rejected);
        assert_eq!(winner.results(), vec![Value::Str("no".into())]);
    }

    #[test]
    fn test_all_faulting_contenders_still_produce_a_winner() {
        let first = future(|_resolve, _reject| panic!("a"));
        let second = future(|_resolve, _reject| panic!("b"));
        let winner = race([first, second]).unwrap();
        assert_eq!(winner.state(), State::Recovered);
    }

    #[test]
    fn test_empty_field_is_a_setup_error() {
        assert!(matches!(race([]), Err(SetupError::NoContenders)));
    }

    #[test]
    fn test_winner_is_fully_completed_when_returned() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let finished = Arc::new(AtomicUsize::new(0));
        let (starter, promise) = future_deferred(|resolve, _reject| {
            resolve.call(1i64);
        });
        let finally_finished = Arc::clone(&finished);
        promise
            .set_finally(move |_state, _results| {
                finally_finished.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        starter.start(true);
        let winner = race([promise]).unwrap();
        assert_eq!(finished.load(Ordering::SeqCst), 1);
        assert_eq!(winner.state(), State::Resolved);
    }
}
