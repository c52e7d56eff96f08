use std::sync::{Arc, Mutex};
use vow::{Pass, State, Value, future_deferred};

#[test]
fn test_resolve_chain_flows_to_last_output() {
    // 1. Producer resolves a single string
    let (starter, promise) = future_deferred(|resolve, _reject| {
        resolve.call("A");
    });

    // 2. Two growing handlers on the success branch
    promise.then(|s: String| format!("{s}B"), Pass).unwrap();
    promise.then(|s: String| format!("{s}C"), Pass).unwrap();

    // 3. Inline start settles everything before returning
    starter.start(false);

    assert_eq!(promise.state(), State::Resolved);
    assert_eq!(promise.results(), vec![Value::Str("ABC".into())]);
}

#[test]
fn test_results_are_the_last_handlers_outputs() {
    let (starter, promise) = future_deferred(|resolve, _reject| {
        resolve.call("A");
    });
    promise.then(|_prev: String| "B", Pass).unwrap();
    promise.then(|_prev: String| "C", Pass).unwrap();
    starter.start(false);

    // Intermediate outputs are piped, not accumulated; only "C" is stored.
    assert_eq!(promise.results(), vec![Value::Str("C".into())]);
}

#[test]
fn test_reject_chain_masks_and_fans_out() {
    let (starter, promise) = future_deferred(|_resolve, reject| {
        reject.call("reason");
    });

    // The failure handler wants an int; the string argument is masked to 0
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_in = Arc::clone(&seen);
    promise
        .then(Pass, move |code: i64| {
            seen_in.lock().unwrap().push(code);
            ("x", "y")
        })
        .unwrap();

    starter.start(false);

    assert_eq!(promise.state(), State::Rejected);
    assert_eq!(*seen.lock().unwrap(), vec![0i64]);
    assert_eq!(
        promise.results(),
        vec![Value::Str("x".into()), Value::Str("y".into())]
    );
}

#[test]
fn test_bridge_echo_is_fitted_to_first_handler() {
    let echo = Arc::new(Mutex::new(Vec::new()));
    let echo_in = Arc::clone(&echo);
    let (starter, promise) = future_deferred(move |resolve, _reject| {
        let back = resolve.call("go");
        echo_in.lock().unwrap().extend(back);
    });

    promise.then(|_: String| 1i64, Pass).unwrap();
    promise.then(|n: i64| (n, n + 1), Pass).unwrap();
    starter.start(false);

    // Stored results are the last handler's raw outputs
    assert_eq!(promise.results(), vec![Value::Int(1), Value::Int(2)]);
    // The producer's echo is those results refitted to the first handler's returns
    assert_eq!(*echo.lock().unwrap(), vec![Value::Int(1)]);
}

#[test]
fn test_surplus_dropped_and_missing_masked_through_a_chain() {
    let (starter, promise) = future_deferred(|resolve, _reject| {
        resolve.call((1i64, 2i64, 3i64));
    });

    // First handler takes one of three produced values
    promise.then(|a: i64| a * 10, Pass).unwrap();
    // Second handler wants a bool that nobody produced; it gets false
    promise
        .then(|a: i64, b: bool| if b { a } else { -a }, Pass)
        .unwrap();

    starter.start(false);

    assert_eq!(promise.results(), vec![Value::Int(-10)]);
}

#[test]
fn test_unrepresentable_int_masks_instead_of_wrapping() {
    let (starter, promise) = future_deferred(|resolve, _reject| {
        resolve.call(5_000_000_000i64);
    });
    promise.then(|v: i32| i64::from(v), Pass).unwrap();
    starter.start(false);

    // Too big for the handler's parameter type; masked, never wrapped.
    assert_eq!(promise.results(), vec![Value::Int(0)]);
}

#[test]
fn test_empty_chain_passes_values_through() {
    let (starter, promise) = future_deferred(|resolve, _reject| {
        resolve.call((true, "ok"));
    });
    starter.start(false);

    assert_eq!(promise.state(), State::Resolved);
    assert_eq!(
        promise.results(),
        vec![Value::Bool(true), Value::Str("ok".into())]
    );
}

#[test]
fn test_single_branch_registration() {
    let (starter, promise) = future_deferred(|_resolve, reject| {
        reject.call(404i64);
    });

    promise.on_success(|v: i64| v).unwrap();
    promise.on_fail(|code: i64| format!("error {code}")).unwrap();
    starter.start(false);

    assert_eq!(promise.state(), State::Rejected);
    assert_eq!(promise.results(), vec![Value::Str("error 404".into())]);
}

#[test]
fn test_bytes_and_floats_flow_untouched() {
    let (starter, promise) = future_deferred(|resolve, _reject| {
        resolve.call((vec![1u8, 2u8], 0.5f64));
    });

    promise
        .then(
            |data: Vec<u8>, scale: f64| (data.len() as i64, scale * 2.0),
            Pass,
        )
        .unwrap();
    starter.start(false);

    assert_eq!(promise.results(), vec![Value::Int(2), Value::Float(1.0)]);
}
