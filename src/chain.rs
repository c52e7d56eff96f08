//! Handler entries and ordered chains.
//!
//! A consumer handler keeps its natural Rust signature. At registration it
//! is adapted once into the uniform `Vec<Value> -> Vec<Value>` interface,
//! and its declared shape is captured as a [`Signature`] of tags. The chain
//! stores these [`HandlerEntry`] pairs in registration order and, at run
//! time, pipes each entry's outputs through [`fit`] into the next entry's
//! parameter shape.
//!
//! # Handler shapes
//!
//! [`IntoHandler`] is implemented for closures (and `fn` items) of zero to
//! four parameters over tagged-convertible types, returning nothing, one
//! value, or a tuple of up to four values:
//!
//! ```rust,ignore
//! |name: String| -> i64
//! |code: i64, detail: String| -> (String, String)
//! || ()
//! ```
//!
//! Registration slots accept a handler, `Option<handler>`, or the [`Pass`]
//! sentinel; [`MaybeHandler`] resolves `Pass` and `None` to "append
//! nothing", so the slot is skipped rather than occupied by a stub.
//!
//! # Bridge signature
//!
//! The first entry appended to a chain fixes the chain's bridge signature.
//! The producer-facing return of a settle call is the chain's final output
//! adapted to that signature's return shape; a chain that never received a
//! handler has no bridge signature and runs as identity pass-through.

use crate::adapter::fit;
use crate::value::{FromValue, IntoOutputs, Tag, Value};
use std::sync::Arc;

// ============================================================================
// Signatures and entries
// ============================================================================

/// The declared shape of a handler: parameter tags and return tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    params: Vec<Tag>,
    returns: Vec<Tag>,
}

impl Signature {
    /// Parameter tags, in positional order.
    pub fn params(&self) -> &[Tag] {
        &self.params
    }

    /// Return tags, in positional order.
    pub fn returns(&self) -> &[Tag] {
        &self.returns
    }
}

/// A handler adapted into the uniform value interface, plus its captured
/// signature.
pub struct HandlerEntry {
    signature: Signature,
    call: Box<dyn Fn(Vec<Value>) -> Vec<Value> + Send + Sync>,
}

impl HandlerEntry {
    /// The shape this handler declared at registration.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Invoke the handler. The caller is responsible for fitting `args`
    /// to the entry's parameter shape first.
    pub(crate) fn invoke(&self, args: Vec<Value>) -> Vec<Value> {
        (self.call)(args)
    }
}

impl std::fmt::Debug for HandlerEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerEntry")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Registration-time adaptation
// ============================================================================

/// Adaptation of a concrete closure into a [`HandlerEntry`].
///
/// `Args` is an inference marker naming the parameter tuple; callers never
/// name it. Closures need explicit parameter type annotations
/// (`|v: i64| ...`) for the marker to resolve.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be registered as a handler",
    label = "unsupported handler shape",
    note = "Handlers take 0-4 tagged-convertible parameters and return (), one value, or a tuple of up to 4."
)]
pub trait IntoHandler<Args> {
    /// Adapt into the uniform interface, capturing the declared signature.
    fn into_handler(self) -> HandlerEntry;
}

/// A registration slot: a handler, `Option<handler>`, or [`Pass`].
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not fit a handler slot",
    label = "expected a handler, an `Option` of one, or `Pass`",
    note = "Handlers take 0-4 tagged-convertible parameters and return (), one value, or a tuple of up to 4."
)]
pub trait MaybeHandler<Args> {
    /// Resolve the slot; `None` means nothing is appended.
    fn into_entry(self) -> Option<HandlerEntry>;
}

/// The no-handler sentinel for a registration slot.
///
/// `then(ok, Pass)` registers only the success handler; the rejection slot
/// stays empty and is never invoked.
#[derive(Debug, Clone, Copy)]
pub struct Pass;

impl MaybeHandler<Pass> for Pass {
    fn into_entry(self) -> Option<HandlerEntry> {
        None
    }
}

/// Implements the handler traits for one arity.
///
/// Markers keep the impl families apart: closures use the bare parameter
/// tuple, optional closures wrap it in `Option`, and [`Pass`] uses itself.
macro_rules! impl_handler {
    () => {
        impl<F, Out> IntoHandler<()> for F
        where
            F: Fn() -> Out + Send + Sync + 'static,
            Out: IntoOutputs,
        {
            fn into_handler(self) -> HandlerEntry {
                HandlerEntry {
                    signature: Signature {
                        params: Vec::new(),
                        returns: Out::tags(),
                    },
                    call: Box::new(move |_values| (self)().into_outputs()),
                }
            }
        }

        impl<F, Out> MaybeHandler<()> for F
        where
            F: Fn() -> Out + Send + Sync + 'static,
            Out: IntoOutputs,
        {
            fn into_entry(self) -> Option<HandlerEntry> {
                Some(self.into_handler())
            }
        }

        impl<F, Out> MaybeHandler<Option<()>> for Option<F>
        where
            F: Fn() -> Out + Send + Sync + 'static,
            Out: IntoOutputs,
        {
            fn into_entry(self) -> Option<HandlerEntry> {
                self.map(IntoHandler::into_handler)
            }
        }
    };

    ($($A:ident),+) => {
        impl<F, $($A,)+ Out> IntoHandler<($($A,)+)> for F
        where
            F: Fn($($A),+) -> Out + Send + Sync + 'static,
            $($A: FromValue,)+
            Out: IntoOutputs,
        {
            #[allow(non_snake_case)]
            fn into_handler(self) -> HandlerEntry {
                HandlerEntry {
                    signature: Signature {
                        params: vec![$($A::TAG),+],
                        returns: Out::tags(),
                    },
                    call: Box::new(move |values| {
                        let mut values = values.into_iter();
                        $(
                            let $A = $A::from_value(
                                values.next().unwrap_or_else(|| $A::TAG.default_value()),
                            );
                        )+
                        (self)($($A),+).into_outputs()
                    }),
                }
            }
        }

        impl<F, $($A,)+ Out> MaybeHandler<($($A,)+)> for F
        where
            F: Fn($($A),+) -> Out + Send + Sync + 'static,
            $($A: FromValue,)+
            Out: IntoOutputs,
        {
            fn into_entry(self) -> Option<HandlerEntry> {
                Some(self.into_handler())
            }
        }

        impl<F, $($A,)+ Out> MaybeHandler<Option<($($A,)+)>> for Option<F>
        where
            F: Fn($($A),+) -> Out + Send + Sync + 'static,
            $($A: FromValue,)+
            Out: IntoOutputs,
        {
            fn into_entry(self) -> Option<HandlerEntry> {
                self.map(IntoHandler::into_handler)
            }
        }
    };
}

impl_handler!();
impl_handler!(A1);
impl_handler!(A1, A2);
impl_handler!(A1, A2, A3);
impl_handler!(A1, A2, A3, A4);

// ============================================================================
// Chains
// ============================================================================

/// An ordered, append-only handler chain for one settle branch.
pub(crate) struct HandlerChain {
    entries: Vec<Arc<HandlerEntry>>,
    bridge: Option<Signature>,
}

impl HandlerChain {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            bridge: None,
        }
    }

    /// Append an entry; the first one fixes the bridge signature.
    pub(crate) fn append(&mut self, entry: HandlerEntry) {
        if self.bridge.is_none() {
            self.bridge = Some(entry.signature.clone());
        }
        self.entries.push(Arc::new(entry));
    }

    /// Cheap copy of the current entries and bridge signature, taken under
    /// the promise lock so the run itself happens outside it.
    pub(crate) fn snapshot(&self) -> ChainSnapshot {
        ChainSnapshot {
            entries: self.entries.clone(),
            bridge: self.bridge.clone(),
        }
    }
}

/// A chain frozen at settle time.
pub(crate) struct ChainSnapshot {
    entries: Vec<Arc<HandlerEntry>>,
    bridge: Option<Signature>,
}

/// What one chain run produced.
pub(crate) struct ChainOutcome {
    /// The final entry's raw outputs; stored as the promise's results.
    pub(crate) results: Vec<Value>,
    /// The same outputs adapted to the bridge signature's return shape;
    /// handed back to the producer.
    pub(crate) bridged: Vec<Value>,
}

impl ChainSnapshot {
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Run every entry in order, fitting values between stages.
    ///
    /// An empty chain is identity pass-through: the initial values are both
    /// the results and the bridged return.
    pub(crate) fn run(&self, initial: Vec<Value>) -> ChainOutcome {
        let Some(bridge) = &self.bridge else {
            return ChainOutcome {
                results: initial.clone(),
                bridged: initial,
            };
        };
        let mut flowing = initial;
        for entry in &self.entries {
            flowing = entry.invoke(fit(entry.signature().params(), flowing));
        }
        let bridged = fit(bridge.returns(), flowing.clone());
        ChainOutcome {
            results: flowing,
            bridged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_of<H, Args>(handler: H) -> HandlerEntry
    where
        H: IntoHandler<Args>,
    {
        handler.into_handler()
    }

    #[test]
    fn test_signature_captures_params_and_returns() {
        let entry = entry_of(|_name: String, _count: i64| true);
        assert_eq!(entry.signature().params(), &[Tag::Str, Tag::Int]);
        assert_eq!(entry.signature().returns(), &[Tag::Bool]);
    }

    #[test]
    fn test_zero_arity_and_unit_return_capture_empty_shapes() {
        let entry = entry_of(|| ());
        assert_eq!(entry.signature().params(), &[]);
        assert_eq!(entry.signature().returns(), &[]);
    }

    #[test]
    fn test_tuple_returns_are_multiple_outputs() {
        let entry = entry_of(|v: i64| (v, "tail"));
        assert_eq!(entry.signature().returns(), &[Tag::Int, Tag::Str]);
        let out = entry.invoke(vec![Value::Int(4)]);
        assert_eq!(out, vec![Value::Int(4), Value::Str("tail".into())]);
    }

    #[test]
    fn test_entry_invocation_is_total_even_when_starved() {
        let entry = entry_of(|v: i64, s: String| format!("{v}:{s}"));
        // No fitting here on purpose: a short input still extracts defaults.
        let out = entry.invoke(Vec::new());
        assert_eq!(out, vec![Value::Str("0:".into())]);
    }

    #[test]
    fn test_first_append_fixes_the_bridge_signature() {
        let mut chain = HandlerChain::new();
        chain.append(entry_of(|s: String| s));
        chain.append(entry_of(|_v: i64| 0i64));
        let snapshot = chain.snapshot();
        assert_eq!(snapshot.bridge.as_ref().map(Signature::returns), Some(&[Tag::Str][..]));
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn test_pass_and_none_resolve_to_no_entry() {
        assert!(Pass.into_entry().is_none());
        let none: Option<fn(i64) -> i64> = None;
        assert!(none.into_entry().is_none());
        let some = Some(|v: i64| v + 1);
        assert!(some.into_entry().is_some());
    }

    #[test]
    fn test_run_pipes_outputs_into_the_next_stage() {
        let mut chain = HandlerChain::new();
        chain.append(entry_of(|s: String| format!("{s}b")));
        chain.append(entry_of(|s: String| format!("{s}c")));
        let outcome = chain.snapshot().run(vec![Value::Str("a".into())]);
        assert_eq!(outcome.results, vec![Value::Str("abc".into())]);
        assert_eq!(outcome.bridged, vec![Value::Str("abc".into())]);
    }

    #[test]
    fn test_run_adapts_between_mismatched_neighbors() {
        let mut chain = HandlerChain::new();
        chain.append(entry_of(|_reason: String| 8i64));
        chain.append(entry_of(|_code: i64| ("x", "y")));
        let outcome = chain.snapshot().run(vec![Value::Str("reason".into())]);
        assert_eq!(
            outcome.results,
            vec![Value::Str("x".into()), Value::Str("y".into())]
        );
        // Producer-facing return is refitted to the first handler's shape.
        assert_eq!(outcome.bridged, vec![Value::Int(0)]);
    }

    #[test]
    fn test_empty_chain_is_identity() {
        let chain = HandlerChain::new();
        let initial = vec![Value::Int(1), Value::Bool(true)];
        let outcome = chain.snapshot().run(initial.clone());
        assert_eq!(outcome.results, initial);
        assert_eq!(outcome.bridged, initial);
    }

    #[test]
    fn test_initial_values_are_fitted_to_the_first_entry() {
        let mut chain = HandlerChain::new();
        chain.append(entry_of(|v: i64| v * 2));
        // Wrong tag in, masked to 0, doubled to 0.
        let outcome = chain.snapshot().run(vec![Value::Str("seven".into())]);
        assert_eq!(outcome.results, vec![Value::Int(0)]);
    }
}
