//! # vow
//!
//! Settle-once promises over tagged-value handler chains.
//!
//! `vow` is an in-process future/promise primitive. A producer runs on its
//! own thread (or inline), reports its outcome through a resolve or reject
//! bridge, and the first report wins: the promise settles exactly once and
//! every later report is absorbed without effect. Handlers of arbitrary
//! typed signatures attach to either branch and are fed through positional
//! coercion, so a producer and its consumers never have to agree on exact
//! arity to interoperate.
//!
//! # Quick Start
//!
//! ```rust
//! use vow::{Pass, State, Value, future_deferred};
//!
//! let (starter, order) = future_deferred(|resolve, _reject| {
//!     resolve.call(("latte", 2i64));
//! });
//! order
//!     .then(|drink: String, qty: i64| format!("{qty} x {drink}"), Pass)
//!     .unwrap();
//! starter.start(false);
//!
//! assert_eq!(order.state(), State::Resolved);
//! assert_eq!(order.results(), vec![Value::Str("2 x latte".into())]);
//! ```
//!
//! # Four-Layer Architecture
//!
//! The crate is built in four layers, each consuming only the one below it:
//!
//! ## Layer 1: Value Currency ([`Value`])
//!
//! A closed set of tagged scalars that every boundary in the crate speaks.
//! Producers pack native values in, handlers unpack them back out.
//!
//! - **Closed**: Six tags ([`Tag`]), each with a canonical default
//! - **Total**: Unpacking never fails; a wrong tag yields the default
//! - **Uniform**: Bridges, chains, and hooks all trade in `Vec<Value>`
//!
//! ## Layer 2: Signature Fitting ([`fit`])
//!
//! Positional coercion between a value row and a target tag row. Matching
//! positions pass through, mismatched or missing positions are masked with
//! tag defaults, surplus positions are dropped.
//!
//! - **Silent**: Shape differences are absorbed, never surfaced as errors
//! - **Observable**: Every masked or dropped position emits a trace event
//!
//! ## Layer 3: Handler Chains ([`IntoHandler`])
//!
//! Plain closures over native parameter types, erased into uniform chain
//! entries. Each entry's output row is fitted to the next entry's parameter
//! row, so heterogeneous signatures compose without glue code.
//!
//! - **Typed**: Signatures are recorded as tag rows at registration
//! - **Flowing**: Values stream entry to entry through [`fit`]
//! - **Optional tail**: [`Pass`] registers a branch with no handler
//!
//! ## Layer 4: Lifecycle ([`Promise`])
//!
//! The settle-once state machine plus everything that drives it: producer
//! invocation ([`future`], [`future_deferred`]), panic recovery into the
//! [`State::Recovered`] terminal, catch/finally hooks, and first-to-settle
//! racing ([`race`]).
//!
//! - **Write-once**: The first settle fixes the state; recovery may supersede it
//! - **Contained**: A producer or handler panic becomes a [`Fault`], not a crash
//! - **Exactly-once hooks**: Catch fires per recovery, finally per completion
//!
//! # Error Types
//!
//! - [`SetupError`] - Rejected registration calls (frozen promise, empty race)
//! - [`Fault`] - A captured panic, delivered to the catch hook

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod adapter;
mod chain;
mod error;
mod exec;
mod promise;
mod race;
mod sync;
mod value;

// Re-exports
pub use adapter::fit;
pub use chain::{HandlerEntry, IntoHandler, MaybeHandler, Pass, Signature};
pub use error::{Fault, SetupError};
pub use exec::{Starter, future, future_deferred};
pub use promise::{Bridge, Promise, State};
pub use race::race;
pub use value::{FromValue, IntoOutputs, IntoValue, IntoValues, Tag, Value};
