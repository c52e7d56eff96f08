//! Positional coercion of value lists onto a target shape.
//!
//! [`fit`] is the single adaptation rule the whole crate runs on: between the
//! producer's arguments and the first handler, between neighboring handlers
//! in a chain, and between the last handler and the bridge's return shape.
//! It never fails - anything that does not line up is masked with the target
//! tag's default. Masking is silent at the value level; every coercion is
//! reported as a TRACE event so a subscriber can surface shape drift without
//! changing behavior.

use crate::value::{Tag, Value};
use tracing::trace;

/// Adapt `source` to the positional shape `target`.
///
/// Position by position: a source value whose tag equals the target tag is
/// kept; a mismatched or missing position becomes the target tag's default;
/// surplus source values are dropped. The result always has exactly
/// `target.len()` values with exactly the target tags.
///
/// # Example
///
/// ```rust
/// use vow::{fit, Tag, Value};
///
/// let fitted = fit(
///     &[Tag::Str, Tag::Int],
///     vec![Value::Str("keep".into()), Value::Str("mask".into()), Value::Bool(true)],
/// );
/// assert_eq!(fitted, vec![Value::Str("keep".into()), Value::Int(0)]);
/// ```
pub fn fit(target: &[Tag], source: Vec<Value>) -> Vec<Value> {
    let surplus = source.len().saturating_sub(target.len());
    if surplus > 0 {
        trace!(surplus, "dropping surplus values");
    }
    let mut source = source.into_iter();
    target
        .iter()
        .map(|&tag| match source.next() {
            Some(value) if value.tag() == tag => value,
            Some(value) => {
                trace!(expected = %tag, found = %value.tag(), "masking mismatched value");
                tag.default_value()
            }
            None => {
                trace!(expected = %tag, "filling missing position");
                tag.default_value()
            }
        })
        .collect()
}
