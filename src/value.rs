//! Tagged runtime values and their conversions.
//!
//! Every datum that flows between a producer and a handler chain travels as a
//! [`Value`]: a small enum carrying one of a closed set of shapes, each
//! identified by a [`Tag`]. Adaptation between neighboring handler signatures
//! compares tags, never Rust types, so handlers with different signatures can
//! be chained without any of them knowing about the others.
//!
//! Three conversion traits sit at the boundary between concrete Rust types
//! and the tagged representation:
//!
//! - [`IntoValue`] / [`FromValue`] - one scalar in or out, with the static
//!   tag the type occupies in a signature
//! - [`IntoValues`] - an argument pack (what a producer passes to a bridge)
//! - [`IntoOutputs`] - a handler's declared return shape (nothing, one
//!   scalar, or a tuple of up to four)
//!
//! Conversions out of the tagged form are total: a value of an unexpected
//! tag, or one a narrower type cannot represent, converts to the type's
//! default, the same masking rule the adapter applies to whole lists.

use std::fmt;

// ============================================================================
// Tags
// ============================================================================

/// Runtime type tag carried by every [`Value`].
///
/// The set is closed: a signature position is always exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    /// Boolean.
    Bool,
    /// 64-bit signed integer; narrower integers widen on entry.
    Int,
    /// 64-bit float; `f32` widens on entry.
    Float,
    /// UTF-8 string.
    Str,
    /// Raw byte buffer.
    Bytes,
    /// List of tagged values.
    List,
}

impl Tag {
    /// The masking default for this tag: `false`, zero, or empty.
    pub fn default_value(self) -> Value {
        match self {
            Tag::Bool => Value::Bool(false),
            Tag::Int => Value::Int(0),
            Tag::Float => Value::Float(0.0),
            Tag::Str => Value::Str(String::new()),
            Tag::Bytes => Value::Bytes(Vec::new()),
            Tag::List => Value::List(Vec::new()),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tag::Bool => "bool",
            Tag::Int => "int",
            Tag::Float => "float",
            Tag::Str => "str",
            Tag::Bytes => "bytes",
            Tag::List => "list",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Values
// ============================================================================

/// A tagged datum flowing through handler chains.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A boolean.
    Bool(bool),
    /// A 64-bit signed integer.
    Int(i64),
    /// A 64-bit float.
    Float(f64),
    /// A UTF-8 string.
    Str(String),
    /// A raw byte buffer.
    Bytes(Vec<u8>),
    /// A list of tagged values.
    List(Vec<Value>),
}

impl Value {
    /// The tag this value carries.
    pub fn tag(&self) -> Tag {
        match self {
            Value::Bool(_) => Tag::Bool,
            Value::Int(_) => Tag::Int,
            Value::Float(_) => Tag::Float,
            Value::Str(_) => Tag::Str,
            Value::Bytes(_) => Tag::Bytes,
            Value::List(_) => Tag::List,
        }
    }
}

// ============================================================================
// Scalar conversions
// ============================================================================

/// Conversion of a concrete Rust type into its tagged representation.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot flow through a handler chain",
    label = "not a tagged-convertible type",
    note = "Supported types: bool, i32, i64, f32, f64, String, &str, Vec<u8>, Vec<Value>."
)]
pub trait IntoValue {
    /// The tag every converted value carries.
    const TAG: Tag;

    /// Wrap `self` in its tagged representation.
    fn into_value(self) -> Value;
}

/// Conversion from a tagged [`Value`] back into a concrete Rust type.
///
/// Total: a value of an unexpected tag converts to the type's default
/// instead of failing. Narrowing extraction follows the same rule: an
/// out-of-range value masks to the default, never wraps.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be extracted from a tagged value",
    label = "not a tagged-convertible type",
    note = "Supported types: bool, i32, i64, f32, f64, String, Vec<u8>, Vec<Value>."
)]
pub trait FromValue: Sized {
    /// The tag this type extracts from.
    const TAG: Tag;

    /// Unwrap a tagged value; an unexpected tag yields the default.
    fn from_value(value: Value) -> Self;
}

impl IntoValue for bool {
    const TAG: Tag = Tag::Bool;

    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl FromValue for bool {
    const TAG: Tag = Tag::Bool;

    fn from_value(value: Value) -> Self {
        match value {
            Value::Bool(v) => v,
            _ => false,
        }
    }
}

impl IntoValue for i64 {
    const TAG: Tag = Tag::Int;

    fn into_value(self) -> Value {
        Value::Int(self)
    }
}

impl FromValue for i64 {
    const TAG: Tag = Tag::Int;

    fn from_value(value: Value) -> Self {
        match value {
            Value::Int(v) => v,
            _ => 0,
        }
    }
}

impl IntoValue for i32 {
    const TAG: Tag = Tag::Int;

    fn into_value(self) -> Value {
        Value::Int(i64::from(self))
    }
}

impl FromValue for i32 {
    const TAG: Tag = Tag::Int;

    fn from_value(value: Value) -> Self {
        match value {
            Value::Int(v) => i32::try_from(v).unwrap_or(0),
            _ => 0,
        }
    }
}

impl IntoValue for f64 {
    const TAG: Tag = Tag::Float;

    fn into_value(self) -> Value {
        Value::Float(self)
    }
}

impl FromValue for f64 {
    const TAG: Tag = Tag::Float;

    fn from_value(value: Value) -> Self {
        match value {
            Value::Float(v) => v,
            _ => 0.0,
        }
    }
}

impl IntoValue for f32 {
    const TAG: Tag = Tag::Float;

    fn into_value(self) -> Value {
        Value::Float(f64::from(self))
    }
}

impl FromValue for f32 {
    const TAG: Tag = Tag::Float;

    fn from_value(value: Value) -> Self {
        match value {
            // A finite value beyond f32 range is unrepresentable and masks;
            // precision rounding and inf/NaN pass through.
            Value::Float(v) if v.is_finite() && v.abs() > f64::from(f32::MAX) => 0.0,
            Value::Float(v) => v as f32,
            _ => 0.0,
        }
    }
}

impl IntoValue for String {
    const TAG: Tag = Tag::Str;

    fn into_value(self) -> Value {
        Value::Str(self)
    }
}

impl FromValue for String {
    const TAG: Tag = Tag::Str;

    fn from_value(value: Value) -> Self {
        match value {
            Value::Str(v) => v,
            _ => String::new(),
        }
    }
}

impl IntoValue for &str {
    const TAG: Tag = Tag::Str;

    fn into_value(self) -> Value {
        Value::Str(self.to_owned())
    }
}

impl IntoValue for Vec<u8> {
    const TAG: Tag = Tag::Bytes;

    fn into_value(self) -> Value {
        Value::Bytes(self)
    }
}

impl FromValue for Vec<u8> {
    const TAG: Tag = Tag::Bytes;

    fn from_value(value: Value) -> Self {
        match value {
            Value::Bytes(v) => v,
            _ => Vec::new(),
        }
    }
}

impl IntoValue for Vec<Value> {
    const TAG: Tag = Tag::List;

    fn into_value(self) -> Value {
        Value::List(self)
    }
}

impl FromValue for Vec<Value> {
    const TAG: Tag = Tag::List;

    fn from_value(value: Value) -> Self {
        match value {
            Value::List(v) => v,
            _ => Vec::new(),
        }
    }
}

// ============================================================================
// Argument packs
// ============================================================================

/// An argument pack convertible into a value list.
///
/// This is what a producer hands to [`Bridge::call`](crate::Bridge::call):
/// a single tagged-convertible scalar, a tuple of up to four, a raw
/// [`Value`], or an already-assembled `Vec<Value>`. `()` is the empty pack.
///
/// Note the `Vec` asymmetry: `Vec<Value>` converts as the whole pack (one
/// value per element), while a single list *argument* is written as the
/// one-element tuple `(list,)`.
pub trait IntoValues {
    /// Convert the pack into its tagged representation.
    fn into_values(self) -> Vec<Value>;
}

impl IntoValues for () {
    fn into_values(self) -> Vec<Value> {
        Vec::new()
    }
}

impl IntoValues for Value {
    fn into_values(self) -> Vec<Value> {
        vec![self]
    }
}

impl IntoValues for Vec<Value> {
    fn into_values(self) -> Vec<Value> {
        self
    }
}

/// Implements `IntoValues` for a single bare scalar.
macro_rules! impl_into_values_scalar {
    ($($ty:ty),+ $(,)?) => {$(
        impl IntoValues for $ty {
            fn into_values(self) -> Vec<Value> {
                vec![self.into_value()]
            }
        }
    )+};
}

impl_into_values_scalar!(bool, i32, i64, f32, f64, String, &str, Vec<u8>);

/// Implements `IntoValues` for tuples of scalars.
macro_rules! impl_into_values_tuple {
    ($($T:ident),+) => {
        impl<$($T: IntoValue),+> IntoValues for ($($T,)+) {
            #[allow(non_snake_case)]
            fn into_values(self) -> Vec<Value> {
                let ($($T,)+) = self;
                vec![$($T.into_value()),+]
            }
        }
    };
}

impl_into_values_tuple!(T1);
impl_into_values_tuple!(T1, T2);
impl_into_values_tuple!(T1, T2, T3);
impl_into_values_tuple!(T1, T2, T3, T4);

// ============================================================================
// Handler outputs
// ============================================================================

/// A handler's declared return shape.
///
/// Unlike [`IntoValues`], every implementation knows its tags statically -
/// the tags become the return half of the handler's captured signature.
/// Implemented for `()` (no outputs), each tagged-convertible scalar, and
/// tuples of two to four scalars (a tuple is several outputs, not one).
pub trait IntoOutputs {
    /// Tags of the outputs, in order.
    fn tags() -> Vec<Tag>;

    /// Convert into the output value list.
    fn into_outputs(self) -> Vec<Value>;
}

impl IntoOutputs for () {
    fn tags() -> Vec<Tag> {
        Vec::new()
    }

    fn into_outputs(self) -> Vec<Value> {
        Vec::new()
    }
}

/// Implements `IntoOutputs` for a single bare scalar.
macro_rules! impl_into_outputs_scalar {
    ($($ty:ty),+ $(,)?) => {$(
        impl IntoOutputs for $ty {
            fn tags() -> Vec<Tag> {
                vec![<$ty as IntoValue>::TAG]
            }

            fn into_outputs(self) -> Vec<Value> {
                vec![self.into_value()]
            }
        }
    )+};
}

impl_into_outputs_scalar!(bool, i32, i64, f32, f64, String, &'static str, Vec<u8>, Vec<Value>);

/// Implements `IntoOutputs` for multi-output tuples.
macro_rules! impl_into_outputs_tuple {
    ($($T:ident),+) => {
        impl<$($T: IntoValue),+> IntoOutputs for ($($T,)+) {
            fn tags() -> Vec<Tag> {
                vec![$($T::TAG),+]
            }

            #[allow(non_snake_case)]
            fn into_outputs(self) -> Vec<Value> {
                let ($($T,)+) = self;
                vec![$($T.into_value()),+]
            }
        }
    };
}

impl_into_outputs_tuple!(T1, T2);
impl_into_outputs_tuple!(T1, T2, T3);
impl_into_outputs_tuple!(T1, T2, T3, T4);
