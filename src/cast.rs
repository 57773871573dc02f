//! Scalar and numeric conversion rules.
//!
//! Every supported target type implements the sealed [`Cast`] trait once.
//! Input is resolved through indirection first, then matched on its dynamic
//! kind; the first applicable rule wins.

use std::fmt;
use std::num::{IntErrorKind, ParseFloatError, TryFromIntError};
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, TimeDelta, Utc};

use crate::error::{CastError, ErrorKind, Result};
use crate::options::Options;
use crate::time::{
    DurationError, InstantError, format_duration, from_epoch, parse_duration, parse_instant,
    total_nanos,
};
use crate::value::Value;

/// The type a conversion produces, as reported in errors.
///
/// Scalar variants name the closed set of [`Cast`] targets; the remaining
/// variants describe container conversions and normalization.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    String,
    Bool,
    I8,
    I16,
    I32,
    I64,
    Isize,
    U8,
    U16,
    U32,
    U64,
    Usize,
    F32,
    F64,
    Instant,
    Duration,
    /// Untyped element, kept as a [`Value`]
    Value,
    /// String-keyed tree produced by normalization
    Canonical,
    Seq(Box<Target>),
    Map(Box<Target>, Box<Target>),
}

impl Target {
    pub fn seq(element: Target) -> Self {
        Target::Seq(Box::new(element))
    }

    pub fn map(key: Target, value: Target) -> Self {
        Target::Map(Box::new(key), Box::new(value))
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Target::String => f.write_str("String"),
            Target::Bool => f.write_str("bool"),
            Target::I8 => f.write_str("i8"),
            Target::I16 => f.write_str("i16"),
            Target::I32 => f.write_str("i32"),
            Target::I64 => f.write_str("i64"),
            Target::Isize => f.write_str("isize"),
            Target::U8 => f.write_str("u8"),
            Target::U16 => f.write_str("u16"),
            Target::U32 => f.write_str("u32"),
            Target::U64 => f.write_str("u64"),
            Target::Usize => f.write_str("usize"),
            Target::F32 => f.write_str("f32"),
            Target::F64 => f.write_str("f64"),
            Target::Instant => f.write_str("DateTime<FixedOffset>"),
            Target::Duration => f.write_str("TimeDelta"),
            Target::Value => f.write_str("Value"),
            Target::Canonical => f.write_str("Canonical"),
            Target::Seq(element) => write!(f, "Vec<{element}>"),
            Target::Map(key, value) => write!(f, "HashMap<{key}, {value}>"),
        }
    }
}

mod private {
    pub trait Sealed {}
}

/// A type values can be converted to.
///
/// Implemented for `String`, `bool`, every integer width, `f32`, `f64`,
/// `DateTime<FixedOffset>` and `TimeDelta`. The set is closed.
pub trait Cast: Sized + private::Sealed {
    /// Descriptor reported in errors
    fn target() -> Target;

    /// Value returned by best-effort conversions on failure
    fn zero() -> Self;

    /// Resolves indirection, then applies this type's conversion rules.
    fn cast(value: &Value, options: &Options) -> Result<Self> {
        let (resolved, _) = value.resolve();
        log::trace!("cast {} to {}", resolved.kind(), Self::target());
        Self::cast_resolved(resolved, options)
    }

    #[doc(hidden)]
    fn cast_resolved(value: &Value, options: &Options) -> Result<Self>;
}

impl Value {
    /// Converts this value with the default [`Options`].
    pub fn cast<T: Cast>(&self) -> Result<T> {
        T::cast(self, Options::global())
    }
}

enum Numeric {
    Int(i128),
    Float(f64),
}

fn numeric(value: &Value) -> Option<Numeric> {
    Some(match value {
        Value::I8(v) => Numeric::Int(i128::from(*v)),
        Value::I16(v) => Numeric::Int(i128::from(*v)),
        Value::I32(v) => Numeric::Int(i128::from(*v)),
        Value::I64(v) => Numeric::Int(i128::from(*v)),
        Value::Isize(v) => Numeric::Int(*v as i128),
        Value::U8(v) => Numeric::Int(i128::from(*v)),
        Value::U16(v) => Numeric::Int(i128::from(*v)),
        Value::U32(v) => Numeric::Int(i128::from(*v)),
        Value::U64(v) => Numeric::Int(i128::from(*v)),
        Value::Usize(v) => Numeric::Int(*v as i128),
        Value::F16(v) => Numeric::Float(v.to_f64()),
        Value::F32(v) => Numeric::Float(f64::from(*v)),
        Value::F64(v) => Numeric::Float(*v),
        _ => return None,
    })
}

/// Exact decimal text of a numeric leaf.
pub(crate) fn number_text(value: &Value) -> Option<String> {
    Some(match value {
        Value::Number(n) => n.as_str().to_owned(),
        Value::I8(v) => v.to_string(),
        Value::I16(v) => v.to_string(),
        Value::I32(v) => v.to_string(),
        Value::I64(v) => v.to_string(),
        Value::Isize(v) => v.to_string(),
        Value::U8(v) => v.to_string(),
        Value::U16(v) => v.to_string(),
        Value::U32(v) => v.to_string(),
        Value::U64(v) => v.to_string(),
        Value::Usize(v) => v.to_string(),
        Value::F16(v) => v.to_string(),
        Value::F32(v) => v.to_string(),
        Value::F64(v) => v.to_string(),
        _ => return None,
    })
}

// Bytes and containers have no canonical text.
fn scalar_text(value: &Value) -> Option<String> {
    if let Some(text) = number_text(value) {
        return Some(text);
    }
    Some(match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::String(s) => s.clone(),
        Value::Instant(t) => t.to_rfc3339(),
        Value::Duration(d) => format_duration(d),
        _ => return None,
    })
}

const REPR_DEPTH: usize = 32;

/// Textual representation of any value.
///
/// Scalars render as their string conversion would, containers as
/// `[a, b]` and `{k: v}`, bytes as lossy UTF-8. Never fails; nesting past
/// a fixed depth is elided as `...`.
pub fn repr(value: &Value) -> String {
    let mut out = String::new();
    write_repr(&mut out, value, 0);
    out
}

fn write_repr(out: &mut String, value: &Value, depth: usize) {
    let (value, _) = value.resolve();
    match value {
        Value::Seq(_) | Value::Map(_) if depth >= REPR_DEPTH => out.push_str("..."),
        Value::Seq(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_repr(out, item, depth + 1);
            }
            out.push(']');
        }
        Value::Map(entries) => {
            out.push('{');
            for (i, (k, v)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_repr(out, k, depth + 1);
                out.push_str(": ");
                write_repr(out, v, depth + 1);
            }
            out.push('}');
        }
        Value::Bytes(bytes) => out.push_str(&String::from_utf8_lossy(bytes)),
        other => out.push_str(&scalar_text(other).unwrap_or_default()),
    }
}

fn parse_integer(value: &Value, text: &str, target: Target) -> Result<i128> {
    text.trim().parse::<i128>().map_err(|e| {
        let kind = match e.kind() {
            IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => ErrorKind::Overflow,
            _ => ErrorKind::InvalidSyntax,
        };
        CastError::new(kind, value, target).with_source(e)
    })
}

fn parse_float<T>(value: &Value, text: &str, target: Target) -> Result<T>
where
    T: FromStr<Err = ParseFloatError>,
{
    text.trim()
        .parse::<T>()
        .map_err(|e| CastError::invalid_syntax(value, target).with_source(e))
}

// 2^127; every finite float strictly inside (-2^127, 2^127) fits an i128.
const I128_BOUND: f64 = 170_141_183_460_469_231_731_687_303_715_884_105_728.0;

fn truncate(f: f64) -> Option<i128> {
    let t = f.trunc();
    (t > -I128_BOUND && t < I128_BOUND).then_some(t as i128)
}

// Every integer target widens its input to i128, then narrows with a
// checked conversion, so range and sign checks live in one place.
fn integer<T>(value: &Value) -> Result<T>
where
    T: Cast + TryFrom<i128, Error = TryFromIntError>,
{
    let wide = match value {
        Value::Null => return Ok(T::zero()),
        Value::Bool(b) => i128::from(*b),
        Value::String(s) => parse_integer(value, s, T::target())?,
        Value::Number(n) => parse_integer(value, n.as_str(), T::target())?,
        Value::Duration(d) => total_nanos(d),
        other => match numeric(other) {
            Some(Numeric::Int(i)) => i,
            Some(Numeric::Float(f)) => {
                truncate(f).ok_or_else(|| CastError::overflow(value, T::target()))?
            }
            None => return Err(CastError::unconvertible(value, T::target())),
        },
    };
    T::try_from(wide).map_err(|e| CastError::overflow(value, T::target()).with_source(e))
}

macro_rules! impl_integer {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl private::Sealed for $ty {}

            impl Cast for $ty {
                fn target() -> Target {
                    Target::$variant
                }

                fn zero() -> Self {
                    0
                }

                fn cast_resolved(value: &Value, _options: &Options) -> Result<Self> {
                    match value {
                        Value::$variant(v) => Ok(*v),
                        _ => integer(value),
                    }
                }
            }
        )*
    };
}

impl_integer! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    usize => Usize,
}

// f64 -> f32 rounds to nearest and saturates to infinity, per IEEE 754.
macro_rules! impl_float {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl private::Sealed for $ty {}

            impl Cast for $ty {
                fn target() -> Target {
                    Target::$variant
                }

                fn zero() -> Self {
                    0.0
                }

                fn cast_resolved(value: &Value, _options: &Options) -> Result<Self> {
                    Ok(match value {
                        Value::$variant(v) => *v,
                        Value::Null => 0.0,
                        Value::Bool(b) => {
                            if *b {
                                1.0
                            } else {
                                0.0
                            }
                        }
                        Value::String(s) => parse_float(value, s, Target::$variant)?,
                        Value::Number(n) => parse_float(value, n.as_str(), Target::$variant)?,
                        Value::Duration(d) => total_nanos(d) as $ty,
                        other => match numeric(other) {
                            Some(Numeric::Int(i)) => i as $ty,
                            Some(Numeric::Float(f)) => f as $ty,
                            None => return Err(CastError::unconvertible(value, Target::$variant)),
                        },
                    })
                }
            }
        )*
    };
}

impl_float! {
    f32 => F32,
    f64 => F64,
}

impl private::Sealed for String {}

impl Cast for String {
    fn target() -> Target {
        Target::String
    }

    fn zero() -> Self {
        String::new()
    }

    fn cast_resolved(value: &Value, _options: &Options) -> Result<Self> {
        match value {
            Value::Bytes(bytes) => String::from_utf8(bytes.clone()).map_err(|e| {
                CastError::invalid_syntax(value, Target::String).with_source(e.utf8_error())
            }),
            _ => scalar_text(value).ok_or_else(|| CastError::unconvertible(value, Target::String)),
        }
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

impl private::Sealed for bool {}

impl Cast for bool {
    fn target() -> Target {
        Target::Bool
    }

    fn zero() -> Self {
        false
    }

    fn cast_resolved(value: &Value, _options: &Options) -> Result<Self> {
        Ok(match value {
            Value::Bool(b) => *b,
            Value::Null => false,
            Value::String(s) => {
                parse_bool(s).ok_or_else(|| CastError::unconvertible(value, Target::Bool))?
            }
            Value::Number(n) => parse_float::<f64>(value, n.as_str(), Target::Bool)? != 0.0,
            Value::Duration(d) => !d.is_zero(),
            other => match numeric(other) {
                Some(Numeric::Int(i)) => i != 0,
                Some(Numeric::Float(f)) => f != 0.0,
                None => return Err(CastError::unconvertible(value, Target::Bool)),
            },
        })
    }
}

impl private::Sealed for DateTime<FixedOffset> {}

impl Cast for DateTime<FixedOffset> {
    fn target() -> Target {
        Target::Instant
    }

    /// The Unix epoch in UTC
    fn zero() -> Self {
        DateTime::<Utc>::default().fixed_offset()
    }

    fn cast_resolved(value: &Value, options: &Options) -> Result<Self> {
        match value {
            Value::Instant(t) => Ok(*t),
            Value::String(s) => {
                parse_instant(s.trim(), &options.time_layouts, options.offset()).map_err(|e| {
                    let err = match e {
                        InstantError::OutOfRange => CastError::overflow(value, Target::Instant),
                        _ => CastError::invalid_syntax(value, Target::Instant),
                    };
                    err.with_source(e)
                })
            }
            v if v.is_numeric() => {
                let Some(unit) = options.epoch else {
                    return Err(CastError::unconvertible(value, Target::Instant));
                };
                let count = i64::cast_resolved(value, options)
                    .map_err(|e| e.retarget(Target::Instant))?;
                from_epoch(count, unit, options.offset())
                    .ok_or_else(|| CastError::overflow(value, Target::Instant))
            }
            _ => Err(CastError::unconvertible(value, Target::Instant)),
        }
    }
}

// Unit-less text is a count of nanoseconds, like a bare number.
fn duration_from_text(value: &Value, text: &str) -> Result<TimeDelta> {
    let text = text.trim();
    let parsed = if text.contains(char::is_alphabetic) {
        parse_duration(text)
    } else {
        parse_duration(&format!("{text}ns"))
    };
    parsed.map_err(|e| {
        let err = match e {
            DurationError::OutOfRange(_) => CastError::overflow(value, Target::Duration),
            _ => CastError::invalid_syntax(value, Target::Duration),
        };
        err.with_source(e)
    })
}

impl private::Sealed for TimeDelta {}

impl Cast for TimeDelta {
    fn target() -> Target {
        Target::Duration
    }

    fn zero() -> Self {
        TimeDelta::zero()
    }

    fn cast_resolved(value: &Value, options: &Options) -> Result<Self> {
        match value {
            Value::Duration(d) => Ok(*d),
            Value::String(s) => duration_from_text(value, s),
            v if v.is_numeric() => i64::cast_resolved(value, options)
                .map(TimeDelta::nanoseconds)
                .map_err(|e| e.retarget(Target::Duration)),
            _ => Err(CastError::unconvertible(value, Target::Duration)),
        }
    }
}
