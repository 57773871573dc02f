//! # valcast
//!
//! Deterministic conversion of dynamically typed values into typed scalars,
//! containers and canonical trees.
//!
//! ## Features
//! - A dynamic [`Value`] that any serde decoder can produce, including
//!   indirection (`Ptr`) resolved before every conversion
//! - Conversion to `String`, `bool`, every integer width, `f32`, `f64`,
//!   instants (`DateTime<FixedOffset>`) and signed durations (`TimeDelta`)
//! - Range-checked narrowing: out-of-range input fails with
//!   [`ErrorKind::Overflow`], never wraps
//! - Sequence and map conversion with element paths in errors
//! - Normalization of maps with arbitrary keys into string-keyed
//!   [`Canonical`] trees that encode losslessly as JSON
//!
//! Each target comes in three forms: `to_e` returns the error, `to` returns
//! the type's zero value on failure and `must_to` panics.
//!
//! ## Example
//! ```rust
//! use valcast::{ErrorKind, Value};
//!
//! let value: Value = serde_json::from_str(r#"{"port": "8080", "ids": ["1", "2", "x"]}"#).unwrap();
//!
//! let port = valcast::to_u16_e(value.get("port").unwrap()).unwrap();
//! assert_eq!(port, 8080);
//!
//! let err = valcast::to_vec_e::<i64>(value.get("ids").unwrap()).unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::InvalidSyntax);
//! assert_eq!(err.to_string(), r#"unable to cast "x" of kind string to i64 at [2]: invalid digit found in string"#);
//!
//! assert_eq!(valcast::to::<u8>(&Value::from("300")), 0);
//! ```

use std::fmt;

use chrono::{DateTime, FixedOffset, TimeDelta};

mod canonical;
mod cast;
mod container;
mod error;
mod options;
mod time;
mod value;

pub use canonical::{
    Canonical, normalize, normalize_with, to_json, to_json_string, to_json_string_with,
    to_json_with,
};
pub use cast::{Cast, Target, repr};
pub use container::{
    MapKey, to_map, to_map_e, to_map_with, to_string_map, to_string_map_e,
    to_string_map_string_slice, to_string_map_string_slice_e, to_string_map_string_slice_with,
    to_string_map_with, to_values, to_values_e, to_values_with, to_vec, to_vec_e, to_vec_with,
};
pub use error::{CastError, Error, ErrorKind, Result, Segment};
pub use options::{DEFAULT_MAX_DEPTH, EpochUnit, Options};
pub use time::{
    DurationError, InstantError, TimeLayout, default_layouts, format_duration, parse_duration,
};
pub use value::{Kind, Number, Value};

/// Converts a value with the default [`Options`].
pub fn to_e<T: Cast>(value: &Value) -> Result<T> {
    T::cast(value, Options::global())
}

pub fn to_with<T: Cast>(value: &Value, options: &Options) -> Result<T> {
    T::cast(value, options)
}

/// Best-effort conversion; the target's zero value on failure.
pub fn to<T: Cast>(value: &Value) -> T {
    to_e(value).unwrap_or_else(|_| T::zero())
}

/// Converts or panics with the error message.
pub fn must_to<T: Cast>(value: &Value) -> T {
    must(to_e(value))
}

/// Unwraps any conversion result, panicking with the error message.
///
/// ```should_panic
/// let ports: Vec<u16> = valcast::must(valcast::to_vec_e(&valcast::Value::from(vec![-1])));
/// ```
pub fn must<T, E: fmt::Display>(result: std::result::Result<T, E>) -> T {
    match result {
        Ok(v) => v,
        Err(e) => panic!("{e}"),
    }
}

macro_rules! named_conversions {
    ($($name:ident, $name_e:ident => $ty:ty;)*) => {
        $(
            #[doc = concat!("Best-effort conversion to `", stringify!($ty), "`.")]
            pub fn $name(value: &Value) -> $ty {
                to(value)
            }

            #[doc = concat!("Converts a value to `", stringify!($ty), "`.")]
            pub fn $name_e(value: &Value) -> Result<$ty> {
                to_e(value)
            }
        )*
    };
}

named_conversions! {
    to_string, to_string_e => String;
    to_bool, to_bool_e => bool;
    to_i8, to_i8_e => i8;
    to_i16, to_i16_e => i16;
    to_i32, to_i32_e => i32;
    to_i64, to_i64_e => i64;
    to_isize, to_isize_e => isize;
    to_u8, to_u8_e => u8;
    to_u16, to_u16_e => u16;
    to_u32, to_u32_e => u32;
    to_u64, to_u64_e => u64;
    to_usize, to_usize_e => usize;
    to_f32, to_f32_e => f32;
    to_f64, to_f64_e => f64;
    to_time, to_time_e => DateTime<FixedOffset>;
    to_duration, to_duration_e => TimeDelta;
}

/// Converts a value to an instant, reading zone-less text in `offset`.
pub fn to_time_in_offset_e(value: &Value, offset: FixedOffset) -> Result<DateTime<FixedOffset>> {
    let options = Options::global().clone().with_default_offset(offset);
    DateTime::<FixedOffset>::cast(value, &options)
}

pub fn to_time_in_offset(value: &Value, offset: FixedOffset) -> DateTime<FixedOffset> {
    to_time_in_offset_e(value, offset).unwrap_or_else(|_| DateTime::<FixedOffset>::zero())
}
