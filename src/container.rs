//! Sequence and map conversions built on the scalar rules.
//!
//! Each element goes through [`Cast`]; the first failing element aborts the
//! whole conversion and its error is annotated with the element's position.

use std::collections::HashMap;
use std::hash::Hash;

use chrono::TimeDelta;

use crate::cast::{Cast, Target, repr};
use crate::error::{CastError, Result, Segment};
use crate::options::Options;
use crate::value::Value;

/// Target types usable as map keys.
pub trait MapKey: Cast + Eq + Hash {}

macro_rules! impl_map_key {
    ($($ty:ty),* $(,)?) => {
        $(impl MapKey for $ty {})*
    };
}

impl_map_key!(
    String, bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, TimeDelta,
);

fn check_depth(value: &Value, depth: usize, options: &Options, target: &Target) -> Result<()> {
    if depth > options.max_depth {
        return Err(CastError::too_deep(value, target.clone()));
    }
    Ok(())
}

fn abort(err: CastError, segment: Segment, target: &Target) -> CastError {
    log::debug!("{target} conversion stopped at {segment}: {err}");
    err.at(segment)
}

fn sequence<T>(
    value: &Value,
    options: &Options,
    depth: usize,
    target: Target,
    mut element: impl FnMut(&Value, usize) -> Result<T>,
) -> Result<Vec<T>> {
    let (resolved, _) = value.resolve();
    let Value::Seq(items) = resolved else {
        return Err(CastError::unconvertible(resolved, target));
    };
    check_depth(resolved, depth, options, &target)?;
    log::trace!("convert {} elements to {target}", items.len());

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            element(item, depth + 1).map_err(|e| abort(e, Segment::Index(i), &target))
        })
        .collect()
}

fn mapping<K, V>(
    value: &Value,
    options: &Options,
    depth: usize,
    target: Target,
    mut entry: impl FnMut(&Value, &Value, usize) -> Result<(K, V)>,
) -> Result<HashMap<K, V>>
where
    K: Eq + Hash,
{
    let (resolved, _) = value.resolve();
    let Value::Map(entries) = resolved else {
        return Err(CastError::unconvertible(resolved, target));
    };
    check_depth(resolved, depth, options, &target)?;
    log::trace!("convert {} entries to {target}", entries.len());

    let mut out = HashMap::with_capacity(entries.len());
    for (k, v) in entries {
        let (key, value) =
            entry(k, v, depth + 1).map_err(|e| abort(e, Segment::Key(repr(k)), &target))?;
        out.insert(key, value);
    }
    Ok(out)
}

/// Converts a sequence element-wise.
///
/// ```
/// let value: valcast::Value = serde_json::from_str(r#"["1", 2, 3.7]"#).unwrap();
/// assert_eq!(valcast::to_vec_e::<i64>(&value).unwrap(), vec![1, 2, 3]);
/// ```
pub fn to_vec_e<T: Cast>(value: &Value) -> Result<Vec<T>> {
    to_vec_with(value, Options::global())
}

pub fn to_vec_with<T: Cast>(value: &Value, options: &Options) -> Result<Vec<T>> {
    sequence(value, options, 1, Target::seq(T::target()), |item, _| {
        T::cast(item, options)
    })
}

/// Best-effort [`to_vec_e`]; empty on failure.
pub fn to_vec<T: Cast>(value: &Value) -> Vec<T> {
    to_vec_e(value).unwrap_or_default()
}

/// Converts a map's keys and values.
///
/// Keys that convert to the same result keep the value of the last entry.
pub fn to_map_e<K: MapKey, V: Cast>(value: &Value) -> Result<HashMap<K, V>> {
    to_map_with(value, Options::global())
}

pub fn to_map_with<K: MapKey, V: Cast>(value: &Value, options: &Options) -> Result<HashMap<K, V>> {
    mapping(
        value,
        options,
        1,
        Target::map(K::target(), V::target()),
        |k, v, _| Ok((K::cast(k, options)?, V::cast(v, options)?)),
    )
}

/// Best-effort [`to_map_e`]; empty on failure.
pub fn to_map<K: MapKey, V: Cast>(value: &Value) -> HashMap<K, V> {
    to_map_e(value).unwrap_or_default()
}

/// The elements of a sequence, unconverted.
pub fn to_values_e(value: &Value) -> Result<Vec<Value>> {
    to_values_with(value, Options::global())
}

pub fn to_values_with(value: &Value, options: &Options) -> Result<Vec<Value>> {
    sequence(value, options, 1, Target::seq(Target::Value), |item, _| {
        Ok(item.clone())
    })
}

pub fn to_values(value: &Value) -> Vec<Value> {
    to_values_e(value).unwrap_or_default()
}

/// A map with string keys and unconverted values.
pub fn to_string_map_e(value: &Value) -> Result<HashMap<String, Value>> {
    to_string_map_with(value, Options::global())
}

pub fn to_string_map_with(value: &Value, options: &Options) -> Result<HashMap<String, Value>> {
    mapping(
        value,
        options,
        1,
        Target::map(Target::String, Target::Value),
        |k, v, _| Ok((String::cast(k, options)?, v.clone())),
    )
}

pub fn to_string_map(value: &Value) -> HashMap<String, Value> {
    to_string_map_e(value).unwrap_or_default()
}

/// A map from strings to lists of strings.
///
/// Sequence values convert element-wise; any other value becomes a list
/// holding its single string conversion.
pub fn to_string_map_string_slice_e(value: &Value) -> Result<HashMap<String, Vec<String>>> {
    to_string_map_string_slice_with(value, Options::global())
}

pub fn to_string_map_string_slice_with(
    value: &Value,
    options: &Options,
) -> Result<HashMap<String, Vec<String>>> {
    let strings = Target::seq(Target::String);
    mapping(
        value,
        options,
        1,
        Target::map(Target::String, strings.clone()),
        |k, v, depth| {
            let key = String::cast(k, options)?;
            let list = match v.resolve().0 {
                Value::Seq(_) => sequence(v, options, depth, strings.clone(), |item, _| {
                    String::cast(item, options)
                })?,
                _ => vec![String::cast(v, options)?],
            };
            Ok((key, list))
        },
    )
}

pub fn to_string_map_string_slice(value: &Value) -> HashMap<String, Vec<String>> {
    to_string_map_string_slice_e(value).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn json(text: &str) -> Value {
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn test_vec_of_integers() {
        let value = json(r#"["1", "2", 3]"#);
        assert_eq!(to_vec_e::<i64>(&value).unwrap(), vec![1, 2, 3]);
        assert_eq!(to_vec::<u8>(&value), vec![1, 2, 3]);
    }

    #[test]
    fn test_vec_error_is_annotated_with_index() {
        let err = to_vec_e::<i64>(&json(r#"["1", "2", "x"]"#)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSyntax);
        assert_eq!(err.path(), &[Segment::Index(2)]);
        assert_eq!(err.target(), &Target::I64);
        assert!(to_vec::<i64>(&json(r#"["x"]"#)).is_empty());
    }

    #[test]
    fn test_vec_rejects_non_sequence() {
        let err = to_vec_e::<i64>(&Value::from(5)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unconvertible);
        assert_eq!(err.target(), &Target::seq(Target::I64));

        let err = to_vec_e::<i64>(&Value::null_ptr()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unconvertible);
    }

    #[test]
    fn test_vec_through_pointer() {
        let value = Value::ptr(Value::from(vec![Value::from(true), Value::null_ptr()]));
        assert_eq!(to_vec_e::<bool>(&value).unwrap(), vec![true, false]);
    }

    #[test]
    fn test_map_converts_keys_and_values() {
        let value = Value::map([(Value::from("1"), Value::from("10")), (Value::from(2u8), Value::from(20))]);
        let map = to_map_e::<u16, i32>(&value).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map[&1], 10);
        assert_eq!(map[&2], 20);
    }

    #[test]
    fn test_map_duplicate_keys_last_write_wins() {
        let value = Value::map([(Value::from("1"), 1), (Value::from(1), 2)]);
        let map = to_map_e::<i64, i64>(&value).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map[&1], 2);
    }

    #[test]
    fn test_map_error_is_annotated_with_key() {
        let err = to_map_e::<String, u8>(&json(r#"{"ok": 1, "port": 70000}"#)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Overflow);
        assert_eq!(err.path(), &[Segment::Key("port".to_string())]);
        assert!(to_map::<String, u8>(&json(r#"{"port": 70000}"#)).is_empty());
    }

    #[test]
    fn test_map_with_duration_keys() {
        let value = json(r#"{"1s": "a", "1000ms": "b"}"#);
        let map = to_map_e::<TimeDelta, String>(&value).unwrap();
        assert_eq!(map.len(), 1);
        assert!(map.contains_key(&TimeDelta::seconds(1)));
    }

    #[test]
    fn test_values_and_string_map() {
        let value = json(r#"[1, "a", null]"#);
        assert_eq!(
            to_values(&value),
            vec![Value::U64(1), Value::from("a"), Value::Null]
        );

        let map = to_string_map_e(&json(r#"{"a": [1], "b": null}"#)).unwrap();
        assert_eq!(map["a"], Value::Seq(vec![Value::U64(1)]));
        assert_eq!(map["b"], Value::Null);
        assert!(to_string_map(&value).is_empty());
    }

    #[test]
    fn test_string_map_string_slice() {
        let value = json(r#"{"tags": ["x", 2, true], "one": "solo", "n": 5}"#);
        let map = to_string_map_string_slice_e(&value).unwrap();
        assert_eq!(map["tags"], vec!["x", "2", "true"]);
        assert_eq!(map["one"], vec!["solo"]);
        assert_eq!(map["n"], vec!["5"]);
    }

    #[test]
    fn test_string_map_string_slice_nested_error_path() {
        let err = to_string_map_string_slice_e(&json(r#"{"tags": ["x", [1]]}"#)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unconvertible);
        assert_eq!(
            err.path(),
            &[Segment::Key("tags".to_string()), Segment::Index(1)]
        );
    }

    #[test]
    fn test_depth_limit() {
        let options = Options::default().with_max_depth(1);
        let value = json(r#"{"tags": ["x"]}"#);
        let err = to_string_map_string_slice_with(&value, &options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TooDeep);
        assert_eq!(err.path(), &[Segment::Key("tags".to_string())]);

        let options = Options::default().with_max_depth(0);
        let err = to_vec_with::<i64>(&json("[1]"), &options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TooDeep);
        assert!(err.path().is_empty());
    }
}
