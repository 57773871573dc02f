//! Canonical, string-keyed trees for encoding.
//!
//! Decoders produce maps with keys of any kind, which most encoders reject.
//! [`normalize`] rewrites a [`Value`] into a [`Canonical`] tree whose map
//! keys are all strings and whose numbers keep their exact decimal text.

use std::collections::HashMap;

use serde::{Serialize, Serializer, ser::SerializeMap};

use crate::cast::{Target, number_text, repr};
use crate::error::{CastError, Error, Result, Segment};
use crate::options::Options;
use crate::value::{Number, Value};

/// Normalized value tree
#[derive(Debug, Clone, PartialEq)]
pub enum Canonical {
    Bool(bool),
    String(String),
    /// Exact decimal text of a numeric leaf
    Number(Number),
    Seq(Vec<Canonical>),
    /// Entries in source order, keys unique
    Map(Vec<(String, Canonical)>),
}

impl Canonical {
    pub fn get(&self, key: &str) -> Option<&Canonical> {
        match self {
            Canonical::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Canonical::String(s) => Some(s),
            _ => None,
        }
    }
}

impl Serialize for Canonical {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Canonical::Bool(b) => serializer.serialize_bool(*b),
            Canonical::String(s) => serializer.serialize_str(s),
            Canonical::Number(n) => n.serialize(serializer),
            Canonical::Seq(items) => items.serialize(serializer),
            Canonical::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

/// Normalizes a value with the default [`Options`].
///
/// Fails only when nesting exceeds the depth limit.
///
/// ```
/// use valcast::{Value, normalize};
///
/// let value = Value::map([(1, "a"), (2, "b")]);
/// let json = serde_json::to_string(&normalize(&value).unwrap()).unwrap();
/// assert_eq!(json, r#"{"1":"a","2":"b"}"#);
/// ```
pub fn normalize(value: &Value) -> Result<Canonical> {
    normalize_with(value, Options::global())
}

pub fn normalize_with(value: &Value, options: &Options) -> Result<Canonical> {
    normalize_at(value, options, 1)
}

fn normalize_at(value: &Value, options: &Options, depth: usize) -> Result<Canonical> {
    let (value, _) = value.resolve();
    if matches!(value, Value::Seq(_) | Value::Map(_)) && depth > options.max_depth {
        return Err(CastError::too_deep(value, Target::Canonical));
    }

    Ok(match value {
        Value::Bool(b) => Canonical::Bool(*b),
        Value::String(s) => Canonical::String(s.clone()),
        Value::Seq(items) => Canonical::Seq(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    normalize_at(item, options, depth + 1).map_err(|e| e.at(Segment::Index(i)))
                })
                .collect::<Result<_>>()?,
        ),
        Value::Map(entries) => {
            let mut out: Vec<(String, Canonical)> = Vec::with_capacity(entries.len());
            // key -> position of its first occurrence
            let mut index: HashMap<String, usize> = HashMap::with_capacity(entries.len());
            for (k, v) in entries {
                let key = repr(k);
                let v = normalize_at(v, options, depth + 1)
                    .map_err(|e| e.at(Segment::Key(key.clone())))?;
                match index.get(&key) {
                    Some(&i) => out[i].1 = v,
                    None => {
                        index.insert(key.clone(), out.len());
                        out.push((key, v));
                    }
                }
            }
            Canonical::Map(out)
        }
        other => match number_text(other) {
            Some(text) => Canonical::Number(Number::new(text)),
            None => Canonical::String(repr(other)),
        },
    })
}

/// Normalizes a value and encodes it as JSON.
pub fn to_json(value: &Value) -> Result<Vec<u8>, Error> {
    to_json_with(value, Options::global())
}

pub fn to_json_with(value: &Value, options: &Options) -> Result<Vec<u8>, Error> {
    let canonical = normalize_with(value, options)?;
    Ok(serde_json::to_vec(&canonical)?)
}

pub fn to_json_string(value: &Value) -> Result<String, Error> {
    to_json_string_with(value, Options::global())
}

pub fn to_json_string_with(value: &Value, options: &Options) -> Result<String, Error> {
    let canonical = normalize_with(value, options)?;
    Ok(serde_json::to_string(&canonical)?)
}
