use chrono::{DateTime, FixedOffset, TimeDelta, TimeZone};
use half::f16;
use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{self, Visitor},
    ser::{self, SerializeMap},
};
use serde_json::value::RawValue;
use std::fmt;

/// Dynamic value of unknown static type
///
/// This is the input model of every conversion in the crate. Decoders of
/// structured documents produce it through [`Deserialize`], callers may also
/// build it directly through the `From` impls.
///
/// # Example
/// ```
/// use valcast::Value;
///
/// let value = Value::map([("port", Value::from("8080")), ("debug", Value::from(1))]);
/// assert!(value.is_map());
/// assert_eq!(value.get("port").and_then(Value::as_str), Some("8080"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value
    Null,
    /// Boolean value
    Bool(bool),
    /// Text string
    String(String),
    /// Numeric literal kept in its textual form
    Number(Number),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Isize(isize),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Usize(usize),
    F16(f16),
    F32(f32),
    F64(f64),
    /// Point in time
    Instant(DateTime<FixedOffset>),
    /// Signed duration
    Duration(TimeDelta),
    /// Byte string
    Bytes(Vec<u8>),
    /// Sequence of values
    Seq(Vec<Value>),
    /// Key/value pairs in source order, keys of any kind
    Map(Vec<(Value, Value)>),
    /// Indirection; `None` is a null pointer
    Ptr(Option<Box<Value>>),
}

/// The dynamic kind of a [`Value`], used in error reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Null,
    Bool,
    String,
    Number,
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
    F16,
    F32,
    F64,
    Instant,
    Duration,
    Bytes,
    Seq,
    Map,
    Ptr,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Kind::Null => "null",
            Kind::Bool => "bool",
            Kind::String => "string",
            Kind::Number => "number",
            Kind::I8 => "i8",
            Kind::I16 => "i16",
            Kind::I32 => "i32",
            Kind::I64 => "i64",
            Kind::Isize => "isize",
            Kind::U8 => "u8",
            Kind::U16 => "u16",
            Kind::U32 => "u32",
            Kind::U64 => "u64",
            Kind::Usize => "usize",
            Kind::F16 => "f16",
            Kind::F32 => "f32",
            Kind::F64 => "f64",
            Kind::Instant => "instant",
            Kind::Duration => "duration",
            Kind::Bytes => "bytes",
            Kind::Seq => "seq",
            Kind::Map => "map",
            Kind::Ptr => "ptr",
        };
        f.write_str(name)
    }
}

/// Numeric literal in textual form
///
/// Holds the exact digits a decoder saw (or the exact decimal rendering of a
/// numeric leaf) so no precision is lost through a binary float.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Number(String);

impl Number {
    /// Wraps numeric text without validating it
    pub fn new(text: impl Into<String>) -> Self {
        Number(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// -?(0|[1-9][0-9]*)(\.[0-9]+)?([eE][+-]?[0-9]+)?
fn is_json_number(text: &str) -> bool {
    fn digits(bytes: &[u8]) -> usize {
        bytes.iter().take_while(|b| b.is_ascii_digit()).count()
    }

    let bytes = text.as_bytes();
    let mut i = usize::from(bytes.first() == Some(&b'-'));
    match bytes.get(i) {
        Some(b'0') => i += 1,
        Some(b'1'..=b'9') => i += digits(&bytes[i..]),
        _ => return false,
    }
    if bytes.get(i) == Some(&b'.') {
        let n = digits(&bytes[i + 1..]);
        if n == 0 {
            return false;
        }
        i += 1 + n;
    }
    if matches!(bytes.get(i), Some(b'e' | b'E')) {
        i += 1;
        if matches!(bytes.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        let n = digits(&bytes[i..]);
        if n == 0 {
            return false;
        }
        i += n;
    }
    i == bytes.len()
}

// Integers whose text is already canonical go out as native integers. Any
// other valid number literal is written verbatim as a raw JSON value, so
// no digit passes through a binary float. Text that is not a number
// literal (`NaN`, `inf`) is emitted as a string.
impl Serialize for Number {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let text = self.0.as_str();
        match text.parse::<i64>() {
            Ok(i) if i.to_string() == text => return serializer.serialize_i64(i),
            _ => {}
        }
        match text.parse::<u64>() {
            Ok(u) if u.to_string() == text => return serializer.serialize_u64(u),
            _ => {}
        }
        if !is_json_number(text) {
            return serializer.serialize_str(text);
        }
        RawValue::from_string(text.to_owned())
            .map_err(<S::Error as ser::Error>::custom)?
            .serialize(serializer)
    }
}

static NULL: Value = Value::Null;

impl Value {
    /// Wraps a value in a non-null indirection
    pub fn ptr(value: impl Into<Value>) -> Self {
        Value::Ptr(Some(Box::new(value.into())))
    }

    /// A null indirection
    pub fn null_ptr() -> Self {
        Value::Ptr(None)
    }

    /// Builds a map from key/value pairs, keeping their order
    pub fn map<K, V, I>(entries: I) -> Self
    where
        K: Into<Value>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Follows indirection until a non-pointer value is reached.
    ///
    /// Returns the terminal value and whether any indirection was crossed.
    /// A null link anywhere in the chain resolves to [`Value::Null`] with the
    /// flag set, so callers can tell "never a pointer" from "null pointer".
    pub fn resolve(&self) -> (&Value, bool) {
        if !matches!(self, Value::Ptr(_)) {
            return (self, false);
        }

        let mut current = self;
        while let Value::Ptr(link) = current {
            match link {
                Some(next) => current = next,
                None => return (&NULL, true),
            }
        }
        (current, true)
    }

    pub fn kind(&self) -> Kind {
        match self {
            Value::Null => Kind::Null,
            Value::Bool(_) => Kind::Bool,
            Value::String(_) => Kind::String,
            Value::Number(_) => Kind::Number,
            Value::I8(_) => Kind::I8,
            Value::I16(_) => Kind::I16,
            Value::I32(_) => Kind::I32,
            Value::I64(_) => Kind::I64,
            Value::Isize(_) => Kind::Isize,
            Value::U8(_) => Kind::U8,
            Value::U16(_) => Kind::U16,
            Value::U32(_) => Kind::U32,
            Value::U64(_) => Kind::U64,
            Value::Usize(_) => Kind::Usize,
            Value::F16(_) => Kind::F16,
            Value::F32(_) => Kind::F32,
            Value::F64(_) => Kind::F64,
            Value::Instant(_) => Kind::Instant,
            Value::Duration(_) => Kind::Duration,
            Value::Bytes(_) => Kind::Bytes,
            Value::Seq(_) => Kind::Seq,
            Value::Map(_) => Kind::Map,
            Value::Ptr(_) => Kind::Ptr,
        }
    }

    /// Returns true if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true if the value is a boolean
    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    /// Returns true if the value is a string
    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    /// Returns true for numeric literals and every integer or float width
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Value::Number(_)
                | Value::I8(_)
                | Value::I16(_)
                | Value::I32(_)
                | Value::I64(_)
                | Value::Isize(_)
                | Value::U8(_)
                | Value::U16(_)
                | Value::U32(_)
                | Value::U64(_)
                | Value::Usize(_)
                | Value::F16(_)
                | Value::F32(_)
                | Value::F64(_)
        )
    }

    /// Returns true if the value is a sequence
    pub fn is_seq(&self) -> bool {
        matches!(self, Value::Seq(_))
    }

    /// Returns true if the value is a map
    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    /// Returns true if the value is an indirection
    pub fn is_ptr(&self) -> bool {
        matches!(self, Value::Ptr(_))
    }

    /// Returns the value as a boolean, if it is one
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the value as text, if it is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as a sequence, if it is one
    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::Seq(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the map entries, if the value is a map
    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Looks up a string key in a map, last matching entry wins
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.resolve()
            .0
            .as_map()?
            .iter()
            .rev()
            .find(|(k, _)| k.resolve().0.as_str() == Some(key))
            .map(|(_, v)| v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&crate::cast::repr(self))
    }
}

macro_rules! from_primitive {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

from_primitive! {
    bool => Bool,
    String => String,
    Number => Number,
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
    f16 => F16,
    f32 => F32,
    f64 => F64,
    TimeDelta => Duration,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Value {
    fn from(v: DateTime<Tz>) -> Self {
        Value::Instant(v.fixed_offset())
    }
}

/// Durations beyond `TimeDelta::MAX` saturate to `TimeDelta::MAX`.
impl From<std::time::Duration> for Value {
    fn from(v: std::time::Duration) -> Self {
        Value::Duration(TimeDelta::from_std(v).unwrap_or(TimeDelta::MAX))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Seq(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        Value::Ptr(v.map(|inner| Box::new(inner.into())))
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null | Value::Ptr(None) => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::String(s) => serializer.serialize_str(s),
            Value::Number(n) => n.serialize(serializer),
            Value::I8(i) => serializer.serialize_i8(*i),
            Value::I16(i) => serializer.serialize_i16(*i),
            Value::I32(i) => serializer.serialize_i32(*i),
            Value::I64(i) => serializer.serialize_i64(*i),
            Value::Isize(i) => serializer.serialize_i64(*i as i64),
            Value::U8(u) => serializer.serialize_u8(*u),
            Value::U16(u) => serializer.serialize_u16(*u),
            Value::U32(u) => serializer.serialize_u32(*u),
            Value::U64(u) => serializer.serialize_u64(*u),
            Value::Usize(u) => serializer.serialize_u64(*u as u64),
            Value::F16(f) => serializer.serialize_f32(f.to_f32()),
            Value::F32(f) => serializer.serialize_f32(*f),
            Value::F64(f) => serializer.serialize_f64(*f),
            Value::Instant(t) => serializer.serialize_str(&t.to_rfc3339()),
            Value::Duration(d) => serializer.serialize_str(&crate::time::format_duration(d)),
            Value::Bytes(b) => serializer.serialize_bytes(b),
            Value::Seq(items) => items.serialize(serializer),
            Value::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Value::Ptr(Some(inner)) => serializer.serialize_some(inner.as_ref()),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("any value")
            }

            fn visit_bool<E>(self, value: bool) -> Result<Value, E> {
                Ok(Value::Bool(value))
            }

            fn visit_i8<E>(self, value: i8) -> Result<Value, E> {
                Ok(Value::I8(value))
            }

            fn visit_i16<E>(self, value: i16) -> Result<Value, E> {
                Ok(Value::I16(value))
            }

            fn visit_i32<E>(self, value: i32) -> Result<Value, E> {
                Ok(Value::I32(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Value, E> {
                Ok(Value::I64(value))
            }

            // Wider than any fixed-width variant, keep the digits
            fn visit_i128<E>(self, value: i128) -> Result<Value, E> {
                Ok(match i64::try_from(value) {
                    Ok(v) => Value::I64(v),
                    Err(_) => Value::Number(Number::new(value.to_string())),
                })
            }

            fn visit_u8<E>(self, value: u8) -> Result<Value, E> {
                Ok(Value::U8(value))
            }

            fn visit_u16<E>(self, value: u16) -> Result<Value, E> {
                Ok(Value::U16(value))
            }

            fn visit_u32<E>(self, value: u32) -> Result<Value, E> {
                Ok(Value::U32(value))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Value, E> {
                Ok(Value::U64(value))
            }

            fn visit_u128<E>(self, value: u128) -> Result<Value, E> {
                Ok(match u64::try_from(value) {
                    Ok(v) => Value::U64(v),
                    Err(_) => Value::Number(Number::new(value.to_string())),
                })
            }

            fn visit_f32<E>(self, value: f32) -> Result<Value, E> {
                Ok(Value::F32(value))
            }

            fn visit_f64<E>(self, value: f64) -> Result<Value, E> {
                Ok(Value::F64(value))
            }

            fn visit_char<E>(self, value: char) -> Result<Value, E> {
                Ok(Value::String(value.to_string()))
            }

            fn visit_str<E>(self, value: &str) -> Result<Value, E>
            where
                E: de::Error,
            {
                Ok(Value::String(value.to_owned()))
            }

            fn visit_string<E>(self, value: String) -> Result<Value, E> {
                Ok(Value::String(value))
            }

            fn visit_bytes<E>(self, value: &[u8]) -> Result<Value, E>
            where
                E: de::Error,
            {
                Ok(Value::Bytes(value.to_vec()))
            }

            fn visit_byte_buf<E>(self, value: Vec<u8>) -> Result<Value, E> {
                Ok(Value::Bytes(value))
            }

            fn visit_none<E>(self) -> Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_some<D>(self, deserializer: D) -> Result<Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Deserialize::deserialize(deserializer)
            }

            fn visit_unit<E>(self) -> Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_newtype_struct<D>(self, deserializer: D) -> Result<Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Deserialize::deserialize(deserializer)
            }

            fn visit_seq<V>(self, mut visitor: V) -> Result<Value, V::Error>
            where
                V: de::SeqAccess<'de>,
            {
                let mut vec = Vec::with_capacity(visitor.size_hint().unwrap_or(0));
                while let Some(elem) = visitor.next_element()? {
                    vec.push(elem);
                }
                Ok(Value::Seq(vec))
            }

            fn visit_map<V>(self, mut visitor: V) -> Result<Value, V::Error>
            where
                V: de::MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(visitor.size_hint().unwrap_or(0));
                while let Some((key, value)) = visitor.next_entry()? {
                    entries.push((key, value));
                }
                Ok(Value::Map(entries))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}
