use std::fmt;

use quickcheck::{Arbitrary, Gen};
use serde::{Deserialize, Serialize};

/// Discriminator for the primitive held by a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ValueType {
    /// UTF-8 string
    String,
    /// signed 64-bit integer
    Int64,
    /// unsigned 64-bit integer
    Uint64,
    /// 64-bit float
    Float64,
    /// raw byte sequence
    Bytes,
    /// boolean
    Bool,
}

/// A scalar stored under a key.
///
/// The map never inspects values beyond equality; the typed accessors
/// exist for callers reading them back out.
///
/// ```
/// use orsetmap::{Value, ValueType};
///
/// let v = Value::from(42u64);
/// assert_eq!(v.value_type(), ValueType::Uint64);
/// assert_eq!(v.as_u64(), Some(42));
/// assert_eq!(v.as_i64(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// UTF-8 string
    String(String),
    /// signed 64-bit integer
    Int64(i64),
    /// unsigned 64-bit integer
    Uint64(u64),
    /// 64-bit float
    Float64(f64),
    /// raw byte sequence
    Bytes(Vec<u8>),
    /// boolean
    Bool(bool),
}

impl Value {
    /// The type tag of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::String(_) => ValueType::String,
            Value::Int64(_) => ValueType::Int64,
            Value::Uint64(_) => ValueType::Uint64,
            Value::Float64(_) => ValueType::Float64,
            Value::Bytes(_) => ValueType::Bytes,
            Value::Bool(_) => ValueType::Bool,
        }
    }

    /// Returns the string if this is a `String` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer if this is an `Int64` value.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Int64(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the integer if this is a `Uint64` value.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::Uint64(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the float if this is a `Float64` value.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Float64(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the bytes if this is a `Bytes` value.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the flag if this is a `Bool` value.
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{:?}", s),
            Value::Int64(v) => write!(f, "{}", v),
            Value::Uint64(v) => write!(f, "{}u", v),
            Value::Float64(v) => write!(f, "{}f", v),
            Value::Bytes(b) => write!(f, "0x{}", hex::encode(b)),
            Value::Bool(v) => write!(f, "{}", v),
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Uint64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Bytes(b.to_vec())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl Arbitrary for Value {
    fn arbitrary<G: Gen>(g: &mut G) -> Self {
        match u8::arbitrary(g) % 6 {
            0 => Value::String(String::arbitrary(g)),
            1 => Value::Int64(i64::arbitrary(g)),
            2 => Value::Uint64(u64::arbitrary(g)),
            3 => Value::Float64(f64::arbitrary(g)),
            4 => Value::Bytes(Vec::arbitrary(g)),
            _ => Value::Bool(bool::arbitrary(g)),
        }
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        match self {
            Value::String(s) => Box::new(s.shrink().map(Value::String)),
            Value::Int64(v) => Box::new(v.shrink().map(Value::Int64)),
            Value::Uint64(v) => Box::new(v.shrink().map(Value::Uint64)),
            Value::Bytes(b) => Box::new(b.shrink().map(Value::Bytes)),
            _ => Box::new(std::iter::empty()),
        }
    }
}
