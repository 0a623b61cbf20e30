//! Generic config values for the open-ended parts of task configs
//! (request bodies, activity inputs, raised error data).

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::error::EncodeError;
use crate::refs::{BoolRef, IntRef, ObjectRef, RefCore, StringRef, ValueRef};

/// A schema-less value that may embed refs at any depth.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Null,
    Bool(bool),
    Int(i64),
    /// Integers above `i64::MAX`.
    UInt(u64),
    Float(f64),
    String(String),
    List(Vec<ConfigValue>),
    Map(BTreeMap<String, ConfigValue>),
    Ref(RefCore),
}

impl ConfigValue {
    /// Lift any serializable value.
    ///
    /// # Errors
    ///
    /// Returns an [`EncodeError`] when `value` does not serialize to JSON
    /// (e.g. a map with non-string keys).
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self, EncodeError> {
        let json = serde_json::to_value(value).map_err(|e| EncodeError::new("", e.to_string()))?;
        Ok(Self::from(json))
    }

    /// Encode into the manifest's value tree. Refs become their folded
    /// value or expression text.
    ///
    /// # Errors
    ///
    /// Returns an [`EncodeError`] for non-finite floats, with the path of
    /// the offending value.
    pub fn to_json(&self) -> Result<Value, EncodeError> {
        Ok(match self {
            ConfigValue::Null => Value::Null,
            ConfigValue::Bool(b) => Value::Bool(*b),
            ConfigValue::Int(n) => Value::from(*n),
            ConfigValue::UInt(n) => Value::from(*n),
            ConfigValue::Float(f) => Number::from_f64(*f)
                .map(Value::Number)
                .ok_or_else(|| EncodeError::new("", format!("non-finite number {f}")))?,
            ConfigValue::String(s) => Value::String(s.clone()),
            ConfigValue::List(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    out.push(item.to_json().map_err(|e| e.within(&format!("[{i}]")))?);
                }
                Value::Array(out)
            }
            ConfigValue::Map(map) => {
                let mut out = Map::new();
                for (key, item) in map {
                    out.insert(key.clone(), item.to_json().map_err(|e| e.within(key))?);
                }
                Value::Object(out)
            }
            ConfigValue::Ref(r) => r.to_wire(),
        })
    }

    /// Call `f` for every ref embedded in this value, depth first.
    pub fn visit_refs<'a>(&'a self, f: &mut dyn FnMut(&'a RefCore)) {
        match self {
            ConfigValue::List(items) => items.iter().for_each(|i| i.visit_refs(f)),
            ConfigValue::Map(map) => map.values().for_each(|v| v.visit_refs(f)),
            ConfigValue::Ref(r) => f(r),
            _ => {}
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ConfigValue::Null)
    }
}

impl From<Value> for ConfigValue {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => ConfigValue::Null,
            Value::Bool(b) => ConfigValue::Bool(b),
            Value::Number(n) => match (n.as_i64(), n.as_u64()) {
                (Some(i), _) => ConfigValue::Int(i),
                (None, Some(u)) => ConfigValue::UInt(u),
                (None, None) => ConfigValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => ConfigValue::String(s),
            Value::Array(items) => ConfigValue::List(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => {
                ConfigValue::Map(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::String(s.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        ConfigValue::String(s)
    }
}

impl From<i64> for ConfigValue {
    fn from(n: i64) -> Self {
        ConfigValue::Int(n)
    }
}

impl From<i32> for ConfigValue {
    fn from(n: i32) -> Self {
        ConfigValue::Int(i64::from(n))
    }
}

impl From<u64> for ConfigValue {
    fn from(n: u64) -> Self {
        i64::try_from(n).map_or(ConfigValue::UInt(n), ConfigValue::Int)
    }
}

impl From<f64> for ConfigValue {
    fn from(f: f64) -> Self {
        ConfigValue::Float(f)
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        ConfigValue::Bool(b)
    }
}

impl From<Vec<ConfigValue>> for ConfigValue {
    fn from(items: Vec<ConfigValue>) -> Self {
        ConfigValue::List(items)
    }
}

impl From<RefCore> for ConfigValue {
    fn from(r: RefCore) -> Self {
        ConfigValue::Ref(r)
    }
}

macro_rules! from_typed_ref {
    ($($ty:ty),+) => {
        $(
            impl From<$ty> for ConfigValue {
                fn from(r: $ty) -> Self {
                    ConfigValue::Ref(r.into())
                }
            }

            impl From<&$ty> for ConfigValue {
                fn from(r: &$ty) -> Self {
                    ConfigValue::Ref(r.core().clone())
                }
            }
        )+
    };
}

from_typed_ref!(StringRef, IntRef, BoolRef, ObjectRef, ValueRef);

impl<K: Into<String>, V: Into<ConfigValue>> FromIterator<(K, V)> for ConfigValue {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        ConfigValue::Map(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
