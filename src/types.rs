//! Core value type for datapipe-rs
//!
//! The pipeline is generic over its value type; [`Value`] is the default, a
//! small dynamically typed value that round-trips through JSON/TOML and
//! through Rhai's `Dynamic`, so scripted functions and native closures can
//! share one pipeline.

use rhai::{Array, Dynamic};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dynamically typed pipeline value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric view; integers widen to `f64`.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(v) => Some(v),
            _ => None,
        }
    }

    /// Short type label used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
        }
    }

    /// Convert a script result back into a `Value`.
    ///
    /// Unit maps to `Null` and chars to one-character strings; maps, function
    /// pointers and custom types have no `Value` form.
    pub fn from_dynamic(value: Dynamic) -> Result<Self, String> {
        if value.is_unit() {
            return Ok(Value::Null);
        }
        if let Ok(v) = value.as_bool() {
            return Ok(Value::Bool(v));
        }
        if let Ok(v) = value.as_int() {
            return Ok(Value::Int(v));
        }
        if let Ok(v) = value.as_float() {
            return Ok(Value::Float(v));
        }
        if let Ok(v) = value.as_char() {
            return Ok(Value::String(v.to_string()));
        }
        if value.is_string() {
            return value
                .into_string()
                .map(Value::String)
                .map_err(|ty| format!("cannot read string from {}", ty));
        }
        if value.is_array() {
            let items = value
                .into_array()
                .map_err(|ty| format!("cannot read array from {}", ty))?;
            return items
                .into_iter()
                .map(Value::from_dynamic)
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List);
        }
        Err(format!("unsupported script value of type '{}'", value.type_name()))
    }

    /// Convert into a Rhai `Dynamic` for use as a script argument.
    pub fn into_dynamic(self) -> Dynamic {
        match self {
            Value::Null => Dynamic::UNIT,
            Value::Bool(v) => Dynamic::from_bool(v),
            Value::Int(v) => Dynamic::from_int(v),
            Value::Float(v) => Dynamic::from_float(v),
            Value::String(v) => Dynamic::from(v),
            Value::List(items) => {
                let array: Array = items.into_iter().map(Value::into_dynamic).collect();
                Dynamic::from_array(array)
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "{}", v),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<Value> for Dynamic {
    fn from(value: Value) -> Self {
        value.into_dynamic()
    }
}
