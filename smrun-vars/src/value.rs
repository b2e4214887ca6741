//! Typed variable values.

use crate::error::VarError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared type of a variable or local.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VarType {
    Short,
    Int,
    Float,
    #[serde(rename = "string")]
    Str,
}

impl VarType {
    /// Default value for a freshly declared variable of this type.
    pub fn default_value(self) -> Value {
        match self {
            VarType::Short => Value::Short(0),
            VarType::Int => Value::Int(0),
            VarType::Float => Value::Float(0.0),
            VarType::Str => Value::Str(String::new()),
        }
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VarType::Short => "short",
            VarType::Int => "int",
            VarType::Float => "float",
            VarType::Str => "string",
        };
        f.write_str(name)
    }
}

/// A typed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Short(i16),
    Int(i32),
    Float(f32),
    Str(String),
}

impl Value {
    /// The type tag of this value.
    pub fn ty(&self) -> VarType {
        match self {
            Value::Short(_) => VarType::Short,
            Value::Int(_) => VarType::Int,
            Value::Float(_) => VarType::Float,
            Value::Str(_) => VarType::Str,
        }
    }

    /// True in a boolean context: nonzero numeric or non-empty string.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Short(n) => *n != 0,
            Value::Int(n) => *n != 0,
            Value::Float(x) => *x != 0.0,
            Value::Str(s) => !s.is_empty(),
        }
    }

    /// Numeric view, promoting shorts. `None` for strings.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Short(n) => Some(i32::from(*n)),
            Value::Int(n) => Some(*n),
            Value::Float(x) => Some(*x as i32),
            Value::Str(_) => None,
        }
    }

    /// Floating-point view. `None` for strings.
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Value::Short(n) => Some(f32::from(*n)),
            Value::Int(n) => Some(*n as f32),
            Value::Float(x) => Some(*x),
            Value::Str(_) => None,
        }
    }

    /// Converts this value to the given type, the way an assignment into a
    /// slot of that type would. Numeric conversions truncate; anything
    /// renders into a string; strings do not silently become numbers.
    pub fn convert_to(&self, ty: VarType) -> Result<Value, VarError> {
        if self.ty() == ty {
            return Ok(self.clone());
        }
        match (self, ty) {
            (v, VarType::Str) => Ok(Value::Str(v.to_string())),
            (Value::Str(_), _) => Err(VarError::TypeMismatch {
                value: self.to_string(),
                ty,
            }),
            (Value::Short(n), VarType::Int) => Ok(Value::Int(i32::from(*n))),
            (Value::Short(n), VarType::Float) => Ok(Value::Float(f32::from(*n))),
            (Value::Int(n), VarType::Short) => Ok(Value::Short(*n as i16)),
            (Value::Int(n), VarType::Float) => Ok(Value::Float(*n as f32)),
            (Value::Float(x), VarType::Short) => Ok(Value::Short(*x as i16)),
            (Value::Float(x), VarType::Int) => Ok(Value::Int(*x as i32)),
            // Same-type pairs returned above.
            _ => Ok(self.clone()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Short(n) => write!(f, "{}", n),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => f.write_str(s),
        }
    }
}
