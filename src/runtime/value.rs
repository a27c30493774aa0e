//! WebAssembly value representation and host number conversion

use crate::parser::module::{ConstExpr, ValueType};
use fhex::ToHex;
use std::fmt;

/// 2^32, the modulus of the ToInt32 wrap-around.
const TWO_POW_32: f64 = 4294967296.0;

/// Runtime representation of WebAssembly values
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
}

impl Value {
    /// Get the WebAssembly type of this value
    pub fn typ(&self) -> ValueType {
        match self {
            Value::I32(_) => ValueType::I32,
            Value::I64(_) => ValueType::I64,
            Value::F32(_) => ValueType::F32,
            Value::F64(_) => ValueType::F64,
        }
    }

    /// Widens the value to a host number.
    ///
    /// `i32` and `f32` widen exactly. `i64` has no host number
    /// representation and yields `None`.
    pub fn to_number(&self) -> Option<f64> {
        match self {
            Value::I32(v) => Some(f64::from(*v)),
            Value::I64(_) => None,
            Value::F32(v) => Some(f64::from(*v)),
            Value::F64(v) => Some(*v),
        }
    }

    /// Converts a host number to a value of type `typ`.
    ///
    /// - `i32`: ToInt32 (truncate toward zero, wrap modulo 2^32, NaN and
    ///   infinities become 0)
    /// - `i64`: truncate toward zero, saturating at the bounds, NaN becomes 0
    /// - `f32`: round to nearest single precision value
    /// - `f64`: unchanged
    pub fn from_number(typ: ValueType, n: f64) -> Value {
        match typ {
            ValueType::I32 => Value::I32(to_int32(n)),
            ValueType::I64 => Value::I64(n as i64),
            ValueType::F32 => Value::F32(n as f32),
            ValueType::F64 => Value::F64(n),
        }
    }

    /// Convert to type and value strings, as shown by the CLI
    pub fn to_strings(&self) -> (String, String) {
        match self {
            Value::I32(v) => ("i32".to_string(), v.to_string()),
            Value::I64(v) => ("i64".to_string(), v.to_string()),
            Value::F32(v) => ("f32".to_string(), v.to_hex()),
            Value::F64(v) => ("f64".to_string(), v.to_hex()),
        }
    }
}

impl From<Value> for ConstExpr {
    fn from(value: Value) -> Self {
        match value {
            Value::I32(v) => ConstExpr::I32Const(v),
            Value::I64(v) => ConstExpr::I64Const(v),
            Value::F32(v) => ConstExpr::F32Const(v),
            Value::F64(v) => ConstExpr::F64Const(v),
        }
    }
}

fn to_int32(n: f64) -> i32 {
    if !n.is_finite() {
        return 0;
    }
    n.trunc().rem_euclid(TWO_POW_32) as u32 as i32
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::I32(v) => write!(f, "i32:{v}"),
            Value::I64(v) => write!(f, "i64:{v}"),
            Value::F32(v) => write!(f, "f32:{}", v.to_hex()),
            Value::F64(v) => write!(f, "f64:{}", v.to_hex()),
        }
    }
}
