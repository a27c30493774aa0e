//! Host-provided values for imported globals

use super::Value;
use crate::parser::module::ValueType;
use std::collections::HashMap;

/// Container for host numbers that a module's imported globals resolve to.
#[derive(Debug, Clone, Default)]
pub struct ImportObject {
    /// Imported global values mapped by (module_name, field_name)
    pub globals: HashMap<(String, String), f64>,
}

impl ImportObject {
    /// Create a new empty import object
    pub fn new() -> Self {
        Self { globals: HashMap::new() }
    }

    /// Add a global import
    pub fn add_global(&mut self, module: impl Into<String>, name: impl Into<String>, value: f64) {
        self.globals.insert((module.into(), name.into()), value);
    }

    /// Get a global import
    pub fn get_global(&self, module: &str, name: &str) -> Option<f64> {
        self.globals.get(&(module.to_string(), name.to_string())).copied()
    }
}

/// The value a global of the given type holds when no initializer sets it.
pub fn default_value_for_type(value_type: ValueType) -> Value {
    match value_type {
        ValueType::I32 => Value::I32(0),
        ValueType::I64 => Value::I64(0),
        ValueType::F32 => Value::F32(0.0),
        ValueType::F64 => Value::F64(0.0),
    }
}
