//! WebAssembly module instance

use super::{ImportObject, LinkError, Value};
use crate::parser::module::{ConstExpr, Module, ValueType};
use log::{debug, trace};

/// An instantiated module: the resolved value of every global and the
/// host-visible exports.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    module_name: String,
    globals: Vec<Value>,
    /// Export name to global index, in declaration order
    exports: Vec<(String, u32)>,
}

/// Links `module` against the host and evaluates its globals.
///
/// Imported globals are looked up in `imports` and coerced to their declared
/// type. Local globals are then initialized in order. Exports are checked
/// last: every exported global must be representable as a host number.
pub fn instantiate(module: &Module, imports: Option<&ImportObject>) -> Result<Instance, LinkError> {
    let mut globals = Vec::with_capacity(module.global_count());

    for import in &module.imports {
        let value_type = import.global_type.value_type;
        if value_type == ValueType::I64 {
            return Err(LinkError::I64Import {
                module: import.module.clone(),
                name: import.name.clone(),
            });
        }
        let number = imports
            .and_then(|i| i.get_global(&import.module, &import.name))
            .ok_or_else(|| LinkError::MissingImport {
                module: import.module.clone(),
                name: import.name.clone(),
            })?;
        let value = Value::from_number(value_type, number);
        trace!("import {}.{} resolved to {}", import.module, import.name, value);
        globals.push(value);
    }

    for global in &module.globals {
        let value = evaluate(&global.init, &globals)?;
        globals.push(value);
    }

    let mut exports = Vec::with_capacity(module.exports.len());
    for export in &module.exports {
        let global_type = module
            .global_type(export.global_index)
            .ok_or(LinkError::UnknownGlobal(export.global_index))?;
        if global_type.value_type == ValueType::I64 {
            return Err(LinkError::I64Export {
                name: export.name.clone(),
            });
        }
        exports.push((export.name.clone(), export.global_index));
    }

    debug!(
        "instantiated module '{}': {} globals, {} exports",
        module.name,
        globals.len(),
        exports.len()
    );

    Ok(Instance {
        module_name: module.name.clone(),
        globals,
        exports,
    })
}

/// Evaluates a constant initializer against the globals resolved so far.
fn evaluate(init: &ConstExpr, globals: &[Value]) -> Result<Value, LinkError> {
    Ok(match *init {
        ConstExpr::I32Const(v) => Value::I32(v),
        ConstExpr::I64Const(v) => Value::I64(v),
        ConstExpr::F32Const(v) => Value::F32(v),
        ConstExpr::F64Const(v) => Value::F64(v),
        ConstExpr::GlobalGet(idx) => *globals.get(idx as usize).ok_or(LinkError::UnknownGlobal(idx))?,
    })
}

impl Instance {
    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    /// The exports as host numbers, in declaration order.
    pub fn exports(&self) -> Vec<(&str, f64)> {
        self.exports
            .iter()
            .filter_map(|(name, idx)| self.number_at(*idx).map(|n| (name.as_str(), n)))
            .collect()
    }

    /// An export as a host number, or `None` if there is no such export.
    pub fn export(&self, name: &str) -> Option<f64> {
        self.export_index(name).and_then(|idx| self.number_at(idx))
    }

    /// The typed value behind an export.
    pub fn global(&self, name: &str) -> Option<Value> {
        self.export_index(name)
            .and_then(|idx| self.globals.get(idx as usize))
            .copied()
    }

    pub fn export_names(&self) -> impl Iterator<Item = &str> {
        self.exports.iter().map(|(name, _)| name.as_str())
    }

    fn export_index(&self, name: &str) -> Option<u32> {
        self.exports.iter().find(|(n, _)| n == name).map(|(_, idx)| *idx)
    }

    fn number_at(&self, idx: u32) -> Option<f64> {
        self.globals.get(idx as usize).and_then(Value::to_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::module::{Export, Global, GlobalImport, GlobalType};

    fn local(value_type: ValueType, init: ConstExpr) -> Global {
        Global {
            global_type: GlobalType::new(value_type, false),
            init,
        }
    }

    fn export(name: &str, global_index: u32) -> Export {
        Export {
            name: name.to_string(),
            global_index,
        }
    }

    fn import(name: &str, value_type: ValueType) -> GlobalImport {
        GlobalImport {
            module: "env".to_string(),
            name: name.to_string(),
            global_type: GlobalType::new(value_type, false),
        }
    }

    #[test]
    fn test_exports_in_declaration_order() {
        let mut m = Module::new("order");
        m.globals.push(local(ValueType::I32, ConstExpr::I32Const(7)));
        m.globals.push(local(ValueType::F64, ConstExpr::F64Const(0.25)));
        m.exports.push(export("z", 1));
        m.exports.push(export("a", 0));
        m.exports.push(export("again", 0));

        let instance = instantiate(&m, None).unwrap();
        assert_eq!(instance.module_name(), "order");
        assert_eq!(instance.exports(), vec![("z", 0.25), ("a", 7.0), ("again", 7.0)]);
        assert_eq!(instance.export("a"), Some(7.0));
        assert_eq!(instance.export("missing"), None);
        assert_eq!(instance.global("z"), Some(Value::F64(0.25)));
        assert_eq!(instance.export_names().collect::<Vec<_>>(), vec!["z", "a", "again"]);
    }

    #[test]
    fn test_unexported_i64_is_fine() {
        let mut m = Module::new("i64");
        m.globals.push(local(ValueType::I64, ConstExpr::I64Const(1)));
        let instance = instantiate(&m, None).unwrap();
        assert!(instance.exports().is_empty());
    }

    #[test]
    fn test_exported_i64_is_link_error() {
        let mut m = Module::new("i64");
        m.globals.push(local(ValueType::I64, ConstExpr::I64Const(1)));
        m.exports.push(export("big", 0));
        assert_eq!(
            instantiate(&m, None),
            Err(LinkError::I64Export {
                name: "big".to_string()
            })
        );
    }

    #[test]
    fn test_i64_export_uses_declared_type() {
        // unvalidated: i64 global with an i32 initializer
        let mut m = Module::new("mismatch");
        m.globals.push(local(ValueType::I64, ConstExpr::I32Const(1)));
        m.exports.push(export("big", 0));
        assert_eq!(
            instantiate(&m, None),
            Err(LinkError::I64Export {
                name: "big".to_string()
            })
        );
    }

    #[test]
    fn test_imports_resolve_and_coerce() {
        let mut m = Module::new("imports");
        m.imports.push(import("count", ValueType::I32));
        m.imports.push(import("ratio", ValueType::F32));
        m.globals.push(local(ValueType::I32, ConstExpr::GlobalGet(0)));
        m.exports.push(export("count", 2));
        m.exports.push(export("ratio", 1));

        let mut host = ImportObject::new();
        host.add_global("env", "count", 42.9);
        host.add_global("env", "ratio", 0.1);

        let instance = instantiate(&m, Some(&host)).unwrap();
        assert_eq!(instance.global("count"), Some(Value::I32(42)));
        assert_eq!(instance.export("ratio"), Some(0.1f32 as f64));
    }

    #[test]
    fn test_import_link_errors() {
        let mut m = Module::new("imports");
        m.imports.push(import("missing", ValueType::F64));
        assert_eq!(
            instantiate(&m, None),
            Err(LinkError::MissingImport {
                module: "env".to_string(),
                name: "missing".to_string()
            })
        );

        let mut m = Module::new("imports");
        m.imports.push(import("wide", ValueType::I64));
        let mut host = ImportObject::new();
        host.add_global("env", "wide", 1.0);
        assert!(matches!(instantiate(&m, Some(&host)), Err(LinkError::I64Import { .. })));
    }

    #[test]
    fn test_out_of_range_references() {
        let mut m = Module::new("bad");
        m.globals.push(local(ValueType::I32, ConstExpr::GlobalGet(3)));
        assert_eq!(instantiate(&m, None), Err(LinkError::UnknownGlobal(3)));

        let mut m = Module::new("bad");
        m.exports.push(export("nothing", 0));
        assert_eq!(instantiate(&m, None), Err(LinkError::UnknownGlobal(0)));
    }
}
