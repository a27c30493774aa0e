//! Programmatic construction of globals-only modules.
//!
//! [`ModuleBuilder`] declares imported and local globals, marks them for
//! export and produces a [`Module`], its binary encoding, or a linked
//! [`Instance`]. Binaries go through the same [`crate::parser::compile`]
//! path as any host-provided buffer, so compile-time errors surface exactly
//! as they would for a hand-written binary.
//!
//! ```
//! use wasm_builder::builder::ModuleBuilder;
//! use wasm_builder::parser::module::ValueType;
//!
//! let mut builder = ModuleBuilder::new();
//! builder.add_global(ValueType::I32, false).export_as("answer").init(42.0);
//! let instance = builder.instantiate().unwrap();
//! assert_eq!(instance.export("answer"), Some(42.0));
//! ```

use log::trace;
use thiserror::Error;

use crate::encoder::{self, EncodeError};
use crate::parser::module::{ConstExpr, Export, Global, GlobalImport, GlobalType, Module, ValueType};
use crate::parser::{self, CompileError};
use crate::runtime::imports::default_value_for_type;
use crate::runtime::{self, ImportObject, Instance, LinkError, Value};

/// Misuse of the builder API.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum BuildError {
    #[error("imported global {module}.{name} declared after a local global")]
    ImportAfterGlobal { module: String, name: String },
}

/// Failure at any stage between a builder and a linked instance.
#[derive(Error, Debug)]
pub enum InstantiateError {
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),
    #[error("compile error: {0}")]
    Compile(#[from] CompileError),
    #[error("link error: {0}")]
    Link(#[from] LinkError),
}

#[derive(Debug, Clone)]
pub struct ModuleBuilder {
    module: Module,
}

impl Default for ModuleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleBuilder {
    pub fn new() -> Self {
        Self::with_name("module")
    }

    pub fn with_name(name: &str) -> Self {
        ModuleBuilder {
            module: Module::new(name),
        }
    }

    /// Declares a local global initialized to the zero of its type.
    pub fn add_global(&mut self, value_type: ValueType, mutable: bool) -> GlobalBuilder<'_> {
        self.module.globals.push(Global {
            global_type: GlobalType::new(value_type, mutable),
            init: default_value_for_type(value_type).into(),
        });
        let index = (self.module.global_count() - 1) as u32;
        trace!("declared global {} {}", index, GlobalType::new(value_type, mutable));
        GlobalBuilder { builder: self, index }
    }

    /// Declares an immutable imported global and returns its index.
    ///
    /// Imported globals occupy the low end of the global index space, so all
    /// imports must be declared before the first local global.
    pub fn add_imported_global(&mut self, module: &str, name: &str, value_type: ValueType) -> Result<u32, BuildError> {
        if !self.module.globals.is_empty() {
            return Err(BuildError::ImportAfterGlobal {
                module: module.to_string(),
                name: name.to_string(),
            });
        }
        self.module.imports.push(GlobalImport {
            module: module.to_string(),
            name: name.to_string(),
            global_type: GlobalType::new(value_type, false),
        });
        Ok((self.module.imports.len() - 1) as u32)
    }

    /// Exports any global, imported or local, under `name`.
    pub fn add_export(&mut self, name: &str, global_index: u32) -> &mut Self {
        self.module.exports.push(Export {
            name: name.to_string(),
            global_index,
        });
        self
    }

    pub fn to_module(&self) -> Module {
        self.module.clone()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, EncodeError> {
        encoder::encode(&self.module)
    }

    /// Encodes the module and compiles the resulting bytes.
    pub fn compile(&self) -> Result<Module, InstantiateError> {
        let bytes = self.to_bytes()?;
        Ok(parser::compile(&self.module.name, &bytes)?)
    }

    pub fn instantiate(&self) -> Result<Instance, InstantiateError> {
        let module = self.compile()?;
        Ok(runtime::instantiate(&module, None)?)
    }

    pub fn instantiate_with(&self, imports: &ImportObject) -> Result<Instance, InstantiateError> {
        let module = self.compile()?;
        Ok(runtime::instantiate(&module, Some(imports))?)
    }
}

/// Handle to a global just declared with [`ModuleBuilder::add_global`].
pub struct GlobalBuilder<'a> {
    builder: &'a mut ModuleBuilder,
    index: u32,
}

impl GlobalBuilder<'_> {
    /// Index of this global in the global index space.
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn export_as(self, name: &str) -> Self {
        self.builder.add_export(name, self.index);
        self
    }

    /// Sets the initial value from a host number, coerced to the global's
    /// type (see [`Value::from_number`]).
    pub fn init(mut self, number: f64) -> Self {
        let global = self.global_mut();
        global.init = Value::from_number(global.global_type.value_type, number).into();
        self
    }

    /// Sets the initial value without coercion. A value of the wrong type
    /// is reported when the module is compiled.
    pub fn init_value(mut self, value: Value) -> Self {
        self.global_mut().init = value.into();
        self
    }

    /// Initializes from an imported global (`global.get index`).
    pub fn init_from_global(mut self, index: u32) -> Self {
        self.global_mut().init = ConstExpr::GlobalGet(index);
        self
    }

    fn global_mut(&mut self) -> &mut Global {
        let local = self.index as usize - self.builder.module.imports.len();
        &mut self.builder.module.globals[local]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::validate::ValidationError;

    #[test]
    fn globals_default_to_zero() {
        let mut builder = ModuleBuilder::new();
        builder.add_global(ValueType::F32, false);
        builder.add_global(ValueType::I64, true);
        let module = builder.to_module();
        assert_eq!(module.globals[0].init, ConstExpr::F32Const(0.0));
        assert_eq!(module.globals[1].init, ConstExpr::I64Const(0));
        assert!(module.globals[1].global_type.mutable);
    }

    #[test]
    fn init_coerces_to_global_type() {
        let mut builder = ModuleBuilder::new();
        builder.add_global(ValueType::I32, false).init(-1.5);
        builder.add_global(ValueType::F32, false).init(0.1);
        builder.add_global(ValueType::I64, false).init(1e20);
        let module = builder.to_module();
        assert_eq!(module.globals[0].init, ConstExpr::I32Const(-1));
        assert_eq!(module.globals[1].init, ConstExpr::F32Const(0.1f32));
        assert_eq!(module.globals[2].init, ConstExpr::I64Const(i64::MAX));
    }

    #[test]
    fn export_as_is_repeatable() {
        let mut builder = ModuleBuilder::new();
        let index = builder.add_global(ValueType::F64, false).export_as("a").export_as("b").index();
        assert_eq!(index, 0);
        let module = builder.to_module();
        assert_eq!(module.exports.len(), 2);
        assert_eq!(
            module.exports,
            vec![
                Export {
                    name: "a".to_string(),
                    global_index: 0
                },
                Export {
                    name: "b".to_string(),
                    global_index: 0
                },
            ]
        );
    }

    #[test]
    fn imports_take_low_indices() {
        let mut builder = ModuleBuilder::with_name("imports");
        assert_eq!(builder.add_imported_global("env", "x", ValueType::I32), Ok(0));
        assert_eq!(builder.add_imported_global("env", "y", ValueType::F64), Ok(1));
        let g = builder.add_global(ValueType::I32, false).init_from_global(0);
        assert_eq!(g.index(), 2);
        assert_eq!(
            builder.add_imported_global("env", "z", ValueType::I32),
            Err(BuildError::ImportAfterGlobal {
                module: "env".to_string(),
                name: "z".to_string()
            })
        );
        assert_eq!(builder.to_module().globals[0].init, ConstExpr::GlobalGet(0));
    }

    #[test]
    fn init_value_type_mismatch_fails_compile() {
        let mut builder = ModuleBuilder::new();
        builder.add_global(ValueType::I32, false).init_value(Value::F64(1.0));
        match builder.compile() {
            Err(InstantiateError::Compile(CompileError::Validation(ValidationError::TypeMismatch { .. }))) => {}
            other => panic!("expected type mismatch, got {other:?}"),
        }
    }

    #[test]
    fn compile_round_trips_through_bytes() {
        let mut builder = ModuleBuilder::with_name("rt");
        builder.add_imported_global("env", "base", ValueType::F64).unwrap();
        builder.add_global(ValueType::F64, false).init_from_global(0).export_as("copy");
        builder.add_export("base", 0);
        assert_eq!(builder.compile().unwrap(), builder.to_module());
    }
}
