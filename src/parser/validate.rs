//! Compile-time validation of decoded modules.
//!
//! Enforces the MVP rules for globals: constant initializers must match the
//! declared type and may only read immutable imported globals, imported
//! globals must be immutable, export names must be unique and refer to an
//! existing global, and exported globals must be immutable.

use std::collections::HashSet;

use log::trace;
use thiserror::Error;

use super::module::{ConstExpr, GlobalType, Module, ValueType};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("type mismatch: global {index} declared {expected}, initializer produces {actual}")]
    TypeMismatch {
        index: u32,
        expected: ValueType,
        actual: ValueType,
    },

    #[error("unknown global {0}")]
    UnknownGlobal(u32),

    #[error("constant expression required: global.get {0} does not refer to an imported global")]
    NonImportedGlobalGet(u32),

    #[error("constant expression required: global.get {0} refers to a mutable global")]
    MutableGlobalGet(u32),

    #[error("mutable globals cannot be imported: {module}.{name}")]
    MutableGlobalImport { module: String, name: String },

    #[error("mutable globals cannot be exported: \"{name}\" (global {index})")]
    MutableGlobalExport { name: String, index: u32 },

    #[error("duplicate export name \"{0}\"")]
    DuplicateExportName(String),
}

pub fn validate(module: &Module) -> Result<(), ValidationError> {
    for import in &module.imports {
        if import.global_type.mutable {
            return Err(ValidationError::MutableGlobalImport {
                module: import.module.clone(),
                name: import.name.clone(),
            });
        }
    }

    for (i, global) in module.globals.iter().enumerate() {
        let index = (module.imports.len() + i) as u32;
        validate_init(module, index, &global.global_type, &global.init)?;
    }

    let mut names = HashSet::new();
    for export in &module.exports {
        if !names.insert(export.name.as_str()) {
            return Err(ValidationError::DuplicateExportName(export.name.clone()));
        }
        let global_type = module
            .global_type(export.global_index)
            .ok_or(ValidationError::UnknownGlobal(export.global_index))?;
        if global_type.mutable {
            return Err(ValidationError::MutableGlobalExport {
                name: export.name.clone(),
                index: export.global_index,
            });
        }
    }

    trace!("validated module '{}'", module.name);
    Ok(())
}

/// Checks one initializer against the declared type of global `index`.
fn validate_init(
    module: &Module,
    index: u32,
    global_type: &GlobalType,
    init: &ConstExpr,
) -> Result<(), ValidationError> {
    let actual = match *init {
        ConstExpr::I32Const(_) => ValueType::I32,
        ConstExpr::I64Const(_) => ValueType::I64,
        ConstExpr::F32Const(_) => ValueType::F32,
        ConstExpr::F64Const(_) => ValueType::F64,
        ConstExpr::GlobalGet(source) => {
            let source_type = module
                .global_type(source)
                .ok_or(ValidationError::UnknownGlobal(source))?;
            if !module.is_imported_global(source) {
                return Err(ValidationError::NonImportedGlobalGet(source));
            }
            if source_type.mutable {
                return Err(ValidationError::MutableGlobalGet(source));
            }
            source_type.value_type
        }
    };

    if actual != global_type.value_type {
        return Err(ValidationError::TypeMismatch {
            index,
            expected: global_type.value_type,
            actual,
        });
    }
    Ok(())
}
