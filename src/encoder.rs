//! Encodes a [`Module`] to WebAssembly binary format (`.wasm`).
//!
//! This is the inverse of [`crate::parser::parse`]. Given a module (usually
//! produced by [`crate::builder::ModuleBuilder`]) it produces the
//! WebAssembly 1.0 binary encoding.
//!
//! # Binary format overview
//!
//! A WebAssembly binary begins with a magic number (`\0asm`) and version (1),
//! followed by sections in a fixed order. Each section is encoded as:
//!
//! ```text
//! section_id: u8 | byte_length: vu32 | contents: byte*
//! ```
//!
//! Only the sections a globals-only module needs are written: import (2),
//! global (6) and export (7). Each is emitted only when non-empty, and all
//! integers use minimal LEB128 encoding.
//!
//! # Example
//!
//! ```
//! use wasm_builder::encoder;
//! use wasm_builder::parser::module::Module;
//!
//! let bytes = encoder::encode(&Module::new("empty")).unwrap();
//! assert_eq!(bytes, b"\0asm\x01\0\0\0");
//! ```

use std::fmt;

use log::debug;

use crate::parser::encoding::{
    write_f32, write_f64, write_name, write_vs32, write_vs64, write_vu1, write_vu32, DESC_GLOBAL, MAGIC, OP_END,
    SECTION_EXPORT, SECTION_GLOBAL, SECTION_IMPORT, VERSION,
};
use crate::parser::module::{ConstExpr, GlobalType, Module};

// ===========================================================================
// Error type
// ===========================================================================

/// Errors that can occur during binary encoding.
#[derive(Debug, PartialEq, Eq)]
pub enum EncodeError {
    /// A vector or name is longer than a `u32` length prefix can describe.
    TooLong { what: &'static str, len: usize },
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::TooLong { what, len } => {
                write!(f, "{what} too long to encode: {len} entries")
            }
        }
    }
}

impl std::error::Error for EncodeError {}

// ===========================================================================
// Public API
// ===========================================================================

/// Encodes a WebAssembly module to binary format.
///
/// The inverse of [`crate::parser::parse`].
pub fn encode(module: &Module) -> Result<Vec<u8>, EncodeError> {
    let mut buf = Vec::new();

    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&VERSION.to_le_bytes());

    // Sections in wire order
    encode_import_section(&mut buf, module)?;
    encode_global_section(&mut buf, module)?;
    encode_export_section(&mut buf, module)?;

    debug!(
        "encoded module '{}': {} imports, {} globals, {} exports, {} bytes",
        module.name,
        module.imports.len(),
        module.globals.len(),
        module.exports.len(),
        buf.len()
    );
    Ok(buf)
}

// ===========================================================================
// Section encoders (in wire order)
// ===========================================================================

/// Import section (id 2): imported globals.
///
/// ```text
/// importsec  ::= section_2(vec(import))
/// import     ::= module:name name:name importdesc
/// importdesc ::= 0x03 globaltype
/// ```
fn encode_import_section(buf: &mut Vec<u8>, module: &Module) -> Result<(), EncodeError> {
    let imports = &module.imports;
    if imports.is_empty() {
        return Ok(());
    }

    let mut contents = Vec::new();
    write_vu32(&mut contents, vec_len("import vector", imports.len())?);
    for imp in imports {
        emit_name(&mut contents, &imp.module)?;
        emit_name(&mut contents, &imp.name)?;
        contents.push(DESC_GLOBAL);
        emit_global_type(&mut contents, &imp.global_type);
    }
    emit_section(buf, SECTION_IMPORT, &contents)
}

/// Global section (id 6): locally defined globals.
///
/// ```text
/// globalsec  ::= section_6(vec(global))
/// global     ::= globaltype expr
/// globaltype ::= valtype mut
/// mut        ::= 0x00 (const) | 0x01 (var)
/// ```
fn encode_global_section(buf: &mut Vec<u8>, module: &Module) -> Result<(), EncodeError> {
    let globals = &module.globals;
    if globals.is_empty() {
        return Ok(());
    }

    let mut contents = Vec::new();
    write_vu32(&mut contents, vec_len("global vector", globals.len())?);
    for global in globals {
        emit_global_type(&mut contents, &global.global_type);
        emit_const_expr(&mut contents, &global.init);
    }
    emit_section(buf, SECTION_GLOBAL, &contents)
}

/// Export section (id 7): exported globals.
///
/// ```text
/// exportsec  ::= section_7(vec(export))
/// export     ::= name exportdesc
/// exportdesc ::= 0x03 globalidx
/// ```
fn encode_export_section(buf: &mut Vec<u8>, module: &Module) -> Result<(), EncodeError> {
    let exports = &module.exports;
    if exports.is_empty() {
        return Ok(());
    }

    let mut contents = Vec::new();
    write_vu32(&mut contents, vec_len("export vector", exports.len())?);
    for export in exports {
        emit_name(&mut contents, &export.name)?;
        contents.push(DESC_GLOBAL);
        write_vu32(&mut contents, export.global_index);
    }
    emit_section(buf, SECTION_EXPORT, &contents)
}

// ===========================================================================
// Shared helpers
// ===========================================================================

/// Wraps section contents with a section ID and length prefix.
fn emit_section(buf: &mut Vec<u8>, id: u8, contents: &[u8]) -> Result<(), EncodeError> {
    buf.push(id);
    write_vu32(buf, vec_len("section", contents.len())?);
    buf.extend_from_slice(contents);
    Ok(())
}

fn emit_name(buf: &mut Vec<u8>, name: &str) -> Result<(), EncodeError> {
    vec_len("name", name.len())?;
    write_name(buf, name);
    Ok(())
}

fn emit_global_type(buf: &mut Vec<u8>, global_type: &GlobalType) {
    buf.push(global_type.value_type.wire_byte());
    write_vu1(buf, global_type.mutable);
}

/// Encodes a constant initializer followed by the end marker.
fn emit_const_expr(buf: &mut Vec<u8>, expr: &ConstExpr) {
    buf.push(expr.opcode());
    match *expr {
        ConstExpr::I32Const(v) => write_vs32(buf, v),
        ConstExpr::I64Const(v) => write_vs64(buf, v),
        ConstExpr::F32Const(v) => write_f32(buf, v),
        ConstExpr::F64Const(v) => write_f64(buf, v),
        ConstExpr::GlobalGet(idx) => write_vu32(buf, idx),
    }
    buf.push(OP_END);
}

fn vec_len(what: &'static str, len: usize) -> Result<u32, EncodeError> {
    u32::try_from(len).map_err(|_| EncodeError::TooLong { what, len })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::module::ValueType;

    #[test]
    fn const_expr_bytes() {
        let cases: Vec<(ConstExpr, Vec<u8>)> = vec![
            (ConstExpr::I32Const(4711), vec![0x41, 0xe7, 0x24, 0x0b]),
            (ConstExpr::I64Const(-1), vec![0x42, 0x7f, 0x0b]),
            (ConstExpr::F32Const(1.0), vec![0x43, 0x00, 0x00, 0x80, 0x3f, 0x0b]),
            (ConstExpr::F64Const(0.0), vec![0x44, 0, 0, 0, 0, 0, 0, 0, 0, 0x0b]),
            (ConstExpr::GlobalGet(2), vec![0x23, 0x02, 0x0b]),
        ];
        for (expr, expected) in cases {
            let mut buf = Vec::new();
            emit_const_expr(&mut buf, &expr);
            assert_eq!(buf, expected, "encoding {expr}");
        }
    }

    #[test]
    fn global_type_bytes() {
        let mut buf = Vec::new();
        emit_global_type(&mut buf, &GlobalType::new(ValueType::F64, true));
        emit_global_type(&mut buf, &GlobalType::new(ValueType::I32, false));
        assert_eq!(buf, vec![0x7c, 0x01, 0x7f, 0x00]);
    }

    #[test]
    fn section_length_prefix() {
        let mut buf = Vec::new();
        emit_section(&mut buf, SECTION_GLOBAL, &[0xaa; 130]).unwrap();
        assert_eq!(&buf[..3], &[SECTION_GLOBAL, 0x82, 0x01]);
        assert_eq!(buf.len(), 3 + 130);
    }
}
