//! Binary format decoder and validator.
//!
//! [`parse`] reads `.wasm` bytes into a [`module::Module`]; [`validate`]
//! applies the compile-time rules. [`compile`] runs both, which is what a
//! host does when it is handed a buffer of bytes.
//!
//! Only the sections needed to describe globals are understood: custom
//! sections (skipped), imports, globals and exports. Any other section is
//! reported as unsupported rather than skipped.

pub mod encoding;
pub mod module;
pub mod reader;
pub mod validate;

use std::io;

use log::{debug, trace};
use thiserror::Error;

use encoding::{
    section_name, DESC_GLOBAL, MAGIC, MUT_CONST, MUT_VAR, OP_END, OP_F32_CONST, OP_F64_CONST, OP_GLOBAL_GET,
    OP_I32_CONST, OP_I64_CONST, SECTION_CUSTOM, SECTION_DATA_COUNT, SECTION_EXPORT, SECTION_GLOBAL, SECTION_IMPORT,
    VERSION,
};
use module::{ConstExpr, Export, Global, GlobalImport, GlobalType, Module, ValueType};
use reader::Reader;
pub use validate::{validate, ValidationError};

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("magic header not detected")]
    BadMagic,

    #[error("unknown binary version: {0}")]
    UnknownVersion(u32),

    #[error("unexpected end")]
    UnexpectedEnd(#[source] io::Error),

    #[error("malformed: {0}")]
    Malformed(#[source] io::Error),

    #[error("malformed section id: {0}")]
    UnknownSection(u8),

    #[error("unsupported section: {name} (id {id})")]
    UnsupportedSection { id: u8, name: &'static str },

    #[error("unexpected content after last section: {0} section out of order")]
    SectionOutOfOrder(&'static str),

    #[error("section size mismatch in {name} section: declared {declared}, consumed {consumed}")]
    SectionSizeMismatch {
        name: &'static str,
        declared: u32,
        consumed: usize,
    },

    #[error("unsupported external kind 0x{0:02x}")]
    UnsupportedExternal(u8),

    #[error("{0}")]
    InvalidValueType(String),

    #[error("malformed mutability 0x{0:02x}")]
    MalformedMutability(u8),

    #[error("illegal opcode 0x{0:02x} in constant expression")]
    IllegalConstOpcode(u8),

    #[error("constant expression required: expected end, found 0x{0:02x}")]
    ConstExprNotTerminated(u8),
}

impl From<io::Error> for DecodeError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::UnexpectedEof => DecodeError::UnexpectedEnd(e),
            _ => DecodeError::Malformed(e),
        }
    }
}

/// The host-facing "compile error": the bytes are not a valid module.
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("compile error: {0}")]
    Decode(#[from] DecodeError),

    #[error("compile error: {0}")]
    Validation(#[from] ValidationError),
}

/// Decodes and validates a binary module.
pub fn compile(name: &str, bytes: &[u8]) -> Result<Module, CompileError> {
    let module = parse(name, &mut Reader::new(bytes.to_vec()))?;
    validate(&module)?;
    Ok(module)
}

/// Decodes a binary module without validating it.
pub fn parse(name: &str, reader: &mut Reader) -> Result<Module, DecodeError> {
    let mut module = Module::new(name);

    read_header(reader)?;

    let mut last_section = 0u8;
    while reader.has_at_least(1) {
        let sec_id = reader.read_byte()?;
        let sec_len = reader.read_vu32()?;

        if !reader.has_at_least(sec_len as usize) {
            return Err(DecodeError::UnexpectedEnd(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "not enough bytes left for section, expected {}, got {}",
                    sec_len,
                    reader.remaining()
                ),
            )));
        }

        trace!(
            "section #{} '{}', len = {}",
            sec_id,
            section_name(sec_id),
            sec_len
        );

        if sec_id != SECTION_CUSTOM {
            if sec_id > SECTION_DATA_COUNT {
                return Err(DecodeError::UnknownSection(sec_id));
            }
            if sec_id <= last_section {
                return Err(DecodeError::SectionOutOfOrder(section_name(sec_id)));
            }
            last_section = sec_id;
        }

        let start = reader.pos();
        read_section(sec_id, sec_len, reader, &mut module)?;
        let consumed = reader.pos() - start;
        if consumed != sec_len as usize {
            return Err(DecodeError::SectionSizeMismatch {
                name: section_name(sec_id),
                declared: sec_len,
                consumed,
            });
        }
    }

    debug!(
        "parsed module '{}': {} imported, {} local globals, {} exports",
        module.name,
        module.imports.len(),
        module.globals.len(),
        module.exports.len()
    );
    Ok(module)
}

fn read_header(reader: &mut Reader) -> Result<(), DecodeError> {
    let magic = reader.read_bytes(4).map_err(|_| DecodeError::BadMagic)?;
    if magic.as_slice() != MAGIC {
        return Err(DecodeError::BadMagic);
    }
    let version = reader.read_u32()?;
    if version != VERSION {
        return Err(DecodeError::UnknownVersion(version));
    }
    Ok(())
}

fn read_section(sec_id: u8, sec_len: u32, reader: &mut Reader, module: &mut Module) -> Result<(), DecodeError> {
    match sec_id {
        SECTION_CUSTOM => read_section_custom(sec_len, reader),
        SECTION_IMPORT => read_section_import(reader, &mut module.imports),
        SECTION_GLOBAL => read_section_global(reader, &mut module.globals),
        SECTION_EXPORT => read_section_export(reader, &mut module.exports),
        id => Err(DecodeError::UnsupportedSection {
            id,
            name: section_name(id),
        }),
    }
}

/* SECTION READERS ************************************************/

fn read_section_custom(sec_len: u32, reader: &mut Reader) -> Result<(), DecodeError> {
    let start = reader.pos();
    let name = reader.read_string()?;
    let used = reader.pos() - start;
    if used > sec_len as usize {
        return Err(DecodeError::SectionSizeMismatch {
            name: "custom",
            declared: sec_len,
            consumed: used,
        });
    }
    trace!("skipping custom section '{}'", name);
    reader.skip(sec_len as usize - used)?;
    Ok(())
}

fn read_section_import(reader: &mut Reader, imports: &mut Vec<GlobalImport>) -> Result<(), DecodeError> {
    let count = reader.read_vu32()?;

    for _ in 0..count {
        let module = reader.read_string()?;
        let name = reader.read_string()?;
        let kind = reader.read_byte()?;
        if kind != DESC_GLOBAL {
            return Err(DecodeError::UnsupportedExternal(kind));
        }
        let global_type = read_global_type(reader)?;
        trace!("import {}.{}: {}", module, name, global_type);
        imports.push(GlobalImport {
            module,
            name,
            global_type,
        });
    }

    Ok(())
}

fn read_section_global(reader: &mut Reader, globals: &mut Vec<Global>) -> Result<(), DecodeError> {
    let count = reader.read_vu32()?;

    for _ in 0..count {
        let global_type = read_global_type(reader)?;
        let init = read_const_expr(reader)?;
        globals.push(Global { global_type, init });
    }

    Ok(())
}

fn read_section_export(reader: &mut Reader, exports: &mut Vec<Export>) -> Result<(), DecodeError> {
    let count = reader.read_vu32()?;

    for _ in 0..count {
        let name = reader.read_string()?;
        let kind = reader.read_byte()?;
        if kind != DESC_GLOBAL {
            return Err(DecodeError::UnsupportedExternal(kind));
        }
        let global_index = reader.read_vu32()?;
        exports.push(Export { name, global_index });
    }

    Ok(())
}

fn read_global_type(reader: &mut Reader) -> Result<GlobalType, DecodeError> {
    let value_type = ValueType::decode(reader.read_byte()?).map_err(DecodeError::InvalidValueType)?;
    let mutable = match reader.read_byte()? {
        MUT_CONST => false,
        MUT_VAR => true,
        b => return Err(DecodeError::MalformedMutability(b)),
    };
    Ok(GlobalType { value_type, mutable })
}

fn read_const_expr(reader: &mut Reader) -> Result<ConstExpr, DecodeError> {
    let expr = match reader.read_byte()? {
        OP_I32_CONST => ConstExpr::I32Const(reader.read_vs32()?),
        OP_I64_CONST => ConstExpr::I64Const(reader.read_vs64()?),
        OP_F32_CONST => ConstExpr::F32Const(reader.read_f32()?),
        OP_F64_CONST => ConstExpr::F64Const(reader.read_f64()?),
        OP_GLOBAL_GET => ConstExpr::GlobalGet(reader.read_vu32()?),
        op => return Err(DecodeError::IllegalConstOpcode(op)),
    };
    match reader.read_byte()? {
        OP_END => Ok(expr),
        b => Err(DecodeError::ConstExprNotTerminated(b)),
    }
}
