//! Binary encoding primitives for WebAssembly values.
//!
//! Provides LEB128 integer encoding, IEEE 754 float encoding, and name
//! encoding as specified by the WebAssembly binary format.
//!
//! All functions write directly into a caller-provided `&mut Vec<u8>` buffer,
//! avoiding intermediate allocations.

use byteorder::{LittleEndian, WriteBytesExt};

// ---------------------------------------------------------------------------
// WebAssembly binary format constants
// ---------------------------------------------------------------------------

pub const MAGIC: &[u8; 4] = b"\0asm";
pub const VERSION: u32 = 1;

// Section IDs (§5.5.2)
pub const SECTION_CUSTOM: u8 = 0;
pub const SECTION_TYPE: u8 = 1;
pub const SECTION_IMPORT: u8 = 2;
pub const SECTION_FUNCTION: u8 = 3;
pub const SECTION_TABLE: u8 = 4;
pub const SECTION_MEMORY: u8 = 5;
pub const SECTION_GLOBAL: u8 = 6;
pub const SECTION_EXPORT: u8 = 7;
pub const SECTION_START: u8 = 8;
pub const SECTION_ELEMENT: u8 = 9;
pub const SECTION_CODE: u8 = 10;
pub const SECTION_DATA: u8 = 11;
pub const SECTION_DATA_COUNT: u8 = 12;

// Import/export descriptor kind for globals (§5.5.5, §5.5.10); the
// function, table and memory kinds (0x00-0x02) are rejected on decode.
pub const DESC_GLOBAL: u8 = 0x03;

// Global mutability (§5.3.10)
pub const MUT_CONST: u8 = 0x00;
pub const MUT_VAR: u8 = 0x01;

// Constant expression opcodes (§5.4)
pub const OP_GLOBAL_GET: u8 = 0x23;
pub const OP_I32_CONST: u8 = 0x41;
pub const OP_I64_CONST: u8 = 0x42;
pub const OP_F32_CONST: u8 = 0x43;
pub const OP_F64_CONST: u8 = 0x44;

// Expression terminator (§5.4.9)
pub const OP_END: u8 = 0x0B;

/// Human-readable name of a section id, for diagnostics.
pub fn section_name(id: u8) -> &'static str {
    match id {
        SECTION_CUSTOM => "custom",
        SECTION_TYPE => "type",
        SECTION_IMPORT => "import",
        SECTION_FUNCTION => "function",
        SECTION_TABLE => "table",
        SECTION_MEMORY => "memory",
        SECTION_GLOBAL => "global",
        SECTION_EXPORT => "export",
        SECTION_START => "start",
        SECTION_ELEMENT => "element",
        SECTION_CODE => "code",
        SECTION_DATA => "data",
        SECTION_DATA_COUNT => "datacount",
        _ => "unknown",
    }
}

// ---------------------------------------------------------------------------
// Unsigned LEB128
// ---------------------------------------------------------------------------

/// Appends the unsigned LEB128 encoding of a u64 value to `buf`.
fn write_vu(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let mut byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            buf.push(byte);
            break;
        }
        byte |= 0x80;
        buf.push(byte);
    }
}

/// Appends the unsigned LEB128 encoding of a u32 value to `buf`.
pub fn write_vu32(buf: &mut Vec<u8>, v: u32) {
    write_vu(buf, v as u64);
}

/// Appends a single-bit boolean as a one-byte LEB128 value (0x00 or 0x01).
pub fn write_vu1(buf: &mut Vec<u8>, v: bool) {
    buf.push(if v { MUT_VAR } else { MUT_CONST });
}

// ---------------------------------------------------------------------------
// Signed LEB128
// ---------------------------------------------------------------------------

/// Appends the signed LEB128 encoding of an i64 value to `buf`.
fn write_vs(buf: &mut Vec<u8>, mut value: i64) {
    loop {
        let mut byte = (value & 0x7f) as u8;
        value >>= 7;
        if (value == 0 && (byte & 0x40) == 0) || (value == -1 && (byte & 0x40) != 0) {
            buf.push(byte);
            break;
        }
        byte |= 0x80;
        buf.push(byte);
    }
}

/// Appends the signed LEB128 encoding of an i32 value to `buf`.
pub fn write_vs32(buf: &mut Vec<u8>, v: i32) {
    write_vs(buf, v as i64);
}

/// Appends the signed LEB128 encoding of an i64 value to `buf`.
pub fn write_vs64(buf: &mut Vec<u8>, v: i64) {
    write_vs(buf, v);
}

// ---------------------------------------------------------------------------
// IEEE 754 floats (little-endian)
// ---------------------------------------------------------------------------

/// Appends the little-endian IEEE 754 encoding of an f32 value to `buf`.
pub fn write_f32(buf: &mut Vec<u8>, v: f32) {
    buf.write_f32::<LittleEndian>(v)
        .expect("writing to a Vec never fails");
}

/// Appends the little-endian IEEE 754 encoding of an f64 value to `buf`.
pub fn write_f64(buf: &mut Vec<u8>, v: f64) {
    buf.write_f64::<LittleEndian>(v)
        .expect("writing to a Vec never fails");
}

// ---------------------------------------------------------------------------
// Names
// ---------------------------------------------------------------------------

/// Appends a UTF-8 name as a length-prefixed byte vector.
pub fn write_name(buf: &mut Vec<u8>, name: &str) {
    let bytes = name.as_bytes();
    write_vu32(buf, bytes.len() as u32);
    buf.extend_from_slice(bytes);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
