//! Output formats for the `wasm-builder` CLI.

use base64::{engine::general_purpose, Engine as _};
use clap::ValueEnum;
use serde_json::{json, Map, Value as Json};

use crate::parser::{self, CompileError};
use crate::runtime::Instance;

/// How `build` writes an encoded module.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Raw,
    Hex,
    Base64,
}

/// Renders module bytes in `format`. Text formats end with a newline.
pub fn encode_output(bytes: &[u8], format: OutputFormat) -> Vec<u8> {
    match format {
        OutputFormat::Raw => bytes.to_vec(),
        OutputFormat::Hex => (hex::encode(bytes) + "\n").into_bytes(),
        OutputFormat::Base64 => (general_purpose::STANDARD.encode(bytes) + "\n").into_bytes(),
    }
}

/// The exports of `instance` as a JSON object, in declaration order.
///
/// Plain mode maps each name to its host number. Typed mode maps it to
/// `{"type": .., "value": ..}` with the exact value.
pub fn exports_json(instance: &Instance, typed: bool) -> Json {
    let mut exports = Map::new();
    for name in instance.export_names() {
        let entry = if typed {
            instance
                .global(name)
                .map(|v| {
                    let (typ, value) = v.to_strings();
                    json!({ "type": typ, "value": value })
                })
                .unwrap_or(Json::Null)
        } else {
            instance.export(name).map(number_json).unwrap_or(Json::Null)
        };
        exports.insert(name.to_string(), entry);
    }
    Json::Object(exports)
}

// JSON has no NaN or infinities
fn number_json(n: f64) -> Json {
    if n.is_nan() {
        Json::from("NaN")
    } else if n.is_infinite() {
        Json::from(if n > 0.0 { "Infinity" } else { "-Infinity" })
    } else {
        Json::from(n)
    }
}

/// Compiles `bytes` and describes the module's globals and exports.
pub fn inspect_report(name: &str, bytes: &[u8]) -> Result<String, CompileError> {
    let module = parser::compile(name, bytes)?;
    Ok(format!(
        "Module {} ({} bytes)\n{}",
        module.name,
        bytes.len(),
        module.to_details_string()
    ))
}
